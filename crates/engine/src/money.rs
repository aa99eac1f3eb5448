use std::{fmt, str::FromStr};

use crate::EngineError;

/// An amount of money in minor units (cents, kopecks).
///
/// Prices, raised totals and pledges are all `MoneyCents`, so summing many
/// small offers into `raised` stays exact.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let price: MoneyCents = "120,5".parse().unwrap();
/// assert_eq!(price.cents(), 12_050);
/// assert_eq!(price.to_string(), "120.50");
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` when the sum does not fit in an `i64`.
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(Self)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            f.write_str("-")?;
        }
        let abs = self.0.unsigned_abs();
        write!(f, "{}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses user input such as `120`, `120.5` or `120,50`.
///
/// Signs are rejected: a price or a pledge typed by hand is never negative.
impl FromStr for MoneyCents {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EngineError::InvalidAmount(format!("{reason}: {s:?}"));

        let normalized = s.trim().replace(',', ".");
        let (whole, fraction) = normalized
            .split_once('.')
            .unwrap_or((normalized.as_str(), ""));

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) {
            return Err(invalid("not a decimal amount"));
        }
        if fraction.len() > 2 {
            return Err(invalid("at most two decimals"));
        }

        let whole: i64 = whole.parse().map_err(|_| invalid("amount too large"))?;
        // "5" after the separator means 50 cents.
        let fraction: i64 = format!("{fraction:0<2}")
            .parse()
            .map_err(|_| invalid("not a decimal amount"))?;

        whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .map(Self)
            .ok_or_else(|| invalid("amount too large"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<i64, EngineError> {
        input.parse::<MoneyCents>().map(MoneyCents::cents)
    }

    #[test]
    fn display_pads_cents() {
        assert_eq!(MoneyCents::ZERO.to_string(), "0.00");
        assert_eq!(MoneyCents::new(7).to_string(), "0.07");
        assert_eq!(MoneyCents::new(12_050).to_string(), "120.50");
        assert_eq!(MoneyCents::new(-250).to_string(), "-2.50");
    }

    #[test]
    fn parses_either_separator() {
        assert_eq!(parse("120"), Ok(12_000));
        assert_eq!(parse(" 120.5 "), Ok(12_050));
        assert_eq!(parse("120,05"), Ok(12_005));
        assert_eq!(parse("0.01"), Ok(1));
        assert_eq!(parse("3."), Ok(300));
    }

    #[test]
    fn rejects_signs_and_garbage() {
        for input in ["", "-1", "+1", "1.2.3", ".50", "abc", "1.234", "1e3"] {
            assert!(
                matches!(parse(input), Err(EngineError::InvalidAmount(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_overflow() {
        assert!(parse("92233720368547758.08").is_err());
        assert_eq!(
            MoneyCents::new(i64::MAX).checked_add(MoneyCents::new(1)),
            None
        );
    }

    #[test]
    fn many_small_pledges_add_up_exactly() {
        let total = (0..1_000).try_fold(MoneyCents::ZERO, |acc, _| {
            acc.checked_add(MoneyCents::new(10))
        });
        assert_eq!(total, Some(MoneyCents::new(10_000)));
    }
}
