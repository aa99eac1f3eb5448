//! Command structs for engine operations.
//!
//! These types group parameters for write operations (offers, wishes,
//! wishlists, users), keeping call sites readable and avoiding long argument
//! lists.

use uuid::Uuid;

use crate::MoneyCents;

/// Pledge `amount` toward the wish `item_id` on behalf of `user_id`.
#[derive(Clone, Debug)]
pub struct OfferCmd {
    pub item_id: Uuid,
    pub amount: MoneyCents,
    pub hidden: bool,
    pub user_id: Uuid,
}

impl OfferCmd {
    #[must_use]
    pub fn new(item_id: Uuid, user_id: Uuid, amount: MoneyCents) -> Self {
        Self {
            item_id,
            amount,
            hidden: false,
            user_id,
        }
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }
}

/// Create a wish.
#[derive(Clone, Debug)]
pub struct WishCmd {
    pub name: String,
    pub price: MoneyCents,
    pub link: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl WishCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, price: MoneyCents) -> Self {
        Self {
            name: name.into(),
            price,
            link: None,
            image: None,
            description: None,
        }
    }

    #[must_use]
    pub fn link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Partial update of a wish. `None` leaves the field untouched.
///
/// There is no `raised`: it only moves through offers.
#[derive(Clone, Debug, Default)]
pub struct WishPatch {
    pub name: Option<String>,
    pub price: Option<MoneyCents>,
    pub link: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl WishPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.link.is_none()
            && self.image.is_none()
            && self.description.is_none()
    }
}

/// Create a wishlist collecting `items`.
#[derive(Clone, Debug)]
pub struct WishlistCmd {
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub items: Vec<Uuid>,
}

impl WishlistCmd {
    #[must_use]
    pub fn new(name: impl Into<String>, items: Vec<Uuid>) -> Self {
        Self {
            name: name.into(),
            description: None,
            image: None,
            items,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Partial update of a wishlist. `items`, when present, replaces the whole
/// collection.
#[derive(Clone, Debug, Default)]
pub struct WishlistPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub items: Option<Vec<Uuid>>,
}

/// Register a user.
#[derive(Clone, Debug)]
pub struct UserCmd {
    pub username: String,
    pub email: String,
    pub password: String,
    pub about: Option<String>,
}

impl UserCmd {
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            about: None,
        }
    }

    #[must_use]
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }
}
