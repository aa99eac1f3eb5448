use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use sea_orm::{QueryFilter, QueryOrder, prelude::*, sea_query::Expr};

use crate::{
    EngineError, MoneyCents, Offer, OfferCmd, OfferDetail, ResultEngine, offers,
    util::validate_pledge, wishes,
};

use super::{Engine, with_tx};

const PLEDGE_ATTEMPTS: u32 = 8;
const PLEDGE_RETRY_DELAY: Duration = Duration::from_millis(5);

/// `UPDATE wishes SET raised = raised + amount WHERE id = ? AND raised <= price - amount`.
///
/// The predicate is evaluated against the row as it is at write time, so a
/// pledge committed after our read makes the update touch no row.
async fn add_to_raised<C>(db: &C, wish_id: Uuid, amount: MoneyCents) -> ResultEngine<()>
where
    C: ConnectionTrait,
{
    let amount = amount.cents();
    let updated = wishes::Entity::update_many()
        .col_expr(
            wishes::Column::Raised,
            Expr::col(wishes::Column::Raised).add(amount),
        )
        .col_expr(wishes::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(wishes::Column::Id.eq(wish_id.to_string()))
        .filter(
            Expr::col(wishes::Column::Raised).lte(Expr::col(wishes::Column::Price).sub(amount)),
        )
        .exec(db)
        .await?;
    if updated.rows_affected != 1 {
        return Err(EngineError::InvalidOperation(
            "pledge exceeds remaining price".to_string(),
        ));
    }
    Ok(())
}

impl Engine {
    /// Pledge money toward a wish.
    ///
    /// Inside one DB transaction: load the payer and the wish (row locked),
    /// check the funding rules, add `amount` to the wish's `raised` total and
    /// insert the offer. The rules, in order:
    ///
    /// 1. the payer must not own the wish;
    /// 2. the wish must not be fully funded already;
    /// 3. `raised + amount` must not exceed `price`.
    ///
    /// Any failure rolls back both the `raised` update and the offer. A
    /// transaction that loses a write race on SQLite is run again from the
    /// start, up to `PLEDGE_ATTEMPTS` times.
    pub async fn create_offer(&self, cmd: OfferCmd) -> ResultEngine<Offer> {
        validate_pledge(cmd.amount)?;

        let mut attempt = 1;
        let offer = loop {
            match self.try_create_offer(&cmd).await {
                // The losing side of a write race is retried from the read, so
                // it sees the winner's `raised` and fails the funding rules.
                Err(err) if err.is_write_conflict() && attempt < PLEDGE_ATTEMPTS => {
                    tracing::debug!(
                        attempt,
                        wish_id = %cmd.item_id,
                        "pledge hit a write conflict, retrying"
                    );
                    tokio::time::sleep(PLEDGE_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                result => break result?,
            }
        };

        tracing::debug!(
            offer_id = %offer.id,
            wish_id = %offer.item_id,
            amount = %offer.amount,
            "offer created"
        );
        Ok(offer)
    }

    async fn try_create_offer(&self, cmd: &OfferCmd) -> ResultEngine<Offer> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, cmd.user_id).await?;
            let wish = self.require_wish_for_update(&db_tx, cmd.item_id).await?;

            let projected_raised = wish
                .raised
                .checked_add(cmd.amount)
                .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;

            if user.id == wish.owner.id {
                return Err(EngineError::InvalidOperation(
                    "cannot fund own wish".to_string(),
                ));
            }
            if wish.is_fully_funded() {
                return Err(EngineError::InvalidOperation(
                    "wish already fully funded".to_string(),
                ));
            }
            if projected_raised > wish.price {
                return Err(EngineError::InvalidOperation(
                    "pledge exceeds remaining price".to_string(),
                ));
            }

            add_to_raised(&db_tx, wish.id, cmd.amount).await?;

            let offer = Offer::new(user.id, wish.id, cmd.amount, cmd.hidden);
            offers::ActiveModel::from(&offer).insert(&db_tx).await?;

            Ok(offer)
        })
    }

    /// Every offer made by `user_id`, oldest first, with the funded wishes.
    pub async fn offers(&self, user_id: Uuid) -> ResultEngine<Vec<OfferDetail>> {
        with_tx!(self, |db_tx| {
            let user = self.require_user(&db_tx, user_id).await?;
            let offers = offers::Entity::find()
                .filter(offers::Column::UserId.eq(user_id.to_string()))
                .order_by_asc(offers::Column::CreatedAt)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(Offer::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;

            let item_ids: Vec<Uuid> = offers.iter().map(|offer| offer.item_id).collect();
            let items = self.require_wishes(&db_tx, &item_ids).await?;

            let mut details = Vec::with_capacity(offers.len());
            for offer in offers {
                let item = items
                    .iter()
                    .find(|wish| wish.id == offer.item_id)
                    .cloned()
                    .ok_or_else(|| EngineError::NotFound("wish".to_string()))?;
                details.push(OfferDetail {
                    offer,
                    user: user.clone(),
                    item,
                });
            }
            Ok(details)
        })
    }

    /// One offer with its payer and the wish it funds.
    pub async fn offer(&self, offer_id: Uuid) -> ResultEngine<OfferDetail> {
        with_tx!(self, |db_tx| {
            let model = offers::Entity::find_by_id(offer_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("offer".to_string()))?;
            let offer = Offer::try_from(model)?;
            let user = self.require_user(&db_tx, offer.user_id).await?;
            let item = self.require_wish(&db_tx, offer.item_id).await?;
            Ok(OfferDetail { offer, user, item })
        })
    }
}

#[cfg(test)]
mod tests {
    use migration::MigratorTrait;
    use sea_orm::{Database, DatabaseConnection, Statement, TransactionTrait, Value};

    use super::*;
    use crate::{UserCmd, WishCmd};

    async fn engine_with_db() -> (Engine, DatabaseConnection) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let engine = Engine::builder()
            .database(db.clone())
            .build()
            .await
            .unwrap();
        (engine, db)
    }

    async fn set_raised(db: &impl ConnectionTrait, wish_id: Uuid, raised: i64) {
        db.execute(Statement::from_sql_and_values(
            db.get_database_backend(),
            "UPDATE wishes SET raised = ? WHERE id = ?",
            [Value::from(raised), Value::from(wish_id.to_string())],
        ))
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn raised_changed_after_read_blocks_the_increment() {
        let (engine, db) = engine_with_db().await;
        let alice = engine
            .new_user(UserCmd::new("alice", "alice@example.com", "pw"))
            .await
            .unwrap();
        let bike = engine
            .new_wish(WishCmd::new("Bike", MoneyCents::new(100)), alice.id)
            .await
            .unwrap();

        // The rules passed against this read: 0 + 10 <= 100.
        let stale = engine.wish(bike.id).await.unwrap();
        assert_eq!(stale.raised, MoneyCents::ZERO);

        let db_tx = db.begin().await.unwrap();
        set_raised(&db_tx, bike.id, 95).await;
        assert_eq!(
            add_to_raised(&db_tx, bike.id, MoneyCents::new(10)).await,
            Err(EngineError::InvalidOperation(
                "pledge exceeds remaining price".to_string()
            ))
        );
        add_to_raised(&db_tx, bike.id, MoneyCents::new(5))
            .await
            .unwrap();
        db_tx.commit().await.unwrap();

        assert_eq!(
            engine.wish(bike.id).await.unwrap().raised,
            MoneyCents::new(100)
        );
    }

    #[tokio::test]
    async fn increment_of_unknown_wish_touches_nothing() {
        let (_engine, db) = engine_with_db().await;
        assert!(matches!(
            add_to_raised(&db, Uuid::new_v4(), MoneyCents::new(1)).await,
            Err(EngineError::InvalidOperation(_))
        ));
    }
}
