use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, Offer, ResultEngine, User, Wish, offers, users, wishes, wishlist_items,
};

use super::Engine;

/// Rebuild a wish from a `find_also_related(users::Entity)` row.
pub(super) fn wish_with_owner(
    model: wishes::Model,
    owner: Option<users::Model>,
) -> ResultEngine<Wish> {
    let owner = owner.ok_or_else(|| EngineError::NotFound("wish owner".to_string()))?;
    Wish::from_model(model, User::try_from(owner)?)
}

pub(super) fn wishes_with_owner(
    rows: Vec<(wishes::Model, Option<users::Model>)>,
) -> ResultEngine<Vec<Wish>> {
    rows.into_iter()
        .map(|(model, owner)| wish_with_owner(model, owner))
        .collect()
}

/// Fail with `Forbidden` unless `user_id` owns the wish.
pub(super) fn require_wish_owner(wish: &Wish, user_id: Uuid, action: &str) -> ResultEngine<()> {
    if wish.owner.id != user_id {
        return Err(EngineError::Forbidden(format!(
            "cannot {action} someone else's wish"
        )));
    }
    Ok(())
}

impl Engine {
    pub(super) async fn require_user(
        &self,
        db: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<User> {
        let model = users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("user".to_string()))?;
        User::try_from(model)
    }

    /// Load a wish and its owner.
    pub(super) async fn require_wish(
        &self,
        db: &DatabaseTransaction,
        wish_id: Uuid,
    ) -> ResultEngine<Wish> {
        let (model, owner) = wishes::Entity::find_by_id(wish_id.to_string())
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("wish".to_string()))?;
        wish_with_owner(model, owner)
    }

    /// Load a wish for update.
    ///
    /// The wish row is read with `FOR UPDATE` so concurrent writers of the same
    /// wish queue behind this transaction on backends with row locks. The owner
    /// is read separately because row locks cannot cover the nullable side of an
    /// outer join.
    pub(super) async fn require_wish_for_update(
        &self,
        db: &DatabaseTransaction,
        wish_id: Uuid,
    ) -> ResultEngine<Wish> {
        let model = wishes::Entity::find_by_id(wish_id.to_string())
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("wish".to_string()))?;
        let owner = users::Entity::find_by_id(model.owner_id.clone())
            .one(db)
            .await?;
        wish_with_owner(model, owner)
    }

    /// Load a wish with its owner and its offers.
    pub(super) async fn require_wish_with_offers(
        &self,
        db: &DatabaseTransaction,
        wish_id: Uuid,
    ) -> ResultEngine<Wish> {
        let mut wish = self.require_wish(db, wish_id).await?;
        wish.offers = self.wish_offers(db, wish_id).await?;
        Ok(wish)
    }

    pub(super) async fn wish_offers(
        &self,
        db: &DatabaseTransaction,
        wish_id: Uuid,
    ) -> ResultEngine<Vec<Offer>> {
        offers::Entity::find()
            .filter(offers::Column::ItemId.eq(wish_id.to_string()))
            .order_by_asc(offers::Column::CreatedAt)
            .all(db)
            .await?
            .into_iter()
            .map(Offer::try_from)
            .collect()
    }

    /// Resolve every id to a wish, failing on the first unknown one.
    ///
    /// The result keeps the order of `wish_ids`; duplicates are collapsed.
    pub(super) async fn require_wishes(
        &self,
        db: &DatabaseTransaction,
        wish_ids: &[Uuid],
    ) -> ResultEngine<Vec<Wish>> {
        let mut unique: Vec<Uuid> = Vec::with_capacity(wish_ids.len());
        for id in wish_ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }

        let rows = wishes::Entity::find()
            .filter(wishes::Column::Id.is_in(unique.iter().map(ToString::to_string)))
            .find_also_related(users::Entity)
            .all(db)
            .await?;
        let mut found = wishes_with_owner(rows)?;

        let mut ordered = Vec::with_capacity(unique.len());
        for id in unique {
            let position = found
                .iter()
                .position(|wish| wish.id == id)
                .ok_or_else(|| EngineError::NotFound(format!("wish {id}")))?;
            ordered.push(found.swap_remove(position));
        }
        Ok(ordered)
    }

    /// Wishes collected by a wishlist, oldest wish first.
    pub(super) async fn wishlist_items(
        &self,
        db: &DatabaseTransaction,
        wishlist_id: &str,
    ) -> ResultEngine<Vec<Wish>> {
        let rows = wishes::Entity::find()
            .inner_join(wishlist_items::Entity)
            .filter(wishlist_items::Column::WishlistId.eq(wishlist_id.to_string()))
            .find_also_related(users::Entity)
            .order_by_asc(wishes::Column::CreatedAt)
            .all(db)
            .await?;
        wishes_with_owner(rows)
    }
}
