use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, prelude::*};

use crate::{
    EngineError, ResultEngine, User, Wishlist, WishlistCmd, WishlistPatch,
    util::{normalize_optional_text, normalize_required_name},
    users, wishlist_items, wishlists,
};

use super::{Engine, with_tx};

fn require_wishlist_owner(wishlist: &Wishlist, user_id: Uuid, action: &str) -> ResultEngine<()> {
    if wishlist.owner.id != user_id {
        return Err(EngineError::Forbidden(format!(
            "cannot {action} someone else's wishlist"
        )));
    }
    Ok(())
}

impl Engine {
    async fn require_wishlist(
        &self,
        db: &DatabaseTransaction,
        wishlist_id: Uuid,
    ) -> ResultEngine<Wishlist> {
        let (model, owner) = wishlists::Entity::find_by_id(wishlist_id.to_string())
            .find_also_related(users::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound("wishlist".to_string()))?;
        self.hydrate_wishlist(db, model, owner).await
    }

    async fn hydrate_wishlist(
        &self,
        db: &DatabaseTransaction,
        model: wishlists::Model,
        owner: Option<users::Model>,
    ) -> ResultEngine<Wishlist> {
        let owner = owner.ok_or_else(|| EngineError::NotFound("wishlist owner".to_string()))?;
        let items = self.wishlist_items(db, &model.id).await?;
        Wishlist::from_model(model, User::try_from(owner)?, items)
    }

    /// Replace the membership rows of a wishlist with `wish_ids`.
    ///
    /// Every id must resolve to an existing wish.
    async fn set_wishlist_items(
        &self,
        db: &DatabaseTransaction,
        wishlist_id: Uuid,
        wish_ids: &[Uuid],
    ) -> ResultEngine<()> {
        let items = self.require_wishes(db, wish_ids).await?;

        wishlist_items::Entity::delete_many()
            .filter(wishlist_items::Column::WishlistId.eq(wishlist_id.to_string()))
            .exec(db)
            .await?;

        for item in items {
            wishlist_items::ActiveModel {
                wishlist_id: ActiveValue::Set(wishlist_id.to_string()),
                wish_id: ActiveValue::Set(item.id.to_string()),
            }
            .insert(db)
            .await?;
        }
        Ok(())
    }

    /// Create a wishlist collecting existing wishes.
    ///
    /// Unknown wish ids fail the whole creation; nothing is stored.
    pub async fn new_wishlist(&self, cmd: WishlistCmd, owner_id: Uuid) -> ResultEngine<Wishlist> {
        let name = normalize_required_name(&cmd.name, "wishlist")?;

        with_tx!(self, |db_tx| {
            let owner = self.require_user(&db_tx, owner_id).await?;
            let wishlist = Wishlist {
                id: Uuid::new_v4(),
                owner,
                name,
                description: normalize_optional_text(cmd.description.as_deref()),
                image: normalize_optional_text(cmd.image.as_deref()),
                items: Vec::new(),
                created_at: Utc::now(),
            };
            wishlists::ActiveModel::from(&wishlist).insert(&db_tx).await?;
            self.set_wishlist_items(&db_tx, wishlist.id, &cmd.items)
                .await?;

            self.require_wishlist(&db_tx, wishlist.id).await
        })
    }

    /// Every wishlist, oldest first.
    pub async fn wishlists(&self) -> ResultEngine<Vec<Wishlist>> {
        with_tx!(self, |db_tx| {
            let rows = wishlists::Entity::find()
                .find_also_related(users::Entity)
                .order_by_asc(wishlists::Column::CreatedAt)
                .all(&db_tx)
                .await?;

            let mut result = Vec::with_capacity(rows.len());
            for (model, owner) in rows {
                result.push(self.hydrate_wishlist(&db_tx, model, owner).await?);
            }
            Ok(result)
        })
    }

    /// Return a wishlist with its owner and items.
    pub async fn wishlist(&self, wishlist_id: Uuid) -> ResultEngine<Wishlist> {
        with_tx!(self, |db_tx| self.require_wishlist(&db_tx, wishlist_id).await)
    }

    /// Edit a wishlist.
    ///
    /// Authorization: only the owner. When `items` is present the collection is
    /// replaced as a whole.
    pub async fn update_wishlist(
        &self,
        wishlist_id: Uuid,
        patch: WishlistPatch,
        user_id: Uuid,
    ) -> ResultEngine<Wishlist> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "wishlist"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let wishlist = self.require_wishlist(&db_tx, wishlist_id).await?;
            require_wishlist_owner(&wishlist, user_id, "edit")?;

            let mut active = wishlists::ActiveModel {
                id: ActiveValue::Unchanged(wishlist_id.to_string()),
                ..Default::default()
            };
            let mut changed = false;
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
                changed = true;
            }
            if let Some(description) = patch.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
                changed = true;
            }
            if let Some(image) = patch.image.as_deref() {
                active.image = ActiveValue::Set(normalize_optional_text(Some(image)));
                changed = true;
            }
            if changed {
                active.update(&db_tx).await?;
            }
            if let Some(items) = patch.items.as_deref() {
                self.set_wishlist_items(&db_tx, wishlist_id, items).await?;
            }

            self.require_wishlist(&db_tx, wishlist_id).await
        })
    }

    /// Remove a wishlist. The collected wishes are left untouched.
    ///
    /// Authorization: only the owner. Returns the removed wishlist.
    pub async fn remove_wishlist(&self, wishlist_id: Uuid, user_id: Uuid) -> ResultEngine<Wishlist> {
        with_tx!(self, |db_tx| {
            let wishlist = self.require_wishlist(&db_tx, wishlist_id).await?;
            require_wishlist_owner(&wishlist, user_id, "remove")?;

            wishlist_items::Entity::delete_many()
                .filter(wishlist_items::Column::WishlistId.eq(wishlist_id.to_string()))
                .exec(&db_tx)
                .await?;
            wishlists::Entity::delete_by_id(wishlist_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(wishlist)
        })
    }
}
