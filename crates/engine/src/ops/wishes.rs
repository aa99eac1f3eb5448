use chrono::Utc;
use uuid::Uuid;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{
    EngineError, MoneyCents, ResultEngine, Wish, WishCmd, WishPatch, offers,
    util::{normalize_optional_text, normalize_required_name, validate_price},
    users, wishes, wishlist_items,
};

use super::{
    Engine,
    access::{require_wish_owner, wishes_with_owner},
    with_tx,
};

/// How many wishes the "last wishes" feed returns.
pub const LAST_WISHES_LIMIT: u64 = 40;
/// How many wishes the "top wishes" feed returns.
pub const TOP_WISHES_LIMIT: u64 = 20;

impl Engine {
    /// Publish a new wish owned by `owner_id`.
    ///
    /// The wish starts with nothing raised and never copied.
    pub async fn new_wish(&self, cmd: WishCmd, owner_id: Uuid) -> ResultEngine<Wish> {
        let name = normalize_required_name(&cmd.name, "wish")?;
        validate_price(cmd.price)?;

        with_tx!(self, |db_tx| {
            let owner = self.require_user(&db_tx, owner_id).await?;
            let now = Utc::now();
            let wish = Wish {
                id: Uuid::new_v4(),
                owner,
                name,
                link: normalize_optional_text(cmd.link.as_deref()),
                image: normalize_optional_text(cmd.image.as_deref()),
                price: cmd.price,
                raised: MoneyCents::ZERO,
                copied: 0,
                description: normalize_optional_text(cmd.description.as_deref()),
                created_at: now,
                updated_at: now,
                offers: Vec::new(),
            };
            wishes::ActiveModel::from(&wish).insert(&db_tx).await?;
            Ok(wish)
        })
    }

    /// Return a wish with its owner and its offers.
    pub async fn wish(&self, wish_id: Uuid) -> ResultEngine<Wish> {
        with_tx!(self, |db_tx| self.require_wish_with_offers(&db_tx, wish_id).await)
    }

    /// Every wish of `owner_id`, newest first.
    pub async fn wishes_by_owner(&self, owner_id: Uuid) -> ResultEngine<Vec<Wish>> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, owner_id).await?;
            let rows = wishes::Entity::find()
                .filter(wishes::Column::OwnerId.eq(owner_id.to_string()))
                .find_also_related(users::Entity)
                .order_by_desc(wishes::Column::CreatedAt)
                .all(&db_tx)
                .await?;
            wishes_with_owner(rows)
        })
    }

    /// The most recently published wishes.
    pub async fn last_wishes(&self) -> ResultEngine<Vec<Wish>> {
        with_tx!(self, |db_tx| {
            let rows = wishes::Entity::find()
                .find_also_related(users::Entity)
                .order_by_desc(wishes::Column::CreatedAt)
                .limit(LAST_WISHES_LIMIT)
                .all(&db_tx)
                .await?;
            wishes_with_owner(rows)
        })
    }

    /// The most copied wishes. Ties keep the oldest wish first.
    pub async fn top_wishes(&self) -> ResultEngine<Vec<Wish>> {
        with_tx!(self, |db_tx| {
            let rows = wishes::Entity::find()
                .find_also_related(users::Entity)
                .order_by_desc(wishes::Column::Copied)
                .order_by_asc(wishes::Column::CreatedAt)
                .limit(TOP_WISHES_LIMIT)
                .all(&db_tx)
                .await?;
            wishes_with_owner(rows)
        })
    }

    /// Edit a wish.
    ///
    /// Authorization: only the owner. The price is locked as soon as the wish
    /// has at least one offer, otherwise `raised <= price` could be broken.
    pub async fn update_wish(
        &self,
        wish_id: Uuid,
        patch: WishPatch,
        user_id: Uuid,
    ) -> ResultEngine<Wish> {
        let name = patch
            .name
            .as_deref()
            .map(|name| normalize_required_name(name, "wish"))
            .transpose()?;
        if let Some(price) = patch.price {
            validate_price(price)?;
        }

        with_tx!(self, |db_tx| {
            let wish = self.require_wish_for_update(&db_tx, wish_id).await?;
            require_wish_owner(&wish, user_id, "edit")?;

            if let Some(price) = patch.price {
                let has_offers = offers::Entity::find()
                    .filter(offers::Column::ItemId.eq(wish_id.to_string()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if has_offers || price < wish.raised {
                    return Err(EngineError::InvalidOperation(
                        "cannot change price once offers exist".to_string(),
                    ));
                }
            }

            if !patch.is_empty() {
                let mut active = wishes::ActiveModel {
                    id: ActiveValue::Unchanged(wish_id.to_string()),
                    updated_at: ActiveValue::Set(Utc::now()),
                    ..Default::default()
                };
                if let Some(name) = name {
                    active.name = ActiveValue::Set(name);
                }
                if let Some(price) = patch.price {
                    active.price = ActiveValue::Set(price.cents());
                }
                if let Some(link) = patch.link.as_deref() {
                    active.link = ActiveValue::Set(normalize_optional_text(Some(link)));
                }
                if let Some(image) = patch.image.as_deref() {
                    active.image = ActiveValue::Set(normalize_optional_text(Some(image)));
                }
                if let Some(description) = patch.description.as_deref() {
                    active.description =
                        ActiveValue::Set(normalize_optional_text(Some(description)));
                }
                active.update(&db_tx).await?;
            }

            self.require_wish_with_offers(&db_tx, wish_id).await
        })
    }

    /// Remove a wish together with its offers and wishlist memberships.
    ///
    /// Authorization: only the owner. Returns the removed wish.
    pub async fn remove_wish(&self, wish_id: Uuid, user_id: Uuid) -> ResultEngine<Wish> {
        with_tx!(self, |db_tx| {
            let wish = self.require_wish_with_offers(&db_tx, wish_id).await?;
            require_wish_owner(&wish, user_id, "remove")?;

            // Foreign key enforcement may be off on the connection.
            offers::Entity::delete_many()
                .filter(offers::Column::ItemId.eq(wish_id.to_string()))
                .exec(&db_tx)
                .await?;
            wishlist_items::Entity::delete_many()
                .filter(wishlist_items::Column::WishId.eq(wish_id.to_string()))
                .exec(&db_tx)
                .await?;
            wishes::Entity::delete_by_id(wish_id.to_string())
                .exec(&db_tx)
                .await?;

            Ok(wish)
        })
    }

    /// Copy somebody's wish into the caller's own wishes.
    ///
    /// The copy starts from zero (`raised` and `copied`), and the source wish's
    /// `copied` counter goes up by one, both in the same DB transaction.
    pub async fn copy_wish(&self, wish_id: Uuid, user_id: Uuid) -> ResultEngine<Wish> {
        with_tx!(self, |db_tx| {
            let owner = self.require_user(&db_tx, user_id).await?;
            let source = self.require_wish(&db_tx, wish_id).await?;

            wishes::Entity::update_many()
                .col_expr(
                    wishes::Column::Copied,
                    Expr::col(wishes::Column::Copied).add(1),
                )
                .filter(wishes::Column::Id.eq(wish_id.to_string()))
                .exec(&db_tx)
                .await?;

            let now = Utc::now();
            let copy = Wish {
                id: Uuid::new_v4(),
                owner,
                name: source.name,
                link: source.link,
                image: source.image,
                price: source.price,
                raised: MoneyCents::ZERO,
                copied: 0,
                description: source.description,
                created_at: now,
                updated_at: now,
                offers: Vec::new(),
            };
            wishes::ActiveModel::from(&copy).insert(&db_tx).await?;

            tracing::debug!(source = %wish_id, copy = %copy.id, "wish copied");
            Ok(copy)
        })
    }
}
