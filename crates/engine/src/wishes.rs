//! The module contains `Wish` struct and the `wishes` table.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, offers::Offer, users::User, util::parse_uuid};

/// A gift somebody wants.
///
/// `raised` is the sum of every committed offer and never exceeds `price`.
/// The engine is the only writer of `raised`: it changes as a side effect of
/// [`Engine::create_offer`](crate::Engine::create_offer) and nothing else.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wish {
    pub id: Uuid,
    pub owner: User,
    pub name: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub price: MoneyCents,
    pub raised: MoneyCents,
    /// How many times the wish was copied by other users.
    pub copied: i32,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Offers made toward the wish. Only populated by single-wish lookups.
    pub offers: Vec<Offer>,
}

impl Wish {
    pub fn is_fully_funded(&self) -> bool {
        self.raised == self.price
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wishes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub link: Option<String>,
    pub image: Option<String>,
    pub price: i64,
    pub raised: i64,
    pub copied: i32,
    pub description: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::OwnerId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::offers::Entity")]
    Offers,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl Related<super::wishlist_items::Entity> for Entity {
    fn to() -> RelationDef {
        super::wishlist_items::Relation::Wish.def().rev()
    }
}

impl Related<super::wishlists::Entity> for Entity {
    fn to() -> RelationDef {
        super::wishlist_items::Relation::Wishlist.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::wishlist_items::Relation::Wish.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wish> for ActiveModel {
    fn from(value: &Wish) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            link: ActiveValue::Set(value.link.clone()),
            image: ActiveValue::Set(value.image.clone()),
            price: ActiveValue::Set(value.price.cents()),
            raised: ActiveValue::Set(value.raised.cents()),
            copied: ActiveValue::Set(value.copied),
            description: ActiveValue::Set(value.description.clone()),
            created_at: ActiveValue::Set(value.created_at),
            updated_at: ActiveValue::Set(value.updated_at),
        }
    }
}

impl Wish {
    /// Rebuild a wish from its row and its already loaded owner.
    pub(crate) fn from_model(model: Model, owner: User) -> ResultEngine<Self> {
        let id = parse_uuid(&model.id, "wish")?;
        if model.owner_id != owner.id.to_string() {
            return Err(EngineError::InvalidId(format!(
                "wish {id} is not owned by user {}",
                owner.id
            )));
        }
        Ok(Self {
            id,
            owner,
            name: model.name,
            link: model.link,
            image: model.image,
            price: MoneyCents::new(model.price),
            raised: MoneyCents::new(model.raised),
            copied: model.copied,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
            offers: Vec::new(),
        })
    }
}
