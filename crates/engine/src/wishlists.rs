//! The `Wishlist` is a named collection of wishes curated by its owner. A
//! wishlist may collect wishes of any user, and removing it never removes the
//! wishes themselves.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{ResultEngine, users::User, util::parse_uuid, wishes::Wish};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wishlist {
    pub id: Uuid,
    pub owner: User,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub items: Vec<Wish>,
    pub created_at: DateTime<Utc>,
}

impl Wishlist {
    pub(crate) fn from_model(model: Model, owner: User, items: Vec<Wish>) -> ResultEngine<Self> {
        Ok(Self {
            id: parse_uuid(&model.id, "wishlist")?,
            owner,
            name: model.name,
            description: model.description,
            image: model.image,
            items,
            created_at: model.created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "wishlists")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTimeUtc,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::wishes::Entity> for Entity {
    fn to() -> RelationDef {
        super::wishlist_items::Relation::Wish.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::wishlist_items::Relation::Wishlist.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Wishlist> for ActiveModel {
    fn from(value: &Wishlist) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner.id.to_string()),
            name: ActiveValue::Set(value.name.clone()),
            description: ActiveValue::Set(value.description.clone()),
            image: ActiveValue::Set(value.image.clone()),
            created_at: ActiveValue::Set(value.created_at),
        }
    }
}
