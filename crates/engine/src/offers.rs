//! Offers: a single pledge of money by one user toward another user's wish.
//!
//! An offer is immutable once created. There is no update or delete path; the
//! row only disappears when its wish is removed (FK cascade).

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, users::User, util::parse_uuid, wishes::Wish};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offer {
    pub id: Uuid,
    /// The payer.
    pub user_id: Uuid,
    /// The funded wish.
    pub item_id: Uuid,
    pub amount: MoneyCents,
    /// Hide the payer's name from other people looking at the wish.
    pub hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl Offer {
    pub(crate) fn new(user_id: Uuid, item_id: Uuid, amount: MoneyCents, hidden: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            item_id,
            amount,
            hidden,
            created_at: Utc::now(),
        }
    }
}

/// An offer together with its payer and the wish it funds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OfferDetail {
    pub offer: Offer,
    pub user: User,
    pub item: Wish,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "offers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub item_id: String,
    pub amount: i64,
    pub hidden: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::wishes::Entity",
        from = "Column::ItemId",
        to = "super::wishes::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Item,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::wishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Item.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Offer> for ActiveModel {
    fn from(offer: &Offer) -> Self {
        Self {
            id: ActiveValue::Set(offer.id.to_string()),
            user_id: ActiveValue::Set(offer.user_id.to_string()),
            item_id: ActiveValue::Set(offer.item_id.to_string()),
            amount: ActiveValue::Set(offer.amount.cents()),
            hidden: ActiveValue::Set(offer.hidden),
            created_at: ActiveValue::Set(offer.created_at),
        }
    }
}

impl TryFrom<Model> for Offer {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "offer")?,
            user_id: parse_uuid(&model.user_id, "user")?,
            item_id: parse_uuid(&model.item_id, "wish")?,
            amount: MoneyCents::new(model.amount),
            hidden: model.hidden,
            created_at: model.created_at,
        })
    }
}
