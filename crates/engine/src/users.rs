//! The module contains `User` struct and the `users` table.
//!
//! Users are referenced by wishes (owner), offers (payer) and wishlists
//! (owner). Identity is the stable UUID, never the username.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use uuid::Uuid;

use crate::{EngineError, util::parse_uuid};

/// A registered user.
///
/// The password is not part of the domain struct: it only lives
/// in the `users` table and is read by the authentication layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub about: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub about: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::wishes::Entity")]
    Wishes,
    #[sea_orm(has_many = "super::offers::Entity")]
    Offers,
    #[sea_orm(has_many = "super::wishlists::Entity")]
    Wishlists,
}

impl Related<super::wishes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishes.def()
    }
}

impl Related<super::offers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Offers.def()
    }
}

impl Related<super::wishlists::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wishlists.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for User {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "user")?,
            username: model.username,
            email: model.email,
            about: model.about,
            created_at: model.created_at,
        })
    }
}

impl User {
    /// Build the row for a brand new user.
    pub(crate) fn active_model(&self, password: String) -> ActiveModel {
        ActiveModel {
            id: ActiveValue::Set(self.id.to_string()),
            username: ActiveValue::Set(self.username.clone()),
            email: ActiveValue::Set(self.email.clone()),
            password: ActiveValue::Set(password),
            about: ActiveValue::Set(self.about.clone()),
            created_at: ActiveValue::Set(self.created_at),
        }
    }
}
