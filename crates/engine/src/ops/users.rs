use chrono::Utc;
use uuid::Uuid;

use sea_orm::{Condition, QueryFilter, prelude::*};

use crate::{
    EngineError, ResultEngine, User, UserCmd,
    util::{normalize_optional_text, normalize_required_name},
    users,
};

use super::{Engine, with_tx};

impl Engine {
    /// Register a user.
    ///
    /// Usernames and emails are unique: a clash with an existing user fails
    /// with `ExistingKey` naming the clashing value.
    pub async fn new_user(&self, cmd: UserCmd) -> ResultEngine<User> {
        let username = normalize_required_name(&cmd.username, "user")?;
        let email = cmd.email.trim().to_string();
        if email.is_empty() {
            return Err(EngineError::InvalidOperation(
                "email must not be empty".to_string(),
            ));
        }
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidOperation(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let clash = users::Entity::find()
                .filter(
                    Condition::any()
                        .add(users::Column::Username.eq(username.as_str()))
                        .add(users::Column::Email.eq(email.as_str())),
                )
                .one(&db_tx)
                .await?;
            if let Some(existing) = clash {
                let key = if existing.username == username {
                    username
                } else {
                    email
                };
                return Err(EngineError::ExistingKey(key));
            }

            let user = User {
                id: Uuid::new_v4(),
                username,
                email,
                about: normalize_optional_text(cmd.about.as_deref()),
                created_at: Utc::now(),
            };
            user.active_model(cmd.password).insert(&db_tx).await?;

            tracing::debug!(user_id = %user.id, username = %user.username, "user created");
            Ok(user)
        })
    }

    /// Return a user by id.
    pub async fn user(&self, user_id: Uuid) -> ResultEngine<User> {
        with_tx!(self, |db_tx| self.require_user(&db_tx, user_id).await)
    }

    /// Return a user by username.
    pub async fn user_by_username(&self, username: &str) -> ResultEngine<User> {
        with_tx!(self, |db_tx| {
            let model = users::Entity::find()
                .filter(users::Column::Username.eq(username))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(username.to_string()))?;
            User::try_from(model)
        })
    }
}
