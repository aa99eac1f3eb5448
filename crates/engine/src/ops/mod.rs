use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod offers;
mod users;
mod wishes;
mod wishlists;

pub use wishes::{LAST_WISHES_LIMIT, TOP_WISHES_LIMIT};

/// Run a block inside a DB transaction, committing on success and rolling back
/// on error.
///
/// The body runs in its own async block, so `?` and `return` inside it land in
/// the rollback arm instead of leaving the caller. The rollback result is
/// logged and never replaces the error of the body. If the surrounding future
/// is dropped halfway, `DatabaseTransaction` rolls back on drop.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result: $crate::ResultEngine<_> = async { $body }.await;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = $tx.rollback().await {
                    tracing::warn!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
