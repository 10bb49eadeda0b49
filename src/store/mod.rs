// Persistence gateway - the capability interface the lifecycle services run against
//
// Every service operation opens one transaction, runs its existence/status
// checks and its mutation through it, then commits. Dropping a transaction
// without committing discards everything it did.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Cat, Mission, NewCat, Status, Target, TargetDraft, TargetUpdate};

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Errors raised by the persistence gateway
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("unique constraint violation: {0}")]
    UniqueViolation(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("corrupt row in {table}: {reason}")]
    Corrupt { table: &'static str, reason: String },

    #[error("transaction already committed")]
    TransactionClosed,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::ForeignKeyViolation => {
                    return StoreError::ForeignKeyViolation(db_err.message().to_string());
                }
                sqlx::error::ErrorKind::UniqueViolation => {
                    return StoreError::UniqueViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

/// Entry point of the gateway: hands out transactions
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StoreTx>, StoreError>;
}

/// One unit of work against the relational store.
///
/// Mutations that address a row by id return `false` when no row matched.
#[cfg_attr(any(test, feature = "testing"), automock)]
#[async_trait]
pub trait StoreTx: Send {
    // Cats
    async fn list_cats(&mut self) -> Result<Vec<Cat>, StoreError>;
    async fn get_cat(&mut self, id: i64) -> Result<Option<Cat>, StoreError>;
    async fn insert_cat(&mut self, cat: &NewCat) -> Result<Cat, StoreError>;
    async fn update_cat_salary(&mut self, id: i64, salary: f64) -> Result<bool, StoreError>;
    async fn delete_cat(&mut self, id: i64) -> Result<bool, StoreError>;
    async fn cat_exists(&mut self, id: i64) -> Result<bool, StoreError>;
    /// True when the cat has no `in_progress` mission
    async fn cat_available(&mut self, id: i64) -> Result<bool, StoreError>;

    // Missions
    /// Insert the mission row only; targets are inserted separately
    async fn insert_mission(
        &mut self,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<Mission, StoreError>;
    /// Most recently created first, targets hydrated
    async fn list_missions(&mut self) -> Result<Vec<Mission>, StoreError>;
    async fn get_mission(&mut self, id: i64) -> Result<Option<Mission>, StoreError>;
    async fn update_mission(
        &mut self,
        id: i64,
        cat_id: Option<i64>,
        status: Status,
    ) -> Result<bool, StoreError>;
    async fn complete_mission(&mut self, id: i64) -> Result<bool, StoreError>;
    async fn assign_cat(&mut self, mission_id: i64, cat_id: i64) -> Result<bool, StoreError>;
    /// Removes the mission and, by cascade, its targets
    async fn delete_mission(&mut self, id: i64) -> Result<bool, StoreError>;
    /// False for unknown missions
    async fn mission_assigned(&mut self, id: i64) -> Result<bool, StoreError>;
    /// False for unknown missions
    async fn mission_completed(&mut self, id: i64) -> Result<bool, StoreError>;

    // Targets
    async fn insert_target(
        &mut self,
        mission_id: i64,
        draft: &TargetDraft,
        status: Status,
    ) -> Result<Target, StoreError>;
    async fn get_target(&mut self, id: i64) -> Result<Option<Target>, StoreError>;
    async fn count_targets(&mut self, mission_id: i64) -> Result<usize, StoreError>;
    /// Overwrites name, country, notes and status of the target scoped to its mission
    async fn update_target(&mut self, target: &TargetUpdate) -> Result<bool, StoreError>;
    async fn update_target_notes(&mut self, id: i64, notes: &str) -> Result<bool, StoreError>;
    async fn complete_target(&mut self, mission_id: i64, target_id: i64)
        -> Result<bool, StoreError>;
    async fn delete_target(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError>;
    async fn target_linked(&mut self, mission_id: i64, target_id: i64) -> Result<bool, StoreError>;
    /// False for unknown targets
    async fn target_completed(&mut self, id: i64) -> Result<bool, StoreError>;

    async fn commit(&mut self) -> Result<(), StoreError>;
}
