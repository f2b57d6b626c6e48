//! Persistence gateway
//!
//! The gateway abstracts the relational store as a unit of work: `begin`
//! yields a [`StorageUnit`] whose staged reads and writes become visible
//! atomically at `commit`, or not at all. Repositories and the transfer
//! service operate on a unit owned by the caller; nothing below the service
//! ever begins or commits on its own.
//!
//! `commit` and `rollback` consume the unit, so a unit cannot be used after
//! its transaction ended and double rollback is unrepresentable. Dropping an
//! open unit rolls it back, which covers panics and cancelled futures.

pub mod memory;
pub mod pg;

pub use memory::{FaultPlan, MemoryGateway};
pub use pg::{PgGateway, ensure_schema};

use async_trait::async_trait;
use thiserror::Error;

use crate::account::{Account, AccountId};
use crate::ledger::{NewTransfer, TransferRecord};

/// Storage-level failures, split by retriability.
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    /// Serialization or lock conflict. Retriable.
    #[error("storage conflict: {0}")]
    Conflict(String),

    /// Connectivity or infrastructure fault. Retriable with backoff.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Anything the store reports that is not transient.
    #[error("storage internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn is_retriable(&self) -> bool {
        matches!(self, StorageError::Conflict(_) | StorageError::Unavailable(_))
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            // 40001 serialization_failure, 40P01 deadlock_detected
            sqlx::Error::Database(db) => match db.code().as_deref() {
                Some("40001") | Some("40P01") => StorageError::Conflict(db.to_string()),
                _ => StorageError::Internal(db.to_string()),
            },
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => StorageError::Unavailable(e.to_string()),
            _ => StorageError::Internal(e.to_string()),
        }
    }
}

/// How an account row is read inside a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Plain read at the unit's isolation level.
    Plain,
    /// Row-level write lock held until commit/rollback (`FOR UPDATE`).
    ForUpdate,
}

/// One open unit of work against the store.
///
/// All operations observe a consistent snapshot at least at read-committed
/// isolation; staged writes are invisible to concurrent units until commit.
#[async_trait]
pub trait StorageUnit: Send {
    /// Fetch an account by primary key. `None` if no row matches.
    async fn load_account(
        &mut self,
        id: AccountId,
        lock: LockMode,
    ) -> Result<Option<Account>, StorageError>;

    /// Stage an update of an already-loaded account.
    async fn update_account(&mut self, account: &Account) -> Result<(), StorageError>;

    /// Stage insertion of a ledger entry; the store assigns id and timestamp.
    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, StorageError>;

    /// Atomically publish all staged mutations.
    async fn commit(self: Box<Self>) -> Result<(), StorageError>;

    /// Discard all staged mutations.
    async fn rollback(self: Box<Self>) -> Result<(), StorageError>;
}

/// Factory for units of work. Safe for concurrent use; each unit belongs to
/// a single flow of control.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn StorageUnit>, StorageError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriability_split() {
        assert!(StorageError::Conflict("serialization".into()).is_retriable());
        assert!(StorageError::Unavailable("connection reset".into()).is_retriable());
        assert!(!StorageError::Internal("corrupt row".into()).is_retriable());
    }

    #[test]
    fn test_sqlx_io_maps_to_unavailable() {
        let e = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(matches!(StorageError::from(e), StorageError::Unavailable(_)));
    }

    #[test]
    fn test_sqlx_pool_timeout_maps_to_unavailable() {
        assert!(matches!(
            StorageError::from(sqlx::Error::PoolTimedOut),
            StorageError::Unavailable(_)
        ));
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_internal() {
        assert!(matches!(
            StorageError::from(sqlx::Error::RowNotFound),
            StorageError::Internal(_)
        ));
    }
}
