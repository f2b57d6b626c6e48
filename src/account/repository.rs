//! Typed account operations on a caller-owned unit of work
//!
//! The repository never begins or commits a transaction; the transfer
//! service owns the boundary and hands the open unit in.

use crate::gateway::{LockMode, StorageError, StorageUnit};

use super::models::{Account, AccountId};

pub struct AccountRepository;

impl AccountRepository {
    /// Current persisted state, `None` if no row matches.
    pub async fn get(
        unit: &mut dyn StorageUnit,
        id: AccountId,
    ) -> Result<Option<Account>, StorageError> {
        unit.load_account(id, LockMode::Plain).await
    }

    /// Like [`get`](Self::get), but holds a row-level write lock until the
    /// unit commits or rolls back.
    pub async fn get_for_update(
        unit: &mut dyn StorageUnit,
        id: AccountId,
    ) -> Result<Option<Account>, StorageError> {
        unit.load_account(id, LockMode::ForUpdate).await
    }

    /// Stage the mutated balance/holder of an already-loaded account.
    pub async fn update(
        unit: &mut dyn StorageUnit,
        account: &Account,
    ) -> Result<(), StorageError> {
        unit.update_account(account).await
    }
}
