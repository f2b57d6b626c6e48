//! Append-only ledger repository
//!
//! Insertion is the only operation; entries are never updated or deleted.
//! Validation happens in [`NewTransfer::new`], before storage is touched,
//! so the repository only stages structurally valid entries.

use crate::gateway::{StorageError, StorageUnit};

use super::models::{NewTransfer, TransferRecord};

pub struct LedgerRepository;

impl LedgerRepository {
    /// Stage insertion of a ledger entry into the caller's unit of work.
    /// The store assigns the id and timestamp.
    pub async fn append(
        unit: &mut dyn StorageUnit,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, StorageError> {
        unit.insert_transfer(transfer).await
    }
}
