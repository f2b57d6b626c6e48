//! Ledger module
//!
//! Append-only record of balance movements. Entries are immutable once
//! persisted; no update or delete is exposed anywhere in this module.

pub mod models;
pub mod repository;

pub use models::{NewTransfer, TransferId, TransferRecord, TransferRow};
pub use repository::LedgerRepository;
