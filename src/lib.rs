//! minibank - Transactional account-to-account transfers
//!
//! A small banking core: debit one account, credit another, and record the
//! movement as an immutable ledger entry, all inside one atomic unit of
//! work over PostgreSQL.
//!
//! # Modules
//!
//! - [`money`] - Two-digit decimal money helpers
//! - [`account`] - Account domain type and repository
//! - [`ledger`] - Append-only transfer records
//! - [`gateway`] - Unit-of-work abstraction (Postgres and in-memory)
//! - [`transfer`] - The transfer service, error taxonomy, and state machine
//! - [`db`] - Connection pool management
//! - [`config`] / [`logging`] - Startup wiring

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod money;

pub mod account;
pub mod gateway;
pub mod ledger;
pub mod transfer;

// Convenient re-exports at crate root
pub use account::{Account, AccountId, AccountRepository};
pub use clock::{Clock, FixedClock, SystemClock};
pub use db::Database;
pub use gateway::{
    LockMode, MemoryGateway, PersistenceGateway, PgGateway, StorageError, StorageUnit,
};
pub use ledger::{LedgerRepository, NewTransfer, TransferId, TransferRecord};
pub use transfer::{TransferError, TransferService, TransferState};
