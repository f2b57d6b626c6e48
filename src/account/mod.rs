//! Account module
//!
//! Domain account type, its storage row, and the repository operating on a
//! caller-owned unit of work.

pub mod models;
pub mod repository;

pub use models::{Account, AccountId, AccountRow};
pub use repository::AccountRepository;
