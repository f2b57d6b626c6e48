//! Transfer module
//!
//! The money-movement core: error taxonomy, attempt state machine, and the
//! service that drives one atomic unit of work per transfer.

pub mod error;
pub mod service;
pub mod state;


pub use error::TransferError;
pub use service::{DEFAULT_DEADLINE, TransferService};
pub use state::TransferState;
