//! Transfer attempt state machine
//!
//! One attempt moves `Init → Validated → Loaded → Applied → Committed`;
//! any state may fall to `Failed`, which rolls the unit back. The state is
//! attached to tracing events so a failed attempt shows how far it got.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Request received, nothing checked yet.
    Init,
    /// Amount and account-distinctness checks passed.
    Validated,
    /// Both accounts resolved and locked.
    Loaded,
    /// Balances mutated and ledger entry staged inside the unit.
    Applied,
    /// Terminal: unit committed, all effects visible.
    Committed,
    /// Terminal: attempt failed, unit rolled back.
    Failed,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Committed | TransferState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Init => "INIT",
            TransferState::Validated => "VALIDATED",
            TransferState::Loaded => "LOADED",
            TransferState::Applied => "APPLIED",
            TransferState::Committed => "COMMITTED",
            TransferState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
