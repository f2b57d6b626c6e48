//! Transfer error taxonomy
//!
//! One variant per user-visible failure kind. Validation and domain
//! failures are final; storage failures carry a retriability hint the
//! caller can act on. The service never swallows a failure and never logs
//! as a substitute for returning one.

use thiserror::Error;

use crate::account::AccountId;
use crate::gateway::StorageError;

#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation / domain failures (never retried) ===
    #[error("Amount must be positive with at most two fractional digits")]
    InvalidAmount,

    #[error("Source and destination account cannot be the same")]
    SameAccount,

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Insufficient funds")]
    InsufficientFunds,

    // === Unit-of-work failures ===
    #[error("Deadline exceeded during unit of work")]
    Timeout,

    // === Storage failures (retriable) ===
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    // === Invariant violation detected post-hoc (fatal for the session) ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransferError {
    /// Stable error code for logs and API mapping.
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds => "INSUFFICIENT_FUNDS",
            TransferError::Timeout => "TIMEOUT",
            TransferError::StorageConflict(_) => "STORAGE_CONFLICT",
            TransferError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            TransferError::Internal(_) => "INTERNAL",
        }
    }

    /// Whether the caller may retry the whole transfer (bounded, with
    /// backoff for `StorageUnavailable`). The service itself never retries.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TransferError::StorageConflict(_) | TransferError::StorageUnavailable(_)
        )
    }
}

impl From<StorageError> for TransferError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Conflict(msg) => TransferError::StorageConflict(msg),
            StorageError::Unavailable(msg) => TransferError::StorageUnavailable(msg),
            StorageError::Internal(msg) => TransferError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TransferError::InvalidAmount.code(), "INVALID_AMOUNT");
        assert_eq!(TransferError::SameAccount.code(), "SAME_ACCOUNT");
        assert_eq!(TransferError::AccountNotFound(7).code(), "ACCOUNT_NOT_FOUND");
        assert_eq!(TransferError::InsufficientFunds.code(), "INSUFFICIENT_FUNDS");
        assert_eq!(TransferError::Timeout.code(), "TIMEOUT");
    }

    #[test]
    fn test_retriability() {
        assert!(TransferError::StorageConflict("40001".into()).is_retriable());
        assert!(TransferError::StorageUnavailable("io".into()).is_retriable());

        assert!(!TransferError::InvalidAmount.is_retriable());
        assert!(!TransferError::SameAccount.is_retriable());
        assert!(!TransferError::AccountNotFound(1).is_retriable());
        assert!(!TransferError::InsufficientFunds.is_retriable());
        assert!(!TransferError::Timeout.is_retriable());
        assert!(!TransferError::Internal("bad".into()).is_retriable());
    }

    #[test]
    fn test_storage_error_mapping() {
        assert!(matches!(
            TransferError::from(StorageError::Conflict("c".into())),
            TransferError::StorageConflict(_)
        ));
        assert!(matches!(
            TransferError::from(StorageError::Unavailable("u".into())),
            TransferError::StorageUnavailable(_)
        ));
        assert!(matches!(
            TransferError::from(StorageError::Internal("i".into())),
            TransferError::Internal(_)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TransferError::InsufficientFunds.to_string(),
            "Insufficient funds"
        );
        assert_eq!(
            TransferError::AccountNotFound(3).to_string(),
            "Account not found: 3"
        );
    }
}
