//! Ledger entry models
//!
//! `NewTransfer` is the only way to stage a ledger entry. Its constructor
//! validates positivity and distinctness, so an invalid entry cannot reach
//! a storage adapter. Ids and timestamps are assigned at insertion.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::account::AccountId;
use crate::money;
use crate::transfer::TransferError;

/// Store-assigned ledger entry identifier (monotonic surrogate key).
pub type TransferId = i64;

/// A ledger entry that has not been persisted yet.
///
/// Invariants enforced at construction: `amount > 0`, representable at the
/// monetary scale, and `from_id != to_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransfer {
    from_id: AccountId,
    to_id: AccountId,
    amount: Decimal,
}

impl NewTransfer {
    pub fn new(
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<Self, TransferError> {
        if !money::is_valid_amount(amount) {
            return Err(TransferError::InvalidAmount);
        }
        if from_id == to_id {
            return Err(TransferError::SameAccount);
        }
        Ok(Self {
            from_id,
            to_id,
            amount: money::round(amount),
        })
    }

    pub fn from_id(&self) -> AccountId {
        self.from_id
    }

    pub fn to_id(&self) -> AccountId {
        self.to_id
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A persisted, immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRecord {
    pub id: TransferId,
    pub from_id: AccountId,
    pub to_id: AccountId,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Raw `transfers` table row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransferRow {
    pub id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl TransferRow {
    pub fn into_record(self) -> TransferRecord {
        TransferRecord {
            id: self.id,
            from_id: self.from_id,
            to_id: self.to_id,
            amount: money::round(self.amount),
            created_at: self.created_at,
        }
    }
}
