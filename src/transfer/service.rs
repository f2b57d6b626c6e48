//! Transfer service
//!
//! Orchestrates one transfer: validate, load and lock both accounts, move
//! the balance, append the ledger entry, commit. The service owns the unit
//! of work; every failure path rolls it back before the error is returned.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::account::{AccountId, AccountRepository};
use crate::gateway::{PersistenceGateway, StorageUnit};
use crate::ledger::{LedgerRepository, NewTransfer, TransferRecord};
use crate::money;

use super::error::TransferError;
use super::state::TransferState;

/// Default unit-of-work deadline when none is configured.
pub const DEFAULT_DEADLINE: Duration = Duration::from_millis(5000);

pub struct TransferService {
    gateway: Arc<dyn PersistenceGateway>,
    deadline: Duration,
}

impl TransferService {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self::with_deadline(gateway, DEFAULT_DEADLINE)
    }

    pub fn with_deadline(gateway: Arc<dyn PersistenceGateway>, deadline: Duration) -> Self {
        Self { gateway, deadline }
    }

    /// Move `amount` from `from_id` to `to_id` atomically.
    ///
    /// Preconditions are checked in order, each with its own failure kind:
    /// positive representable amount, distinct accounts, both accounts
    /// present, sufficient funds. On success exactly one ledger entry is
    /// appended and both balances are updated in the same commit.
    ///
    /// The service performs no internal retry; storage failures carry a
    /// retriability hint via [`TransferError::is_retriable`].
    pub async fn transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferRecord, TransferError> {
        debug!(from_id, to_id, %amount, state = %TransferState::Init, "transfer requested");

        let result = self.transfer_inner(from_id, to_id, amount).await;

        match &result {
            Ok(record) => {
                info!(
                    transfer_id = record.id,
                    from_id,
                    to_id,
                    amount = %record.amount,
                    state = %TransferState::Committed,
                    "transfer committed"
                );
            }
            Err(e) => {
                warn!(
                    from_id,
                    to_id,
                    %amount,
                    code = e.code(),
                    retriable = e.is_retriable(),
                    state = %TransferState::Failed,
                    "transfer failed"
                );
            }
        }

        result
    }

    async fn transfer_inner(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferRecord, TransferError> {
        if !money::is_valid_amount(amount) {
            return Err(TransferError::InvalidAmount);
        }
        if from_id == to_id {
            return Err(TransferError::SameAccount);
        }
        let amount = money::round(amount);
        debug!(from_id, to_id, state = %TransferState::Validated, "preconditions passed");

        // The deadline covers the whole unit of work. On expiry the future
        // is dropped and with it the open unit, which rolls back.
        match tokio::time::timeout(self.deadline, self.run_unit(from_id, to_id, amount)).await {
            Ok(result) => result,
            Err(_) => Err(TransferError::Timeout),
        }
    }

    /// Scoped unit of work: commit on success, rollback on any failure.
    async fn run_unit(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferRecord, TransferError> {
        let mut unit = self.gateway.begin().await?;

        match Self::apply(unit.as_mut(), from_id, to_id, amount).await {
            Ok(record) => {
                unit.commit().await?;
                Ok(record)
            }
            Err(e) => {
                // Surface the original failure; a rollback error on the
                // cleanup path is only logged.
                if let Err(rb) = unit.rollback().await {
                    warn!(from_id, to_id, error = %rb, "rollback failed after transfer error");
                }
                Err(e)
            }
        }
    }

    /// Stage all mutations of one transfer inside an open unit.
    async fn apply(
        unit: &mut dyn StorageUnit,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
    ) -> Result<TransferRecord, TransferError> {
        // Row locks in ascending id order, so two opposing transfers
        // (A→B and B→A) cannot deadlock.
        let (lo, hi) = if from_id < to_id {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };
        let lo_account = AccountRepository::get_for_update(unit, lo).await?;
        let hi_account = AccountRepository::get_for_update(unit, hi).await?;

        let (from, to) = if from_id == lo {
            (lo_account, hi_account)
        } else {
            (hi_account, lo_account)
        };

        let mut from = from.ok_or(TransferError::AccountNotFound(from_id))?;
        let mut to = to.ok_or(TransferError::AccountNotFound(to_id))?;
        debug!(from_id, to_id, state = %TransferState::Loaded, "accounts locked");

        if from.balance < amount {
            return Err(TransferError::InsufficientFunds);
        }

        from.debit(amount);
        to.credit(amount);

        // Post-apply invariant: balances never go negative. Hitting this is
        // a bug, not a caller error.
        if from.balance < Decimal::ZERO || to.balance < Decimal::ZERO {
            return Err(TransferError::Internal(format!(
                "negative balance after apply: from={} to={}",
                from.balance, to.balance
            )));
        }

        AccountRepository::update(unit, &from).await?;
        AccountRepository::update(unit, &to).await?;

        let entry = NewTransfer::new(from_id, to_id, amount)?;
        let record = LedgerRepository::append(unit, &entry).await?;
        debug!(from_id, to_id, transfer_id = record.id, state = %TransferState::Applied, "mutations staged");

        Ok(record)
    }
}
