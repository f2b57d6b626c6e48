//! In-memory gateway
//!
//! Snapshot-isolated store for tests and demos. Each unit stages writes
//! against the versions it observed; at commit the write set is checked and
//! a concurrent modification surfaces as a retriable conflict
//! (first committer wins).
//!
//! A [`FaultPlan`] injects storage failures at chosen points so rollback
//! and error-mapping paths can be exercised without a real database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::{LockMode, PersistenceGateway, StorageError, StorageUnit};
use crate::account::{Account, AccountId};
use crate::clock::{Clock, SystemClock};
use crate::ledger::{NewTransfer, TransferId, TransferRecord};

/// Configured failure behavior, sampled by each unit at `begin`.
#[derive(Debug, Default, Clone)]
pub struct FaultPlan {
    /// Fail with `Unavailable` once this many updates succeeded in a unit.
    pub fail_update_after: Option<usize>,
    /// Fail the commit itself; staged mutations are discarded.
    pub fail_commit: bool,
    /// Delay every load by this much (for deadline tests).
    pub stall_load: Option<Duration>,
}

#[derive(Debug, Clone)]
struct VersionedAccount {
    account: Account,
    version: u64,
}

#[derive(Debug, Default)]
struct MemStore {
    accounts: HashMap<AccountId, VersionedAccount>,
    transfers: Vec<TransferRecord>,
    next_transfer_id: TransferId,
}

/// Shared in-memory store handing out snapshot units.
pub struct MemoryGateway {
    store: Arc<Mutex<MemStore>>,
    faults: Arc<Mutex<FaultPlan>>,
    clock: Arc<dyn Clock>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: Arc::new(Mutex::new(MemStore {
                next_transfer_id: 1,
                ..MemStore::default()
            })),
            faults: Arc::new(Mutex::new(FaultPlan::default())),
            clock,
        }
    }

    /// Seed the store with accounts (out-of-band creation per the domain
    /// lifecycle; the transfer service never creates accounts).
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let gateway = Self::new();
        {
            let mut store = gateway.store.lock().unwrap();
            for account in accounts {
                store
                    .accounts
                    .insert(account.id, VersionedAccount { account, version: 0 });
            }
        }
        gateway
    }

    pub fn set_faults(&self, plan: FaultPlan) {
        *self.faults.lock().unwrap() = plan;
    }

    pub fn clear_faults(&self) {
        self.set_faults(FaultPlan::default());
    }

    /// Committed state of one account.
    pub fn account(&self, id: AccountId) -> Option<Account> {
        self.store
            .lock()
            .unwrap()
            .accounts
            .get(&id)
            .map(|v| v.account.clone())
    }

    /// Sum of all committed balances (conservation checks).
    pub fn total_balance(&self) -> Decimal {
        self.store
            .lock()
            .unwrap()
            .accounts
            .values()
            .map(|v| v.account.balance)
            .sum()
    }

    /// Committed ledger entries, in insertion order.
    pub fn transfers(&self) -> Vec<TransferRecord> {
        self.store.lock().unwrap().transfers.clone()
    }
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn begin(&self) -> Result<Box<dyn StorageUnit>, StorageError> {
        Ok(Box::new(MemUnit {
            store: self.store.clone(),
            clock: self.clock.clone(),
            faults: self.faults.lock().unwrap().clone(),
            read_versions: HashMap::new(),
            staged_accounts: HashMap::new(),
            staged_transfers: Vec::new(),
            updates_done: 0,
        }))
    }
}

struct MemUnit {
    store: Arc<Mutex<MemStore>>,
    clock: Arc<dyn Clock>,
    faults: FaultPlan,
    read_versions: HashMap<AccountId, u64>,
    staged_accounts: HashMap<AccountId, Account>,
    staged_transfers: Vec<TransferRecord>,
    updates_done: usize,
}

#[async_trait]
impl StorageUnit for MemUnit {
    async fn load_account(
        &mut self,
        id: AccountId,
        _lock: LockMode,
    ) -> Result<Option<Account>, StorageError> {
        if let Some(delay) = self.faults.stall_load {
            tokio::time::sleep(delay).await;
        }

        // Read-your-writes within the unit.
        if let Some(staged) = self.staged_accounts.get(&id) {
            return Ok(Some(staged.clone()));
        }

        let store = self.store.lock().unwrap();
        match store.accounts.get(&id) {
            Some(v) => {
                self.read_versions.insert(id, v.version);
                Ok(Some(v.account.clone()))
            }
            None => Ok(None),
        }
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), StorageError> {
        if self.faults.fail_update_after == Some(self.updates_done) {
            return Err(StorageError::Unavailable(
                "injected storage fault".to_string(),
            ));
        }

        if !self.read_versions.contains_key(&account.id) {
            return Err(StorageError::Internal(format!(
                "account {} updated without being loaded in this unit",
                account.id
            )));
        }

        self.staged_accounts.insert(account.id, account.clone());
        self.updates_done += 1;
        Ok(())
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, StorageError> {
        // Reserve the id eagerly, like a database sequence; a later rollback
        // leaves a gap, which is fine for a surrogate key.
        let id = {
            let mut store = self.store.lock().unwrap();
            let id = store.next_transfer_id;
            store.next_transfer_id += 1;
            id
        };

        let record = TransferRecord {
            id,
            from_id: transfer.from_id(),
            to_id: transfer.to_id(),
            amount: transfer.amount(),
            created_at: self.clock.now(),
        };
        self.staged_transfers.push(record.clone());
        Ok(record)
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        if self.faults.fail_commit {
            return Err(StorageError::Unavailable(
                "injected commit failure".to_string(),
            ));
        }

        let mut store = self.store.lock().unwrap();

        // Write-set validation: every staged account must still be at the
        // version this unit observed.
        for id in self.staged_accounts.keys() {
            let observed = self.read_versions.get(id).copied();
            let current = store.accounts.get(id).map(|v| v.version);
            if observed != current {
                return Err(StorageError::Conflict(format!(
                    "account {} modified by a concurrent unit",
                    id
                )));
            }
        }

        for (id, account) in self.staged_accounts {
            let entry = store
                .accounts
                .get_mut(&id)
                .expect("validated above: account exists");
            entry.account = account;
            entry.version += 1;
        }
        store.transfers.extend(self.staged_transfers);

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        // Nothing was published; dropping the staged state is the rollback.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn seeded() -> MemoryGateway {
        MemoryGateway::with_accounts([
            Account::new(1, "Alice", dec!(1000.00)),
            Account::new(2, "Bob", dec!(500.00)),
        ])
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let gateway = seeded();

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        alice.debit(dec!(100.00));
        unit.update_account(&alice).await.unwrap();
        unit.commit().await.unwrap();

        assert_eq!(gateway.account(1).unwrap().balance, dec!(900.00));
    }

    #[tokio::test]
    async fn test_rollback_discards_staged_writes() {
        let gateway = seeded();

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        alice.debit(dec!(100.00));
        unit.update_account(&alice).await.unwrap();
        unit.rollback().await.unwrap();

        assert_eq!(gateway.account(1).unwrap().balance, dec!(1000.00));
        assert!(gateway.transfers().is_empty());
    }

    #[tokio::test]
    async fn test_staged_writes_invisible_before_commit() {
        let gateway = seeded();

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        alice.debit(dec!(100.00));
        unit.update_account(&alice).await.unwrap();

        // Committed state unchanged while the unit is open.
        assert_eq!(gateway.account(1).unwrap().balance, dec!(1000.00));
        unit.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_read_your_writes_within_unit() {
        let gateway = seeded();

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        alice.debit(dec!(250.00));
        unit.update_account(&alice).await.unwrap();

        let reread = unit
            .load_account(1, LockMode::Plain)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reread.balance, dec!(750.00));
        unit.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_first_committer_wins() {
        let gateway = seeded();

        let mut first = gateway.begin().await.unwrap();
        let mut second = gateway.begin().await.unwrap();

        let mut a1 = first
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        let mut a2 = second
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();

        a1.debit(dec!(10.00));
        first.update_account(&a1).await.unwrap();
        a2.debit(dec!(20.00));
        second.update_account(&a2).await.unwrap();

        first.commit().await.unwrap();
        let err = second.commit().await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        assert_eq!(gateway.account(1).unwrap().balance, dec!(990.00));
    }

    #[tokio::test]
    async fn test_update_without_load_is_internal_error() {
        let gateway = seeded();

        let mut unit = gateway.begin().await.unwrap();
        let account = Account::new(1, "Alice", dec!(1.00));
        let err = unit.update_account(&account).await.unwrap_err();
        assert!(matches!(err, StorageError::Internal(_)));
        unit.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_update_fault() {
        let gateway = seeded();
        gateway.set_faults(FaultPlan {
            fail_update_after: Some(1),
            ..FaultPlan::default()
        });

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        let mut bob = unit
            .load_account(2, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();

        alice.debit(dec!(40.00));
        unit.update_account(&alice).await.unwrap();

        bob.credit(dec!(40.00));
        let err = unit.update_account(&bob).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        unit.rollback().await.unwrap();

        assert_eq!(gateway.account(1).unwrap().balance, dec!(1000.00));
    }

    #[tokio::test]
    async fn test_failed_commit_leaves_store_unchanged() {
        let gateway = seeded();
        gateway.set_faults(FaultPlan {
            fail_commit: true,
            ..FaultPlan::default()
        });

        let mut unit = gateway.begin().await.unwrap();
        let mut alice = unit
            .load_account(1, LockMode::ForUpdate)
            .await
            .unwrap()
            .unwrap();
        alice.debit(dec!(40.00));
        unit.update_account(&alice).await.unwrap();

        let err = unit.commit().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));

        assert_eq!(gateway.account(1).unwrap().balance, dec!(1000.00));
        assert_eq!(gateway.total_balance(), dec!(1500.00));
    }
}
