//! PostgreSQL gateway
//!
//! Unit of work backed by a `sqlx` transaction. Row locks are taken with
//! `SELECT ... FOR UPDATE`; callers are responsible for acquiring them in
//! ascending id order.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{LockMode, PersistenceGateway, StorageError, StorageUnit};
use crate::account::{Account, AccountId, AccountRow};
use crate::clock::{Clock, SystemClock};
use crate::ledger::{NewTransfer, TransferRecord, TransferRow};

/// Create the two tables if they do not exist yet.
///
/// Schema migration proper is out of scope; this mirrors what a migration
/// would produce so tests and the demo binary can bootstrap an empty
/// database.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id      BIGINT PRIMARY KEY,
            holder  TEXT NOT NULL CHECK (holder <> ''),
            balance NUMERIC(18, 2) NOT NULL CHECK (balance >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS transfers (
            id         BIGSERIAL PRIMARY KEY,
            from_id    BIGINT NOT NULL REFERENCES accounts (id),
            to_id      BIGINT NOT NULL REFERENCES accounts (id),
            amount     NUMERIC(18, 2) NOT NULL CHECK (amount > 0),
            created_at TIMESTAMPTZ NOT NULL,
            CHECK (from_id <> to_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Gateway producing one transaction-backed unit per `begin`.
pub struct PgGateway {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgGateway {
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl PersistenceGateway for PgGateway {
    async fn begin(&self) -> Result<Box<dyn StorageUnit>, StorageError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnit {
            tx,
            clock: self.clock.clone(),
        }))
    }
}

struct PgUnit {
    tx: Transaction<'static, Postgres>,
    clock: Arc<dyn Clock>,
}

#[async_trait]
impl StorageUnit for PgUnit {
    async fn load_account(
        &mut self,
        id: AccountId,
        lock: LockMode,
    ) -> Result<Option<Account>, StorageError> {
        let sql = match lock {
            LockMode::Plain => "SELECT id, holder, balance FROM accounts WHERE id = $1",
            LockMode::ForUpdate => {
                "SELECT id, holder, balance FROM accounts WHERE id = $1 FOR UPDATE"
            }
        };

        let row: Option<AccountRow> = sqlx::query_as(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(row.map(AccountRow::into_account))
    }

    async fn update_account(&mut self, account: &Account) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"UPDATE accounts SET holder = $2, balance = $3 WHERE id = $1"#,
        )
        .bind(account.id)
        .bind(&account.holder)
        .bind(account.balance)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            // The row was loaded earlier in this unit; it cannot vanish.
            return Err(StorageError::Internal(format!(
                "account {} disappeared mid-unit",
                account.id
            )));
        }

        Ok(())
    }

    async fn insert_transfer(
        &mut self,
        transfer: &NewTransfer,
    ) -> Result<TransferRecord, StorageError> {
        let row: TransferRow = sqlx::query_as(
            r#"
            INSERT INTO transfers (from_id, to_id, amount, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, from_id, to_id, amount, created_at
            "#,
        )
        .bind(transfer.from_id())
        .bind(transfer.to_id())
        .bind(transfer.amount())
        .bind(self.clock.now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into_record())
    }

    async fn commit(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StorageError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
