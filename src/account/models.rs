//! Account domain and storage models
//!
//! The in-memory `Account` is what the transfer service operates on. The
//! storage adapter maps it to/from `AccountRow`, keeping the domain type
//! free of persistence concerns.

use rust_decimal::Decimal;

use crate::money;

/// Stable account identifier (storage primary key).
pub type AccountId = i64;

/// An account as the domain sees it.
///
/// Outside an in-flight unit of work the balance is never negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub holder: String,
    pub balance: Decimal,
}

impl Account {
    pub fn new(id: AccountId, holder: impl Into<String>, balance: Decimal) -> Self {
        Self {
            id,
            holder: holder.into(),
            balance: money::round(balance),
        }
    }

    /// Subtract `amount` from the balance, rounding at the monetary scale.
    pub fn debit(&mut self, amount: Decimal) {
        self.balance = money::round(self.balance - amount);
    }

    /// Add `amount` to the balance, rounding at the monetary scale.
    pub fn credit(&mut self, amount: Decimal) {
        self.balance = money::round(self.balance + amount);
    }
}

/// Raw `accounts` table row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub holder: String,
    pub balance: Decimal,
}

impl AccountRow {
    pub fn into_account(self) -> Account {
        Account {
            id: self.id,
            holder: self.holder,
            balance: money::round(self.balance),
        }
    }
}

impl From<&Account> for AccountRow {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            holder: account.holder.clone(),
            balance: account.balance,
        }
    }
}
