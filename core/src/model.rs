//! Domain model — simulations, accounts and their transaction ledgers.
//!
//! RULES:
//!   - Every account inside a simulation shares the simulation's kind.
//!   - Balances are never negative after a committed operation.
//!   - Ledgers are append-only; a transaction is never edited once recorded.

use crate::{
    error::{SimError, SimResult},
    types::{ApiKey, Currency, EntityId, ProviderKind, ProviderName, TransactionKind, TransactionStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One immutable ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id:        EntityId,
    #[serde(rename = "type")]
    pub kind:      TransactionKind,
    pub amount:    f64,
    /// Currency code for bank ledgers, coin symbol for crypto ledgers.
    pub currency:  String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from:      Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to:        Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status:    TransactionStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id:             EntityId,
    pub username:       String,
    pub account_number: String,
    pub balance:        f64,
    pub currency:       Currency,
    pub transactions:   Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoAccount {
    pub id:             EntityId,
    pub username:       String,
    pub wallet_address: String,
    pub balances:       BTreeMap<String, f64>,
    pub transactions:   Vec<Transaction>,
}

impl CryptoAccount {
    /// Balance for `coin`; coins never credited read as zero.
    pub fn coin_balance(&self, coin: &str) -> f64 {
        self.balances.get(coin).copied().unwrap_or(0.0)
    }
}

/// A bank or crypto identity. The variant is the provider kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Account {
    Bank(BankAccount),
    Crypto(CryptoAccount),
}

impl Account {
    pub fn id(&self) -> &str {
        match self {
            Account::Bank(a)   => &a.id,
            Account::Crypto(a) => &a.id,
        }
    }

    pub fn username(&self) -> &str {
        match self {
            Account::Bank(a)   => &a.username,
            Account::Crypto(a) => &a.username,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Account::Bank(_)   => ProviderKind::Bank,
            Account::Crypto(_) => ProviderKind::Crypto,
        }
    }

    /// Account number or wallet address.
    pub fn display_identifier(&self) -> &str {
        match self {
            Account::Bank(a)   => &a.account_number,
            Account::Crypto(a) => &a.wallet_address,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Account::Bank(a)   => &a.transactions,
            Account::Crypto(a) => &a.transactions,
        }
    }
}

/// A named sandbox bound to one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub id:         EntityId,
    pub name:       String,
    #[serde(rename = "type")]
    pub kind:       ProviderKind,
    pub provider:   ProviderName,
    pub api_key:    ApiKey,
    accounts:       Vec<Account>,
    pub created_at: DateTime<Utc>,
}

impl Simulation {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        kind: ProviderKind,
        provider: impl Into<ProviderName>,
        api_key: ApiKey,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            provider: provider.into(),
            api_key,
            accounts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Append an account. Rejects accounts of the other provider kind.
    pub fn add_account(&mut self, account: Account) -> SimResult<()> {
        if account.kind() != self.kind {
            return Err(SimError::ProviderKindMismatch {
                simulation: self.kind,
                account:    account.kind(),
            });
        }
        self.accounts.push(account);
        Ok(())
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    /// First account whose id equals `id`.
    pub fn find_account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id() == id)
    }

    pub fn find_account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| a.id() == id)
    }

    pub(crate) fn position_of(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|a| a.id() == id)
    }

    /// Mutable access to two accounts at once, for transfers.
    /// Returns `None` for the second slot when both indices are equal.
    pub(crate) fn pair_mut(
        &mut self,
        first: usize,
        second: usize,
    ) -> (&mut Account, Option<&mut Account>) {
        if first == second {
            return (&mut self.accounts[first], None);
        }
        if first < second {
            let (head, tail) = self.accounts.split_at_mut(second);
            (&mut head[first], Some(&mut tail[0]))
        } else {
            let (head, tail) = self.accounts.split_at_mut(first);
            (&mut tail[0], Some(&mut head[second]))
        }
    }
}
