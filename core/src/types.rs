//! Shared primitive types used across the entire simulator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable identifier for a simulation, account or definition.
pub type EntityId = String;

/// The opaque credential that selects a simulation.
pub type ApiKey = String;

/// Provider name — the join key between a simulation and a custom definition.
pub type ProviderName = String;

/// The coins every crypto account is opened with.
pub const DEFAULT_COINS: [&str; 3] = ["BTC", "ETH", "USDT"];

/// Coin used by the dynamic simulator when the body names none.
pub const FALLBACK_COIN: &str = "BTC";

/// Which kind of service a simulation impersonates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Bank,
    Crypto,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bank   => "bank",
            Self::Crypto => "crypto",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fiat currencies a bank account may hold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    USD,
    EUR,
    GEL,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GEL => "GEL",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

/// Settlement state of a ledger entry. The simulator only ever commits
/// `Success`; the other states exist so imported ledgers round-trip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Success,
    Pending,
    Failed,
}
