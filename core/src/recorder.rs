//! Response envelopes and transaction records.
//!
//! Both simulators build their replies and ledger entries through this
//! module so the shapes never drift apart.

use crate::{
    error::{SimError, SimResult},
    model::Transaction,
    types::{Currency, TransactionKind, TransactionStatus},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// The uniform reply to every simulated call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success:   bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data:      Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:     Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success:   true,
            data:      Some(data),
            error:     None,
            timestamp: Utc::now(),
        }
    }

    pub fn fail(error: &SimError) -> Self {
        Self {
            success:   false,
            data:      None,
            error:     Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }

    /// Collapse an operation result into an envelope. Nothing escapes.
    pub fn from_result(operation: &str, result: SimResult<Value>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                log::warn!("{operation}: rejected: {e}");
                Self::fail(&e)
            }
        }
    }

    /// HTTP-like status the request tester shows.
    pub fn status_code(&self) -> u16 {
        if self.success { 200 } else { 400 }
    }

    /// The `data` payload as a field table, for callers that inspect replies.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(name))
    }
}

/// Build a ledger entry stamped with a fresh id and the current time.
pub fn new_transaction(
    kind: TransactionKind,
    amount: f64,
    currency: &str,
    from: Option<&str>,
    to: Option<&str>,
) -> Transaction {
    Transaction {
        id:        Uuid::new_v4().to_string(),
        kind,
        amount,
        currency:  currency.to_string(),
        from:      from.map(str::to_string),
        to:        to.map(str::to_string),
        timestamp: Utc::now(),
        status:    TransactionStatus::Success,
    }
}

/// Append the same record to the ledger of every account it touches.
pub fn record<'a>(tx: &Transaction, ledgers: impl IntoIterator<Item = &'a mut Vec<Transaction>>) {
    for ledger in ledgers {
        ledger.push(tx.clone());
    }
}

// ── Payloads ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BankBalancePayload {
    pub user_id:        String,
    pub account_number: String,
    pub balance:        f64,
    pub currency:       Currency,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoBalancePayload {
    pub user_id:        String,
    pub wallet_address: String,
    pub balances:       BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction_id: String,
    pub from:           String,
    pub to:             String,
    pub amount:         f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency:       Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin:           Option<String>,
    pub status:         TransactionStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeReceipt {
    pub transaction_id: String,
    pub new_balance:    f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency:       Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin:           Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryPayload {
    pub transactions: Vec<Transaction>,
}

/// Serialize a payload into the envelope's `data` value.
pub fn to_data<T: Serialize>(payload: &T) -> SimResult<Value> {
    Ok(serde_json::to_value(payload)?)
}
