use crate::{
    request::RequestBody,
    types::{ApiKey, ProviderKind},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// The built-in endpoints of the fixed bank and crypto APIs.
/// Variants are only ever appended; paths are part of the public surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedEndpoint {
    // ── Bank ──────────────────────────────────────
    BankBalance,
    BankTransfer,
    BankDeposit,
    BankWithdraw,
    BankTransactions,

    // ── Crypto ────────────────────────────────────
    CryptoBalance,
    CryptoTransfer,
    CryptoDeposit,
    CryptoWithdraw,
    CryptoTransactions,
}

impl FixedEndpoint {
    pub const ALL: [FixedEndpoint; 10] = [
        Self::BankBalance,
        Self::BankTransfer,
        Self::BankDeposit,
        Self::BankWithdraw,
        Self::BankTransactions,
        Self::CryptoBalance,
        Self::CryptoTransfer,
        Self::CryptoDeposit,
        Self::CryptoWithdraw,
        Self::CryptoTransactions,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::BankBalance        => "/api/bank/balance",
            Self::BankTransfer       => "/api/bank/transfer",
            Self::BankDeposit        => "/api/bank/deposit",
            Self::BankWithdraw       => "/api/bank/withdraw",
            Self::BankTransactions   => "/api/bank/transactions",
            Self::CryptoBalance      => "/api/crypto/balance",
            Self::CryptoTransfer     => "/api/crypto/transfer",
            Self::CryptoDeposit      => "/api/crypto/deposit",
            Self::CryptoWithdraw     => "/api/crypto/withdraw",
            Self::CryptoTransactions => "/api/crypto/transactions",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim().trim_end_matches('/');
        Self::ALL.into_iter().find(|e| e.path() == path)
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::BankBalance
            | Self::BankTransfer
            | Self::BankDeposit
            | Self::BankWithdraw
            | Self::BankTransactions => ProviderKind::Bank,
            _ => ProviderKind::Crypto,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            Self::BankBalance
            | Self::BankTransactions
            | Self::CryptoBalance
            | Self::CryptoTransactions => "GET",
            _ => "POST",
        }
    }

    /// Example body the request tester pre-fills.
    pub fn sample_body(&self) -> RequestBody {
        let value = match self {
            Self::BankBalance | Self::BankTransactions => json!({ "userId": "user_id_here" }),
            Self::CryptoBalance | Self::CryptoTransactions => json!({ "userId": "user_id_here" }),
            Self::BankTransfer => json!({
                "fromUserId": "user_id_1",
                "toUserId":   "user_id_2",
                "amount":     100
            }),
            Self::BankDeposit | Self::BankWithdraw => json!({
                "userId": "user_id_here",
                "amount": 100
            }),
            Self::CryptoTransfer => json!({
                "fromUserId": "user_id_1",
                "toUserId":   "user_id_2",
                "amount":     0.5,
                "coin":       "BTC"
            }),
            Self::CryptoDeposit | Self::CryptoWithdraw => json!({
                "userId": "user_id_here",
                "amount": 0.5,
                "coin":   "BTC"
            }),
        };
        RequestBody::from_value(value).unwrap_or_default()
    }

    /// Presets shown for a provider kind.
    pub fn presets(kind: ProviderKind) -> Vec<FixedEndpoint> {
        Self::ALL.into_iter().filter(|e| e.kind() == kind).collect()
    }
}

/// One call as the request tester submits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRequest {
    pub api_key:  ApiKey,
    /// Fixed path, or a custom endpoint's path or name.
    pub endpoint: String,
    #[serde(default)]
    pub method:   Option<String>,
    #[serde(default)]
    pub body:     RequestBody,
}

impl ApiRequest {
    pub fn new(api_key: impl Into<ApiKey>, endpoint: impl Into<String>, body: RequestBody) -> Self {
        Self {
            api_key:  api_key.into(),
            endpoint: endpoint.into(),
            method:   None,
            body,
        }
    }
}
