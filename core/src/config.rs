//! Session configuration — the simulations, accounts and custom APIs a
//! session starts with.

use crate::types::{Currency, ProviderKind};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn default_seed() -> u64 {
    42
}

/// One account to open when the session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSeed {
    /// Fixed id; generated when absent.
    #[serde(default)]
    pub id:       Option<String>,
    pub username: String,
    /// Opening balance for bank accounts.
    #[serde(default)]
    pub balance:  f64,
    /// Currency for bank accounts; USD when absent.
    #[serde(default)]
    pub currency: Option<Currency>,
    /// Opening coin balances for crypto accounts.
    #[serde(default)]
    pub balances: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSeed {
    pub name:      String,
    #[serde(rename = "type")]
    pub kind:      ProviderKind,
    pub provider:  String,
    /// Fixed API key; generated when absent.
    #[serde(default)]
    pub api_key:   Option<String>,
    #[serde(default)]
    pub accounts:  Vec<AccountSeed>,
    /// Number of extra generated accounts.
    #[serde(default)]
    pub synthetic: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default = "default_seed")]
    pub seed:        u64,
    #[serde(default)]
    pub simulations: Vec<SimulationSeed>,
    /// Custom API documentation in JSON form, registered before any call.
    #[serde(default)]
    pub custom_apis: Vec<Value>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed:        default_seed(),
            simulations: Vec::new(),
            custom_apis: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Load from a JSON session file.
    /// In tests, use SessionConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SessionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        Ok(config)
    }

    /// Hardcoded session for tests. Ids and keys are fixed so tests can
    /// address accounts directly:
    ///
    ///   sk_test_bank     bank "TBC Bank"     alice 100 USD, bob 0 USD, carol 50 EUR
    ///   sk_test_crypto   crypto "Hinkal"     satoshi 1 BTC, vitalik 10 ETH
    ///   sk_test_other    bank "OtherBank"    dana 250 USD, erin 0 USD, felix 75 EUR   (custom API)
    ///   sk_test_coinhub  crypto "CoinHub"    finn 2 BTC, gia 0          (custom API)
    pub fn default_test() -> Self {
        let bank = |id: &str, balance: f64, currency: Currency| AccountSeed {
            id:       Some(id.into()),
            username: id.into(),
            balance,
            currency: Some(currency),
            balances: BTreeMap::new(),
        };
        let wallet = |id: &str, coins: &[(&str, f64)]| AccountSeed {
            id:       Some(id.into()),
            username: id.into(),
            balance:  0.0,
            currency: None,
            balances: coins.iter().map(|(c, v)| (c.to_string(), *v)).collect(),
        };

        Self {
            seed: 7,
            simulations: vec![
                SimulationSeed {
                    name:      "Test Bank".into(),
                    kind:      ProviderKind::Bank,
                    provider:  "TBC Bank".into(),
                    api_key:   Some("sk_test_bank".into()),
                    accounts:  vec![
                        bank("alice", 100.0, Currency::USD),
                        bank("bob", 0.0, Currency::USD),
                        bank("carol", 50.0, Currency::EUR),
                    ],
                    synthetic: 0,
                },
                SimulationSeed {
                    name:      "Test Wallet".into(),
                    kind:      ProviderKind::Crypto,
                    provider:  "Hinkal".into(),
                    api_key:   Some("sk_test_crypto".into()),
                    accounts:  vec![
                        wallet("satoshi", &[("BTC", 1.0)]),
                        wallet("vitalik", &[("ETH", 10.0)]),
                    ],
                    synthetic: 0,
                },
                SimulationSeed {
                    name:      "Other Bank Sandbox".into(),
                    kind:      ProviderKind::Bank,
                    provider:  "OtherBank".into(),
                    api_key:   Some("sk_test_other".into()),
                    accounts:  vec![
                        bank("dana", 250.0, Currency::USD),
                        bank("erin", 0.0, Currency::USD),
                        bank("felix", 75.0, Currency::EUR),
                    ],
                    synthetic: 0,
                },
                SimulationSeed {
                    name:      "CoinHub Sandbox".into(),
                    kind:      ProviderKind::Crypto,
                    provider:  "CoinHub".into(),
                    api_key:   Some("sk_test_coinhub".into()),
                    accounts:  vec![wallet("finn", &[("BTC", 2.0)]), wallet("gia", &[])],
                    synthetic: 0,
                },
            ],
            custom_apis: vec![
                json!({
                    "name": "OtherBank",
                    "type": "bank",
                    "endpoints": [
                        { "name": "Get Balance",      "path": "/v1/balance",  "method": "GET" },
                        { "name": "Transfer Funds",   "path": "/v1/transfer", "method": "POST" },
                        { "name": "Deposit",          "path": "/v1/deposit",  "method": "POST" },
                        { "name": "Withdraw Cash",    "path": "/v1/withdraw", "method": "POST" },
                        { "name": "Transaction History", "path": "/v1/history", "method": "GET" },
                        { "name": "Close Account",    "path": "/v1/close",    "method": "DELETE" }
                    ]
                }),
                json!({
                    "name": "CoinHub",
                    "type": "crypto",
                    "endpoints": [
                        { "name": "Wallet Balance", "path": "/wallet/balance", "method": "post" },
                        { "name": "Send Transfer",  "path": "/wallet/send",    "method": "post" },
                        { "name": "Deposit Coins",  "path": "/wallet/deposit", "method": "post" },
                        { "name": "Withdraw Coins", "path": "/wallet/withdraw","method": "post" },
                        { "name": "Ledger History", "path": "/wallet/history", "method": "post" }
                    ],
                    "userSchema": {
                        "idField": "walletId",
                        "balanceFields": ["BTC", "ETH"],
                        "identifierField": "address"
                    }
                }),
            ],
        }
    }
}
