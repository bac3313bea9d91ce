//! Custom API definitions and endpoint classification.
//!
//! A definition is parsed once from JSON documentation and never mutated
//! afterwards. Endpoint names are classified into an `OperationKind` by
//! case-insensitive keyword search, first match wins:
//!
//!   1. "balance" or "get"          → Balance
//!   2. "transfer"                  → Transfer
//!   3. "deposit"                   → Deposit
//!   4. "withdraw"                  → Withdraw
//!   5. "transaction" or "history"  → History
//!   otherwise                      → Unknown
//!
//! A name carrying several keywords takes the earliest rule, so
//! "Get Transfer History" is a Balance endpoint.

use crate::{
    error::{SimError, SimResult},
    types::{EntityId, ProviderKind, ProviderName, DEFAULT_COINS},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The logical operation an endpoint name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Balance,
    Transfer,
    Deposit,
    Withdraw,
    History,
    Unknown,
}

impl OperationKind {
    /// Keyword rules in priority order.
    const RULES: [(&'static [&'static str], OperationKind); 5] = [
        (&["balance", "get"], OperationKind::Balance),
        (&["transfer"], OperationKind::Transfer),
        (&["deposit"], OperationKind::Deposit),
        (&["withdraw"], OperationKind::Withdraw),
        (&["transaction", "history"], OperationKind::History),
    ];

    pub fn classify(endpoint_name: &str) -> Self {
        let name = endpoint_name.to_lowercase();
        Self::RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| name.contains(k)))
            .map(|(_, kind)| *kind)
            .unwrap_or(OperationKind::Unknown)
    }
}

/// Field-naming conventions of a custom provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSchema {
    /// Request/response field carrying the account id.
    pub id_field:         String,
    /// Coins a crypto balance reply always lists. Bank replies use `balance`.
    pub balance_fields:   Vec<String>,
    /// Response field carrying the account number or wallet address.
    pub identifier_field: String,
}

impl UserSchema {
    pub fn default_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Bank => Self {
                id_field:         "userId".into(),
                balance_fields:   vec!["balance".into()],
                identifier_field: "accountNumber".into(),
            },
            ProviderKind::Crypto => Self {
                id_field:         "userId".into(),
                balance_fields:   DEFAULT_COINS.iter().map(|c| c.to_string()).collect(),
                identifier_field: "walletAddress".into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEndpoint {
    pub name:          String,
    pub path:          String,
    pub method:        String,
    #[serde(default)]
    pub description:   String,
    #[serde(default)]
    pub request_body:  BTreeMap<String, Value>,
    #[serde(default)]
    pub response_body: BTreeMap<String, Value>,
}

impl ApiEndpoint {
    pub fn operation(&self) -> OperationKind {
        OperationKind::classify(&self.name)
    }
}

/// A user-registered provider schema, keyed by provider name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomApiDefinition {
    pub id:          EntityId,
    pub name:        ProviderName,
    #[serde(rename = "type")]
    pub kind:        ProviderKind,
    pub description: String,
    pub endpoints:   Vec<ApiEndpoint>,
    pub user_schema: UserSchema,
}

impl CustomApiDefinition {
    /// Endpoint whose path equals `path_or_name`, else the first whose
    /// name matches it case-insensitively.
    pub fn endpoint(&self, path_or_name: &str) -> Option<&ApiEndpoint> {
        self.endpoints
            .iter()
            .find(|e| e.path == path_or_name)
            .or_else(|| {
                self.endpoints
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(path_or_name))
            })
    }

    /// Distinct feature labels covered by the endpoints, first seen first.
    pub fn features(&self) -> Vec<&'static str> {
        let mut features = Vec::new();
        for endpoint in &self.endpoints {
            let name = endpoint.name.to_lowercase();
            for (keyword, label) in FEATURE_KEYWORDS {
                if name.contains(keyword) && !features.contains(&label) {
                    features.push(label);
                }
            }
        }
        features
    }
}

const FEATURE_KEYWORDS: [(&str, &str); 6] = [
    ("balance", "Balance Queries"),
    ("transfer", "Transfers"),
    ("deposit", "Deposits"),
    ("withdraw", "Withdrawals"),
    ("transaction", "Transaction History"),
    ("history", "Transaction History"),
];

// ── Documentation JSON ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointDoc {
    name:          String,
    path:          String,
    method:        String,
    #[serde(default)]
    description:   Option<String>,
    #[serde(default)]
    request_body:  Option<BTreeMap<String, Value>>,
    #[serde(default)]
    response_body: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DefinitionDoc {
    name:        Option<String>,
    #[serde(rename = "type")]
    kind:        Option<String>,
    description: Option<String>,
    endpoints:   Option<Vec<EndpointDoc>>,
    user_schema: Option<UserSchema>,
}

/// Build a definition from documentation text in JSON form.
///
/// `name`, `type` and `endpoints` are required; everything else falls back
/// to the defaults for the provider kind.
pub fn parse_definition_json(doc_text: &str, id: EntityId) -> SimResult<CustomApiDefinition> {
    let doc: DefinitionDoc = serde_json::from_str(doc_text)
        .map_err(|e| SimError::InvalidDefinition(format!("not valid JSON: {e}")))?;
    definition_from_doc(doc, id)
}

/// Same as `parse_definition_json` for an already-parsed JSON value.
pub fn definition_from_value(value: Value, id: EntityId) -> SimResult<CustomApiDefinition> {
    let doc: DefinitionDoc = serde_json::from_value(value)
        .map_err(|e| SimError::InvalidDefinition(format!("unexpected shape: {e}")))?;
    definition_from_doc(doc, id)
}

fn definition_from_doc(doc: DefinitionDoc, id: EntityId) -> SimResult<CustomApiDefinition> {
    let name = doc
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| SimError::InvalidDefinition("missing name".into()))?;
    let kind = match doc.kind.as_deref() {
        Some("bank")   => ProviderKind::Bank,
        Some("crypto") => ProviderKind::Crypto,
        Some(other) => {
            return Err(SimError::InvalidDefinition(format!("unknown type '{other}'")))
        }
        None => return Err(SimError::InvalidDefinition("missing type".into())),
    };
    let endpoints = doc
        .endpoints
        .ok_or_else(|| SimError::InvalidDefinition("missing endpoints".into()))?
        .into_iter()
        .map(|e| ApiEndpoint {
            name:          e.name,
            path:          e.path,
            method:        e.method.to_uppercase(),
            description:   e.description.unwrap_or_default(),
            request_body:  e.request_body.unwrap_or_default(),
            response_body: e.response_body.unwrap_or_default(),
        })
        .collect();

    Ok(CustomApiDefinition {
        id,
        description: doc.description.unwrap_or_else(|| format!("{name} API Simulator")),
        user_schema: doc.user_schema.unwrap_or_else(|| UserSchema::default_for(kind)),
        name,
        kind,
        endpoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_follows_keyword_priority() {
        assert_eq!(OperationKind::classify("Get Balance"), OperationKind::Balance);
        assert_eq!(OperationKind::classify("Send Transfer"), OperationKind::Transfer);
        assert_eq!(OperationKind::classify("DEPOSIT funds"), OperationKind::Deposit);
        assert_eq!(OperationKind::classify("Withdrawal"), OperationKind::Withdraw);
        assert_eq!(OperationKind::classify("Transactions"), OperationKind::History);
        assert_eq!(OperationKind::classify("Account history"), OperationKind::History);
        assert_eq!(OperationKind::classify("Close account"), OperationKind::Unknown);
    }

    #[test]
    fn first_keyword_wins_for_ambiguous_names() {
        assert_eq!(OperationKind::classify("Get Transfer History"), OperationKind::Balance);
        assert_eq!(OperationKind::classify("Get Transactions"), OperationKind::Balance);
        assert_eq!(OperationKind::classify("Transfer History"), OperationKind::Transfer);
        assert_eq!(OperationKind::classify("Deposit then withdraw"), OperationKind::Deposit);
        // "target" contains "get"
        assert_eq!(OperationKind::classify("Target deposit"), OperationKind::Balance);
    }

    #[test]
    fn missing_user_schema_falls_back_per_kind() {
        let doc = r#"{
            "name": "CoinHub",
            "type": "crypto",
            "endpoints": [{ "name": "Wallet Balance", "path": "/wallet", "method": "post" }]
        }"#;
        let def = parse_definition_json(doc, "def-1".into()).unwrap();
        assert_eq!(def.kind, ProviderKind::Crypto);
        assert_eq!(def.description, "CoinHub API Simulator");
        assert_eq!(def.endpoints[0].method, "POST");
        assert_eq!(def.user_schema.identifier_field, "walletAddress");
        assert_eq!(def.user_schema.balance_fields, vec!["BTC", "ETH", "USDT"]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let doc = r#"{ "name": "X", "type": "stocks", "endpoints": [] }"#;
        let err = parse_definition_json(doc, "def-2".into()).unwrap_err();
        assert!(matches!(err, SimError::InvalidDefinition(_)), "got {err}");
    }

    #[test]
    fn features_are_distinct_and_ordered() {
        let doc = r#"{
            "name": "OtherBank",
            "type": "bank",
            "endpoints": [
                { "name": "Transfer Money", "path": "/t", "method": "POST" },
                { "name": "Get Balance", "path": "/b", "method": "GET" },
                { "name": "Transfer History", "path": "/h", "method": "GET" }
            ]
        }"#;
        let def = parse_definition_json(doc, "def-3".into()).unwrap();
        assert_eq!(
            def.features(),
            vec!["Transfers", "Balance Queries", "Transaction History"]
        );
    }

    #[test]
    fn endpoint_lookup_prefers_path_then_name() {
        let doc = r#"{
            "name": "OtherBank",
            "type": "bank",
            "endpoints": [
                { "name": "Get Balance", "path": "/v1/balance", "method": "GET" },
                { "name": "/v1/balance", "path": "/v1/other", "method": "GET" }
            ]
        }"#;
        let def = parse_definition_json(doc, "def-4".into()).unwrap();
        assert_eq!(def.endpoint("/v1/balance").unwrap().name, "Get Balance");
        assert_eq!(def.endpoint("get balance").unwrap().path, "/v1/balance");
        assert!(def.endpoint("nope").is_none());
    }
}
