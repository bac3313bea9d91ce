//! Engine facade: request routing, simulation lifecycle, account opening.

use apisim_core::{
    command::{ApiRequest, FixedEndpoint},
    config::SessionConfig,
    engine::{ApiEngine, Opening},
    error::SimError,
    request::RequestBody,
    store::RequestStore,
    types::{Currency, ProviderKind},
};
use serde_json::json;
use std::collections::BTreeMap;

fn build() -> ApiEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ApiEngine::build_test(7).expect("test engine")
}

fn body(value: serde_json::Value) -> RequestBody {
    RequestBody::from_value(value).expect("object body")
}

#[test]
fn fixed_paths_route_to_the_builtin_api() {
    let mut engine = build();
    let resp = engine.send(&ApiRequest::new(
        "sk_test_bank",
        "/api/bank/transfer",
        body(json!({ "fromUserId": "alice", "toUserId": "bob", "amount": 40 })),
    ));
    assert!(resp.success, "{:?}", resp.error);

    let resp = engine.send(&ApiRequest::new(
        "sk_test_bank",
        "/api/bank/balance/",
        body(json!({ "userId": "alice" })),
    ));
    assert_eq!(resp.field("balance").and_then(|v| v.as_f64()), Some(60.0));

    let resp = engine.send(&ApiRequest::new(
        "sk_test_crypto",
        "/api/crypto/transactions",
        body(json!({ "userId": "satoshi" })),
    ));
    assert!(resp.success);
}

#[test]
fn unknown_key_wins_over_everything() {
    let mut engine = build();
    let resp = engine.send(&ApiRequest::new("sk_missing", "/nowhere", RequestBody::new()));
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
}

#[test]
fn unknown_fixed_path_is_not_implemented() {
    let mut engine = build();
    let resp = engine.send(&ApiRequest::new(
        "sk_test_bank",
        "/api/bank/close",
        body(json!({ "userId": "alice" })),
    ));
    assert_eq!(resp.error.as_deref(), Some("Endpoint not implemented"));
}

#[test]
fn fixed_path_of_the_other_kind_is_an_invalid_key() {
    let mut engine = build();
    let resp = engine.send(&ApiRequest::new(
        "sk_test_bank",
        "/api/crypto/balance",
        body(json!({ "userId": "alice" })),
    ));
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
}

#[test]
fn missing_body_fields_are_malformed() {
    let mut engine = build();
    let resp = engine.send(&ApiRequest::new(
        "sk_test_bank",
        "/api/bank/deposit",
        body(json!({ "userId": "alice", "amount": "40" })),
    ));
    assert!(resp.error.unwrap_or_default().starts_with("Malformed input"));

    let resp = engine.send(&ApiRequest::new(
        "sk_test_crypto",
        "/api/crypto/deposit",
        body(json!({ "userId": "satoshi", "amount": 1 })),
    ));
    assert!(resp.error.unwrap_or_default().contains("coin"));
}

#[test]
fn every_preset_sample_body_is_accepted_by_its_kind() {
    let mut engine = build();
    for kind in [ProviderKind::Bank, ProviderKind::Crypto] {
        let (key, user) = match kind {
            ProviderKind::Bank => ("sk_test_bank", "alice"),
            ProviderKind::Crypto => ("sk_test_crypto", "satoshi"),
        };
        for endpoint in FixedEndpoint::presets(kind) {
            assert_eq!(endpoint.kind(), kind);
            let sample = endpoint.sample_body();
            let user_field = if sample.get("fromUserId").is_some() { "fromUserId" } else { "userId" };
            let mut request_body = sample.with(user_field, user);
            if request_body.get("toUserId").is_some() {
                request_body = request_body.with("toUserId", user);
            }
            let resp = engine.send(&ApiRequest::new(key, endpoint.path(), request_body));
            assert!(resp.success, "{} failed: {:?}", endpoint.path(), resp.error);
        }
    }
}

#[test]
fn simulations_can_be_created_and_deleted() {
    let mut engine = build();
    let before = engine.simulations.len();

    let (id, key) = {
        let sim = engine.create_simulation("Sandbox", ProviderKind::Bank, "TBC Bank");
        (sim.id.clone(), sim.api_key.clone())
    };
    assert!(key.starts_with("sk_test_"));
    assert_eq!(key.len(), "sk_test_".len() + 32);
    assert_eq!(id.len(), 9);
    assert_eq!(engine.simulations.len(), before + 1);

    let user = engine
        .open_account(&id, "zoe", Opening::Bank { balance: 10.0, currency: Currency::GEL })
        .expect("open");
    let resp = engine.fixed().get_balance(&key, &user);
    assert_eq!(resp.field("currency").and_then(|v| v.as_str()), Some("GEL"));

    assert!(engine.delete_simulation(&id));
    assert!(!engine.delete_simulation(&id));
    let resp = engine.fixed().get_balance(&key, &user);
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"), "Deleted key must stop resolving");
}

#[test]
fn opening_the_wrong_kind_is_rejected() {
    let mut engine = build();
    let sim_id = engine.simulations.by_key("sk_test_bank").expect("sim").id.clone();

    let err = engine
        .open_account(&sim_id, "mallory", Opening::Crypto { balances: BTreeMap::new() })
        .expect_err("crypto account in a bank simulation");
    assert!(matches!(
        err,
        SimError::ProviderKindMismatch { simulation: ProviderKind::Bank, account: ProviderKind::Crypto }
    ));

    let err = engine
        .open_account("nope", "x", Opening::Bank { balance: 0.0, currency: Currency::USD })
        .expect_err("unknown simulation");
    assert!(matches!(err, SimError::SimulationNotFound { .. }));

    let err = engine
        .open_account(&sim_id, "y", Opening::Bank { balance: -1.0, currency: Currency::USD })
        .expect_err("negative opening balance");
    assert!(matches!(err, SimError::MalformedInput(_)));
}

#[test]
fn populate_generates_usable_accounts() {
    let mut engine = build();
    let sim_id = engine.simulations.by_key("sk_test_crypto").expect("sim").id.clone();
    let ids = engine.populate(&sim_id, 5).expect("populate");
    assert_eq!(ids.len(), 5);

    let sim = engine.simulations.by_id(&sim_id).expect("sim");
    assert_eq!(sim.accounts().len(), 7);
    for id in &ids {
        let account = sim.find_account(id).expect("generated account");
        assert_eq!(account.kind(), ProviderKind::Crypto);
        assert!(account.username().contains('_'));
        assert!(account.display_identifier().starts_with("0x"));
    }

    let resp = engine.fixed().get_crypto_balance("sk_test_crypto", &ids[0]);
    assert!(resp.success);
}

#[test]
fn same_seed_builds_the_same_session() {
    let config = SessionConfig {
        seed: 1234,
        simulations: serde_json::from_value(json!([
            { "name": "Gen", "type": "bank", "provider": "TBC Bank", "synthetic": 4 }
        ]))
        .expect("seeds"),
        custom_apis: Vec::new(),
    };
    let build_with = |config: &SessionConfig| {
        let store = RequestStore::in_memory().expect("store");
        store.migrate().expect("migrate");
        ApiEngine::build(config, store).expect("engine")
    };

    let a = build_with(&config);
    let b = build_with(&config);
    let (sa, sb) = (
        a.simulations.iter().next().expect("sim"),
        b.simulations.iter().next().expect("sim"),
    );
    assert_eq!(sa.api_key, sb.api_key);
    assert_eq!(sa.accounts(), sb.accounts());

    let other = build_with(&SessionConfig { seed: 99, ..config.clone() });
    let so = other.simulations.iter().next().expect("sim");
    assert_ne!(sa.api_key, so.api_key, "Seed must change generated keys");
}

#[test]
fn refreshed_registry_is_what_routing_sees() {
    let mut engine = build();
    engine.refresh_simulations(Vec::new());
    let resp = engine.fixed().get_balance("sk_test_bank", "alice");
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
}

#[test]
fn duplicate_api_keys_are_rejected() {
    let mut engine = build();
    let before = engine.simulations.len();
    let err = engine
        .create_simulation_with_key("Copy", ProviderKind::Bank, "TBC Bank", "sk_test_bank".into())
        .expect_err("key already taken");
    assert!(matches!(err, SimError::DuplicateApiKey { ref api_key } if api_key == "sk_test_bank"));
    assert_eq!(engine.simulations.len(), before);

    let sim = engine
        .create_simulation_with_key("Fresh", ProviderKind::Bank, "TBC Bank", "sk_test_fresh".into())
        .expect("unused key");
    assert_eq!(sim.api_key, "sk_test_fresh");
}

#[test]
fn config_with_a_repeated_key_fails_to_build() {
    let config = SessionConfig {
        seed: 1,
        simulations: serde_json::from_value(json!([
            { "name": "A", "type": "bank", "provider": "TBC Bank", "apiKey": "sk_same" },
            { "name": "B", "type": "crypto", "provider": "Hinkal", "apiKey": "sk_same" }
        ]))
        .expect("seeds"),
        custom_apis: Vec::new(),
    };
    let store = RequestStore::in_memory().expect("store");
    store.migrate().expect("migrate");
    let err = ApiEngine::build(&config, store).err().expect("duplicate key");
    assert!(matches!(err, SimError::DuplicateApiKey { .. }), "got {err}");
}
