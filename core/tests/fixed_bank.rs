//! Built-in bank API: balances, transfers, deposits, withdrawals, history.
//!
//! Session: `SessionConfig::default_test()`.
//!   sk_test_bank → alice 100 USD, bob 0 USD, carol 50 EUR

use apisim_core::{
    engine::ApiEngine,
    model::{Account, BankAccount},
    types::{TransactionKind, TransactionStatus},
};

const KEY: &str = "sk_test_bank";

fn build() -> ApiEngine {
    let _ = env_logger::builder().is_test(true).try_init();
    ApiEngine::build_test(7).expect("test engine")
}

fn bank(engine: &ApiEngine, user_id: &str) -> BankAccount {
    match engine
        .simulations
        .by_key(KEY)
        .and_then(|s| s.find_account(user_id))
    {
        Some(Account::Bank(a)) => a.clone(),
        other => panic!("expected bank account {user_id}, got {other:?}"),
    }
}

#[test]
fn transfer_moves_funds_and_shares_one_record() {
    let mut engine = build();

    let resp = engine.fixed().transfer(KEY, "alice", "bob", 40.0);
    assert!(resp.success, "transfer failed: {:?}", resp.error);
    assert_eq!(resp.field("amount").and_then(|v| v.as_f64()), Some(40.0));
    assert_eq!(resp.field("currency").and_then(|v| v.as_str()), Some("USD"));
    assert_eq!(resp.field("status").and_then(|v| v.as_str()), Some("success"));

    let alice = bank(&engine, "alice");
    let bob = bank(&engine, "bob");
    assert_eq!(alice.balance, 60.0);
    assert_eq!(bob.balance, 40.0);

    assert_eq!(alice.transactions.len(), 1);
    assert_eq!(bob.transactions.len(), 1);
    let tx = &alice.transactions[0];
    assert_eq!(tx, &bob.transactions[0], "Both sides must hold the same record");
    assert_eq!(tx.kind, TransactionKind::Transfer);
    assert_eq!(tx.amount, 40.0);
    assert_eq!(tx.currency, "USD");
    assert_eq!(tx.status, TransactionStatus::Success);
    assert_eq!(tx.from.as_deref(), Some(alice.account_number.as_str()));
    assert_eq!(tx.to.as_deref(), Some(bob.account_number.as_str()));
    assert_eq!(
        resp.field("transactionId").and_then(|v| v.as_str()),
        Some(tx.id.as_str())
    );
}

#[test]
fn overdrawn_withdrawal_is_rejected_without_mutation() {
    let mut engine = build();
    assert!(engine.fixed().transfer(KEY, "alice", "bob", 40.0).success);

    let resp = engine.fixed().withdraw(KEY, "alice", 1000.0);
    assert!(!resp.success);
    assert_eq!(resp.error.as_deref(), Some("Insufficient funds"));

    let alice = bank(&engine, "alice");
    assert_eq!(alice.balance, 60.0, "Balance must be unchanged");
    assert_eq!(alice.transactions.len(), 1, "No transaction may be appended");
}

#[test]
fn overdrawn_transfer_mutates_neither_side() {
    let mut engine = build();
    let resp = engine.fixed().transfer(KEY, "bob", "alice", 0.01);
    assert_eq!(resp.error.as_deref(), Some("Insufficient funds"));
    assert_eq!(bank(&engine, "alice").balance, 100.0);
    assert_eq!(bank(&engine, "bob").balance, 0.0);
    assert!(bank(&engine, "alice").transactions.is_empty());
}

#[test]
fn transfer_across_currencies_is_a_mismatch() {
    let mut engine = build();
    let resp = engine.fixed().transfer(KEY, "alice", "carol", 10.0);
    assert_eq!(resp.error.as_deref(), Some("Currency mismatch"));
    assert_eq!(bank(&engine, "alice").balance, 100.0);
    assert_eq!(bank(&engine, "carol").balance, 50.0);
    assert!(bank(&engine, "carol").transactions.is_empty());
}

#[test]
fn funds_are_checked_before_currency() {
    let mut engine = build();
    // bob has 0 USD, carol holds EUR: both checks would fail.
    let resp = engine.fixed().transfer(KEY, "bob", "carol", 10.0);
    assert_eq!(resp.error.as_deref(), Some("Insufficient funds"));
}

#[test]
fn unknown_users_are_reported_before_funds() {
    let mut engine = build();
    let resp = engine.fixed().transfer(KEY, "bob", "nobody", 1_000.0);
    assert_eq!(resp.error.as_deref(), Some("User not found"));
    let resp = engine.fixed().transfer(KEY, "nobody", "alice", 1.0);
    assert_eq!(resp.error.as_deref(), Some("User not found"));
    let resp = engine.fixed().get_balance(KEY, "nobody");
    assert_eq!(resp.error.as_deref(), Some("User not found"));
}

#[test]
fn invalid_key_fails_every_operation() {
    let mut engine = build();
    let mut fixed = engine.fixed();
    let responses = [
        fixed.get_balance("sk_nope", "alice"),
        fixed.transfer("sk_nope", "alice", "bob", 1.0),
        fixed.deposit("sk_nope", "alice", 1.0),
        fixed.withdraw("sk_nope", "alice", 1.0),
        fixed.get_transaction_history("sk_nope", "alice"),
        fixed.get_crypto_balance("sk_nope", "satoshi"),
        fixed.crypto_transfer("sk_nope", "satoshi", "vitalik", 0.1, "BTC"),
        fixed.crypto_deposit("sk_nope", "satoshi", 0.1, "BTC"),
        fixed.crypto_withdraw("sk_nope", "satoshi", 0.1, "BTC"),
        // Malformed arguments do not change the answer.
        fixed.transfer("sk_nope", "", "", -5.0),
    ];
    for resp in responses {
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
        assert!(resp.data.is_none());
        assert_eq!(resp.status_code(), 400);
    }
}

#[test]
fn crypto_key_is_invalid_for_bank_operations() {
    let mut engine = build();
    let resp = engine.fixed().get_balance("sk_test_crypto", "satoshi");
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
    let resp = engine.fixed().deposit("sk_test_crypto", "satoshi", 1.0);
    assert_eq!(resp.error.as_deref(), Some("Invalid API key"));
}

#[test]
fn deposits_and_withdrawals_are_conserved() {
    let mut engine = build();
    let deposits = [25.0, 10.5, 4.5];
    let withdrawals = [30.0, 60.0];

    for amount in deposits {
        assert!(engine.fixed().deposit(KEY, "alice", amount).success);
    }
    for amount in withdrawals {
        assert!(engine.fixed().withdraw(KEY, "alice", amount).success);
    }

    let expected = 100.0 + deposits.iter().sum::<f64>() - withdrawals.iter().sum::<f64>();
    let alice = bank(&engine, "alice");
    assert!((alice.balance - expected).abs() < 1e-9, "{} != {expected}", alice.balance);
    assert!(alice.balance >= 0.0);

    let resp = engine.fixed().withdraw(KEY, "alice", alice.balance);
    assert!(resp.success);
    assert_eq!(resp.field("newBalance").and_then(|v| v.as_f64()), Some(0.0));
}

#[test]
fn deposit_reports_new_balance_and_destination_only() {
    let mut engine = build();
    let resp = engine.fixed().deposit(KEY, "bob", 12.5);
    assert!(resp.success);
    assert_eq!(resp.field("newBalance").and_then(|v| v.as_f64()), Some(12.5));
    assert_eq!(resp.field("currency").and_then(|v| v.as_str()), Some("USD"));

    let bob = bank(&engine, "bob");
    let tx = &bob.transactions[0];
    assert_eq!(tx.kind, TransactionKind::Deposit);
    assert!(tx.from.is_none());
    assert_eq!(tx.to.as_deref(), Some(bob.account_number.as_str()));
}

#[test]
fn history_lists_every_operation_in_order() {
    let mut engine = build();
    assert!(engine.fixed().deposit(KEY, "alice", 5.0).success);
    assert!(engine.fixed().transfer(KEY, "alice", "bob", 20.0).success);
    assert!(engine.fixed().withdraw(KEY, "alice", 3.0).success);
    assert!(!engine.fixed().withdraw(KEY, "alice", 500.0).success);

    let resp = engine.fixed().get_transaction_history(KEY, "alice");
    assert!(resp.success);
    let txs = resp
        .field("transactions")
        .and_then(|v| v.as_array())
        .expect("transactions array");
    assert_eq!(txs.len(), 3, "Failed attempts never produce records");

    let kinds: Vec<&str> = txs.iter().filter_map(|t| t["type"].as_str()).collect();
    assert_eq!(kinds, ["deposit", "transfer", "withdrawal"]);
    let amounts: Vec<f64> = txs.iter().filter_map(|t| t["amount"].as_f64()).collect();
    assert_eq!(amounts, [5.0, 20.0, 3.0]);

    let bob_history = engine.fixed().get_transaction_history(KEY, "bob");
    let bob_txs = bob_history.field("transactions").and_then(|v| v.as_array()).expect("array");
    assert_eq!(bob_txs.len(), 1);
}

#[test]
fn bad_amounts_are_malformed_input() {
    let mut engine = build();
    for amount in [-1.0, f64::NAN, f64::INFINITY] {
        let resp = engine.fixed().deposit(KEY, "alice", amount);
        assert!(!resp.success);
        let error = resp.error.unwrap_or_default();
        assert!(error.starts_with("Malformed input"), "{error}");
    }
    let resp = engine.fixed().transfer(KEY, "alice", "bob", -40.0);
    assert!(resp.error.unwrap_or_default().starts_with("Malformed input"));
    assert_eq!(bank(&engine, "alice").balance, 100.0);
    assert_eq!(bank(&engine, "bob").balance, 0.0);
}

#[test]
fn self_transfer_keeps_balance_and_records_once() {
    let mut engine = build();
    let resp = engine.fixed().transfer(KEY, "alice", "alice", 30.0);
    assert!(resp.success);
    let alice = bank(&engine, "alice");
    assert_eq!(alice.balance, 100.0);
    assert_eq!(alice.transactions.len(), 1);
}

#[test]
fn balance_reports_account_details() {
    let mut engine = build();
    let resp = engine.fixed().get_balance(KEY, "carol");
    assert!(resp.success);
    let carol = bank(&engine, "carol");
    assert_eq!(resp.field("userId").and_then(|v| v.as_str()), Some("carol"));
    assert_eq!(
        resp.field("accountNumber").and_then(|v| v.as_str()),
        Some(carol.account_number.as_str())
    );
    assert_eq!(resp.field("balance").and_then(|v| v.as_f64()), Some(50.0));
    assert_eq!(resp.field("currency").and_then(|v| v.as_str()), Some("EUR"));
    assert_eq!(carol.account_number.len(), 16);
}
