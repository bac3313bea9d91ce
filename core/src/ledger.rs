//! Balance mutations shared by both simulators.
//!
//! Each function validates first and mutates last: a rejected call leaves
//! every account and ledger exactly as it found them. Key resolution and
//! provider-kind checks happen in the callers.

use crate::{
    error::{SimError, SimResult},
    model::{Account, Simulation},
    recorder::{self, BalanceChangeReceipt, HistoryPayload, TransferReceipt},
    types::{TransactionKind, TransactionStatus},
};

/// Reject amounts that are not finite or are negative.
pub fn validate_amount(amount: f64) -> SimResult<f64> {
    if !amount.is_finite() {
        return Err(SimError::malformed("amount must be a finite number"));
    }
    if amount < 0.0 {
        return Err(SimError::malformed("amount must not be negative"));
    }
    Ok(amount)
}

fn validate_coin(coin: &str) -> SimResult<&str> {
    if coin.trim().is_empty() {
        return Err(SimError::malformed("coin must not be empty"));
    }
    Ok(coin)
}

fn transfer_indices(sim: &Simulation, from_id: &str, to_id: &str) -> SimResult<(usize, usize)> {
    match (sim.position_of(from_id), sim.position_of(to_id)) {
        (Some(from), Some(to)) => Ok((from, to)),
        _ => Err(SimError::UserNotFound),
    }
}

// ── Bank ─────────────────────────────────────────────────────────

pub fn bank_transfer(
    sim: &mut Simulation,
    from_id: &str,
    to_id: &str,
    amount: f64,
) -> SimResult<TransferReceipt> {
    let amount = validate_amount(amount)?;
    let (from, to) = transfer_indices(sim, from_id, to_id)?;

    let tx = match sim.pair_mut(from, to) {
        (Account::Bank(src), None) => {
            if src.balance < amount {
                return Err(SimError::InsufficientFunds);
            }
            let tx = recorder::new_transaction(
                TransactionKind::Transfer,
                amount,
                src.currency.as_str(),
                Some(&src.account_number),
                Some(&src.account_number),
            );
            recorder::record(&tx, [&mut src.transactions]);
            tx
        }
        (Account::Bank(src), Some(Account::Bank(dst))) => {
            if src.balance < amount {
                return Err(SimError::InsufficientFunds);
            }
            if src.currency != dst.currency {
                return Err(SimError::CurrencyMismatch);
            }
            let tx = recorder::new_transaction(
                TransactionKind::Transfer,
                amount,
                src.currency.as_str(),
                Some(&src.account_number),
                Some(&dst.account_number),
            );
            src.balance -= amount;
            dst.balance += amount;
            recorder::record(&tx, [&mut src.transactions, &mut dst.transactions]);
            tx
        }
        _ => return Err(SimError::UserNotFound),
    };

    log::info!(
        "sim={} bank transfer {} {} from {from_id} to {to_id}",
        sim.id, tx.amount, tx.currency
    );
    Ok(TransferReceipt {
        transaction_id: tx.id,
        from:           tx.from.unwrap_or_default(),
        to:             tx.to.unwrap_or_default(),
        amount,
        currency:       Some(tx.currency),
        coin:           None,
        status:         TransactionStatus::Success,
    })
}

pub fn bank_deposit(sim: &mut Simulation, user_id: &str, amount: f64) -> SimResult<BalanceChangeReceipt> {
    let amount = validate_amount(amount)?;
    let Some(Account::Bank(account)) = sim.find_account_mut(user_id) else {
        return Err(SimError::UserNotFound);
    };

    let tx = recorder::new_transaction(
        TransactionKind::Deposit,
        amount,
        account.currency.as_str(),
        None,
        Some(&account.account_number),
    );
    account.balance += amount;
    recorder::record(&tx, [&mut account.transactions]);

    log::info!("bank deposit {amount} {} to {user_id}", account.currency);
    Ok(BalanceChangeReceipt {
        transaction_id: tx.id,
        new_balance:    account.balance,
        currency:       Some(account.currency.as_str().to_string()),
        coin:           None,
    })
}

pub fn bank_withdraw(sim: &mut Simulation, user_id: &str, amount: f64) -> SimResult<BalanceChangeReceipt> {
    let amount = validate_amount(amount)?;
    let Some(Account::Bank(account)) = sim.find_account_mut(user_id) else {
        return Err(SimError::UserNotFound);
    };
    if account.balance < amount {
        return Err(SimError::InsufficientFunds);
    }

    let tx = recorder::new_transaction(
        TransactionKind::Withdrawal,
        amount,
        account.currency.as_str(),
        Some(&account.account_number),
        None,
    );
    account.balance -= amount;
    recorder::record(&tx, [&mut account.transactions]);

    log::info!("bank withdrawal {amount} {} from {user_id}", account.currency);
    Ok(BalanceChangeReceipt {
        transaction_id: tx.id,
        new_balance:    account.balance,
        currency:       Some(account.currency.as_str().to_string()),
        coin:           None,
    })
}

// ── Crypto ───────────────────────────────────────────────────────

pub fn coin_transfer(
    sim: &mut Simulation,
    from_id: &str,
    to_id: &str,
    amount: f64,
    coin: &str,
) -> SimResult<TransferReceipt> {
    let amount = validate_amount(amount)?;
    let coin = validate_coin(coin)?;
    let (from, to) = transfer_indices(sim, from_id, to_id)?;

    let tx = match sim.pair_mut(from, to) {
        (Account::Crypto(src), None) => {
            if src.coin_balance(coin) < amount {
                return Err(SimError::InsufficientFunds);
            }
            let tx = recorder::new_transaction(
                TransactionKind::Transfer,
                amount,
                coin,
                Some(&src.wallet_address),
                Some(&src.wallet_address),
            );
            recorder::record(&tx, [&mut src.transactions]);
            tx
        }
        (Account::Crypto(src), Some(Account::Crypto(dst))) => {
            let available = src.coin_balance(coin);
            if available < amount {
                return Err(SimError::InsufficientFunds);
            }
            let tx = recorder::new_transaction(
                TransactionKind::Transfer,
                amount,
                coin,
                Some(&src.wallet_address),
                Some(&dst.wallet_address),
            );
            src.balances.insert(coin.to_string(), available - amount);
            *dst.balances.entry(coin.to_string()).or_insert(0.0) += amount;
            recorder::record(&tx, [&mut src.transactions, &mut dst.transactions]);
            tx
        }
        _ => return Err(SimError::UserNotFound),
    };

    log::info!("sim={} crypto transfer {amount} {coin} from {from_id} to {to_id}", sim.id);
    Ok(TransferReceipt {
        transaction_id: tx.id,
        from:           tx.from.unwrap_or_default(),
        to:             tx.to.unwrap_or_default(),
        amount,
        currency:       None,
        coin:           Some(coin.to_string()),
        status:         TransactionStatus::Success,
    })
}

pub fn coin_deposit(
    sim: &mut Simulation,
    user_id: &str,
    amount: f64,
    coin: &str,
) -> SimResult<BalanceChangeReceipt> {
    let amount = validate_amount(amount)?;
    let coin = validate_coin(coin)?;
    let Some(Account::Crypto(account)) = sim.find_account_mut(user_id) else {
        return Err(SimError::UserNotFound);
    };

    let tx = recorder::new_transaction(
        TransactionKind::Deposit,
        amount,
        coin,
        None,
        Some(&account.wallet_address),
    );
    let balance = account.balances.entry(coin.to_string()).or_insert(0.0);
    *balance += amount;
    let new_balance = *balance;
    recorder::record(&tx, [&mut account.transactions]);

    log::info!("crypto deposit {amount} {coin} to {user_id}");
    Ok(BalanceChangeReceipt {
        transaction_id: tx.id,
        new_balance,
        currency:       None,
        coin:           Some(coin.to_string()),
    })
}

pub fn coin_withdraw(
    sim: &mut Simulation,
    user_id: &str,
    amount: f64,
    coin: &str,
) -> SimResult<BalanceChangeReceipt> {
    let amount = validate_amount(amount)?;
    let coin = validate_coin(coin)?;
    let Some(Account::Crypto(account)) = sim.find_account_mut(user_id) else {
        return Err(SimError::UserNotFound);
    };
    let available = account.coin_balance(coin);
    if available < amount {
        return Err(SimError::InsufficientFunds);
    }

    let tx = recorder::new_transaction(
        TransactionKind::Withdrawal,
        amount,
        coin,
        Some(&account.wallet_address),
        None,
    );
    let new_balance = available - amount;
    account.balances.insert(coin.to_string(), new_balance);
    recorder::record(&tx, [&mut account.transactions]);

    log::info!("crypto withdrawal {amount} {coin} from {user_id}");
    Ok(BalanceChangeReceipt {
        transaction_id: tx.id,
        new_balance,
        currency:       None,
        coin:           Some(coin.to_string()),
    })
}

// ── Either kind ──────────────────────────────────────────────────

/// Full ledger in append order. Sorting is the caller's business.
pub fn history(sim: &Simulation, user_id: &str) -> SimResult<HistoryPayload> {
    let account = sim.find_account(user_id).ok_or(SimError::UserNotFound)?;
    Ok(HistoryPayload {
        transactions: account.transactions().to_vec(),
    })
}
