//! Fixed-schema simulator — the built-in bank and crypto APIs.
//!
//! Every public operation resolves the API key first, then validates its
//! arguments, then mutates. Every outcome leaves as an `ApiResponse`.
//!
//! Kind rules:
//!   - balance, transfer, deposit, withdraw      → bank simulations only
//!   - crypto_* operations                       → crypto simulations only
//!   - get_transaction_history                   → either kind
//! A key that resolves to the wrong kind is an invalid key.

use crate::{
    command::FixedEndpoint,
    error::{SimError, SimResult},
    ledger,
    model::{Account, Simulation},
    recorder::{to_data, ApiResponse, BankBalancePayload, CryptoBalancePayload},
    registry::SimulationRegistry,
    request::RequestBody,
    types::ProviderKind,
};
use serde_json::Value;

pub struct FixedSimulator<'r> {
    simulations: &'r mut SimulationRegistry,
}

impl<'r> FixedSimulator<'r> {
    pub fn new(simulations: &'r mut SimulationRegistry) -> Self {
        Self { simulations }
    }

    /// Resolve `api_key`, optionally insisting on a provider kind.
    fn resolve(&mut self, api_key: &str, kind: Option<ProviderKind>) -> SimResult<&mut Simulation> {
        let sim = self
            .simulations
            .by_key_mut(api_key)
            .ok_or(SimError::InvalidKey)?;
        match kind {
            Some(k) if sim.kind != k => Err(SimError::InvalidKey),
            _ => Ok(sim),
        }
    }

    // ── Bank ─────────────────────────────────────────────────────

    pub fn get_balance(&mut self, api_key: &str, user_id: &str) -> ApiResponse {
        let result = self.resolve(api_key, Some(ProviderKind::Bank)).and_then(|sim| {
            match sim.find_account(user_id) {
                Some(Account::Bank(a)) => to_data(&BankBalancePayload {
                    user_id:        a.id.clone(),
                    account_number: a.account_number.clone(),
                    balance:        a.balance,
                    currency:       a.currency,
                }),
                _ => Err(SimError::UserNotFound),
            }
        });
        ApiResponse::from_result("get_balance", result)
    }

    pub fn transfer(&mut self, api_key: &str, from_id: &str, to_id: &str, amount: f64) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Bank))
            .and_then(|sim| ledger::bank_transfer(sim, from_id, to_id, amount))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("transfer", result)
    }

    pub fn deposit(&mut self, api_key: &str, user_id: &str, amount: f64) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Bank))
            .and_then(|sim| ledger::bank_deposit(sim, user_id, amount))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("deposit", result)
    }

    pub fn withdraw(&mut self, api_key: &str, user_id: &str, amount: f64) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Bank))
            .and_then(|sim| ledger::bank_withdraw(sim, user_id, amount))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("withdraw", result)
    }

    // ── Either kind ──────────────────────────────────────────────

    pub fn get_transaction_history(&mut self, api_key: &str, user_id: &str) -> ApiResponse {
        let result = self
            .resolve(api_key, None)
            .and_then(|sim| ledger::history(sim, user_id))
            .and_then(|payload| to_data(&payload));
        ApiResponse::from_result("get_transaction_history", result)
    }

    // ── Crypto ───────────────────────────────────────────────────

    pub fn get_crypto_balance(&mut self, api_key: &str, user_id: &str) -> ApiResponse {
        let result = self.resolve(api_key, Some(ProviderKind::Crypto)).and_then(|sim| {
            match sim.find_account(user_id) {
                Some(Account::Crypto(a)) => to_data(&CryptoBalancePayload {
                    user_id:        a.id.clone(),
                    wallet_address: a.wallet_address.clone(),
                    balances:       a.balances.clone(),
                }),
                _ => Err(SimError::UserNotFound),
            }
        });
        ApiResponse::from_result("get_crypto_balance", result)
    }

    pub fn crypto_transfer(
        &mut self,
        api_key: &str,
        from_id: &str,
        to_id: &str,
        amount: f64,
        coin: &str,
    ) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Crypto))
            .and_then(|sim| ledger::coin_transfer(sim, from_id, to_id, amount, coin))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("crypto_transfer", result)
    }

    pub fn crypto_deposit(&mut self, api_key: &str, user_id: &str, amount: f64, coin: &str) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Crypto))
            .and_then(|sim| ledger::coin_deposit(sim, user_id, amount, coin))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("crypto_deposit", result)
    }

    pub fn crypto_withdraw(&mut self, api_key: &str, user_id: &str, amount: f64, coin: &str) -> ApiResponse {
        let result = self
            .resolve(api_key, Some(ProviderKind::Crypto))
            .and_then(|sim| ledger::coin_withdraw(sim, user_id, amount, coin))
            .and_then(|receipt| to_data(&receipt));
        ApiResponse::from_result("crypto_withdraw", result)
    }

    // ── Routing ──────────────────────────────────────────────────

    /// Execute a fixed endpoint with its arguments read from `body`.
    ///
    /// The key is checked before the body so an unknown key always reports
    /// as an invalid key, whatever the body holds.
    pub fn dispatch(&mut self, endpoint: FixedEndpoint, api_key: &str, body: &RequestBody) -> ApiResponse {
        let kind = match endpoint {
            FixedEndpoint::BankTransactions | FixedEndpoint::CryptoTransactions => None,
            other => Some(other.kind()),
        };
        if let Err(e) = self.resolve(api_key, kind) {
            return ApiResponse::from_result(endpoint.path(), Err(e));
        }
        match self.dispatch_with_body(endpoint, api_key, body) {
            Ok(response) => response,
            Err(e) => ApiResponse::from_result(endpoint.path(), Err::<Value, _>(e)),
        }
    }

    fn dispatch_with_body(
        &mut self,
        endpoint: FixedEndpoint,
        api_key: &str,
        body: &RequestBody,
    ) -> SimResult<ApiResponse> {
        let response = match endpoint {
            FixedEndpoint::BankBalance => {
                self.get_balance(api_key, &body.require_text("userId")?)
            }
            FixedEndpoint::BankTransfer => self.transfer(
                api_key,
                &body.require_text("fromUserId")?,
                &body.require_text("toUserId")?,
                body.amount()?,
            ),
            FixedEndpoint::BankDeposit => {
                self.deposit(api_key, &body.require_text("userId")?, body.amount()?)
            }
            FixedEndpoint::BankWithdraw => {
                self.withdraw(api_key, &body.require_text("userId")?, body.amount()?)
            }
            FixedEndpoint::BankTransactions | FixedEndpoint::CryptoTransactions => {
                self.get_transaction_history(api_key, &body.require_text("userId")?)
            }
            FixedEndpoint::CryptoBalance => {
                self.get_crypto_balance(api_key, &body.require_text("userId")?)
            }
            FixedEndpoint::CryptoTransfer => self.crypto_transfer(
                api_key,
                &body.require_text("fromUserId")?,
                &body.require_text("toUserId")?,
                body.amount()?,
                &body.require_text("coin")?,
            ),
            FixedEndpoint::CryptoDeposit => self.crypto_deposit(
                api_key,
                &body.require_text("userId")?,
                body.amount()?,
                &body.require_text("coin")?,
            ),
            FixedEndpoint::CryptoWithdraw => self.crypto_withdraw(
                api_key,
                &body.require_text("userId")?,
                body.amount()?,
                &body.require_text("coin")?,
            ),
        };
        Ok(response)
    }
}
