//! Dynamic-schema simulator — runs calls against a user-registered
//! provider schema.
//!
//! The simulation is found by API key, its provider name selects the
//! registered definition, and the caller-chosen endpoint is classified once
//! into an `OperationKind`. Field names for the account id, the display
//! identifier and the balance(s) come from the definition's user schema.
//!
//! Body fields read:
//!   - account id:       `<idField>` (transfers: `fromUserId`/`from`, `toUserId`/`to`)
//!   - amount:           `amount`
//!   - coin (crypto):    `coin`, else `currency`, else BTC

use crate::{
    error::{SimError, SimResult},
    ledger,
    model::{Account, Simulation},
    recorder::{to_data, ApiResponse},
    registry::{SchemaRegistry, SimulationRegistry},
    request::RequestBody,
    schema::{ApiEndpoint, OperationKind, UserSchema},
    types::{ProviderKind, FALLBACK_COIN},
};
use serde_json::{Map, Value};

pub struct DynamicSimulator<'r> {
    simulations: &'r mut SimulationRegistry,
    schemas:     &'r SchemaRegistry,
}

impl<'r> DynamicSimulator<'r> {
    pub fn new(simulations: &'r mut SimulationRegistry, schemas: &'r SchemaRegistry) -> Self {
        Self { simulations, schemas }
    }

    /// Execute `endpoint` of the simulation's custom API with `body`.
    pub fn execute(&mut self, endpoint: &ApiEndpoint, body: &RequestBody, api_key: &str) -> ApiResponse {
        let result = self.try_execute(endpoint, body, api_key);
        ApiResponse::from_result(&endpoint.name, result)
    }

    fn try_execute(&mut self, endpoint: &ApiEndpoint, body: &RequestBody, api_key: &str) -> SimResult<Value> {
        let sim = self
            .simulations
            .by_key_mut(api_key)
            .ok_or(SimError::InvalidKey)?;
        let definition = self
            .schemas
            .get(&sim.provider)
            .ok_or(SimError::DefinitionNotFound)?;
        let schema = &definition.user_schema;

        let operation = endpoint.operation();
        log::debug!(
            "sim={} provider={} endpoint '{}' classified as {operation:?}",
            sim.id, sim.provider, endpoint.name
        );

        match operation {
            OperationKind::Balance  => balance(sim, schema, body),
            OperationKind::Transfer => transfer(sim, body),
            OperationKind::Deposit  => deposit(sim, schema, body),
            OperationKind::Withdraw => withdraw(sim, schema, body),
            OperationKind::History  => {
                let user_id = body.require_text(&schema.id_field)?;
                to_data(&ledger::history(sim, &user_id)?)
            }
            OperationKind::Unknown  => Err(SimError::EndpointNotImplemented),
        }
    }
}

fn coin_of(body: &RequestBody) -> String {
    body.coin().unwrap_or_else(|| FALLBACK_COIN.to_string())
}

fn balance(sim: &Simulation, schema: &UserSchema, body: &RequestBody) -> SimResult<Value> {
    let user_id = body.require_text(&schema.id_field)?;
    let account = sim.find_account(&user_id).ok_or(SimError::UserNotFound)?;

    let mut data = Map::new();
    data.insert(schema.id_field.clone(), Value::from(account.id()));
    data.insert(
        schema.identifier_field.clone(),
        Value::from(account.display_identifier()),
    );
    match account {
        Account::Bank(a) => {
            data.insert("balance".into(), Value::from(a.balance));
            data.insert("currency".into(), Value::from(a.currency.as_str()));
        }
        Account::Crypto(a) => {
            // Every held coin, plus the schema's coins at zero when never credited.
            let mut balances: Map<String, Value> = a
                .balances
                .iter()
                .map(|(coin, v)| (coin.clone(), Value::from(*v)))
                .collect();
            for coin in &schema.balance_fields {
                balances
                    .entry(coin.clone())
                    .or_insert_with(|| Value::from(0.0));
            }
            data.insert("balances".into(), Value::Object(balances));
        }
    }
    Ok(Value::Object(data))
}

fn transfer(sim: &mut Simulation, body: &RequestBody) -> SimResult<Value> {
    let from_id = body
        .text_any(&["fromUserId", "from"])
        .ok_or_else(|| SimError::malformed("missing field 'fromUserId'"))?;
    let to_id = body
        .text_any(&["toUserId", "to"])
        .ok_or_else(|| SimError::malformed("missing field 'toUserId'"))?;
    let amount = body.amount()?;

    let receipt = match sim.kind {
        ProviderKind::Bank => ledger::bank_transfer(sim, &from_id, &to_id, amount)?,
        ProviderKind::Crypto => {
            ledger::coin_transfer(sim, &from_id, &to_id, amount, &coin_of(body))?
        }
    };
    to_data(&receipt)
}

fn deposit(sim: &mut Simulation, schema: &UserSchema, body: &RequestBody) -> SimResult<Value> {
    let user_id = body.require_text(&schema.id_field)?;
    let amount = body.amount()?;
    let receipt = match sim.kind {
        ProviderKind::Bank => ledger::bank_deposit(sim, &user_id, amount)?,
        ProviderKind::Crypto => {
            ledger::coin_deposit(sim, &user_id, amount, &coin_of(body))?
        }
    };
    to_data(&receipt)
}

fn withdraw(sim: &mut Simulation, schema: &UserSchema, body: &RequestBody) -> SimResult<Value> {
    let user_id = body.require_text(&schema.id_field)?;
    let amount = body.amount()?;
    let receipt = match sim.kind {
        ProviderKind::Bank => ledger::bank_withdraw(sim, &user_id, amount)?,
        ProviderKind::Crypto => {
            ledger::coin_withdraw(sim, &user_id, amount, &coin_of(body))?
        }
    };
    to_data(&receipt)
}
