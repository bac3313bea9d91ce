//! The session engine — owns every table a session needs and routes
//! submitted requests to the right simulator.
//!
//! ROUTING (per request):
//!   1. Resolve the API key. Unknown key → invalid key, nothing else runs.
//!   2. Provider has a registered custom definition → dynamic simulator,
//!      endpoint looked up in that definition by path, then by name.
//!   3. Otherwise → fixed simulator, endpoint parsed as a built-in path.
//!   4. Log the request and its reply.
//!
//! RULES:
//!   - Balances change only inside the simulators; the engine opens accounts.
//!   - Registries are refreshed through the engine, never behind its back.
//!   - A failing log write never changes the reply the caller gets.

use crate::{
    command::{ApiRequest, FixedEndpoint},
    config::SessionConfig,
    dynamic_simulator::DynamicSimulator,
    error::{SimError, SimResult},
    fixed_simulator::FixedSimulator,
    ledger,
    model::{Account, BankAccount, CryptoAccount, Simulation},
    name_generator::NameGenerator,
    recorder::ApiResponse,
    registry::{SchemaRegistry, SimulationRegistry},
    rng::IdGenerator,
    schema::{self, CustomApiDefinition},
    store::{RequestLogEntry, RequestStore},
    types::{ApiKey, Currency, EntityId, ProviderKind, DEFAULT_COINS},
};
use chrono::Utc;
use serde_json::Value;
use std::{collections::BTreeMap, time::Instant};
use uuid::Uuid;

/// Opening position of a new account.
#[derive(Debug, Clone, PartialEq)]
pub enum Opening {
    Bank { balance: f64, currency: Currency },
    Crypto { balances: BTreeMap<String, f64> },
}

impl Opening {
    fn kind(&self) -> ProviderKind {
        match self {
            Opening::Bank { .. }   => ProviderKind::Bank,
            Opening::Crypto { .. } => ProviderKind::Crypto,
        }
    }
}

pub struct ApiEngine {
    pub simulations: SimulationRegistry,
    pub schemas:     SchemaRegistry,
    pub store:       RequestStore,
    ids:             IdGenerator,
    seed:            u64,
}

impl ApiEngine {
    pub fn new(seed: u64, store: RequestStore) -> Self {
        Self {
            simulations: SimulationRegistry::new(),
            schemas:     SchemaRegistry::new(),
            store,
            ids:         IdGenerator::new(seed),
            seed,
        }
    }

    /// Build an engine with every simulation, account and custom API the
    /// config names already in place.
    pub fn build(config: &SessionConfig, store: RequestStore) -> SimResult<Self> {
        let mut engine = ApiEngine::new(config.seed, store);

        for doc in &config.custom_apis {
            let id = engine.ids.id();
            let definition = schema::definition_from_value(doc.clone(), id)?;
            engine.register_custom_api(definition);
        }

        for seed in &config.simulations {
            let sim_id = match &seed.api_key {
                Some(key) => engine
                    .create_simulation_with_key(&seed.name, seed.kind, &seed.provider, key.clone())?
                    .id
                    .clone(),
                None => engine
                    .create_simulation(&seed.name, seed.kind, &seed.provider)
                    .id
                    .clone(),
            };
            for account in &seed.accounts {
                let opening = match seed.kind {
                    ProviderKind::Bank => Opening::Bank {
                        balance:  account.balance,
                        currency: account.currency.unwrap_or(Currency::USD),
                    },
                    ProviderKind::Crypto => Opening::Crypto {
                        balances: account.balances.clone(),
                    },
                };
                let id = account.id.clone().unwrap_or_else(|| engine.ids.id());
                engine.insert_account(&sim_id, id, &account.username, opening)?;
            }
            if seed.synthetic > 0 {
                engine.populate(&sim_id, seed.synthetic)?;
            }
        }

        log::info!(
            "session built: seed={} simulations={} custom_apis={}",
            config.seed,
            engine.simulations.len(),
            engine.schemas.names().len()
        );
        Ok(engine)
    }

    /// Engine over `SessionConfig::default_test()` with an in-memory log.
    pub fn build_test(seed: u64) -> SimResult<Self> {
        let store = RequestStore::in_memory()?;
        store.migrate()?;
        let config = SessionConfig {
            seed,
            ..SessionConfig::default_test()
        };
        Self::build(&config, store)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ── Simulations ──────────────────────────────────────────────

    /// Create an empty simulation with a generated id and API key.
    pub fn create_simulation(&mut self, name: &str, kind: ProviderKind, provider: &str) -> &Simulation {
        let mut api_key = self.ids.api_key();
        while self.simulations.by_key(&api_key).is_some() {
            api_key = self.ids.api_key();
        }
        self.insert_simulation(name, kind, provider, api_key)
    }

    /// Create an empty simulation under a caller-chosen API key.
    /// Keys are unique across the session.
    pub fn create_simulation_with_key(
        &mut self,
        name: &str,
        kind: ProviderKind,
        provider: &str,
        api_key: ApiKey,
    ) -> SimResult<&Simulation> {
        if self.simulations.by_key(&api_key).is_some() {
            return Err(SimError::DuplicateApiKey { api_key });
        }
        Ok(self.insert_simulation(name, kind, provider, api_key))
    }

    fn insert_simulation(
        &mut self,
        name: &str,
        kind: ProviderKind,
        provider: &str,
        api_key: ApiKey,
    ) -> &Simulation {
        let id = self.ids.id();
        log::info!("simulation '{name}' created: id={id} kind={kind} provider={provider}");
        self.simulations
            .insert(Simulation::new(id, name, kind, provider, api_key))
    }

    pub fn delete_simulation(&mut self, id: &str) -> bool {
        let removed = self.simulations.remove(id).is_some();
        if removed {
            log::info!("simulation {id} deleted");
        }
        removed
    }

    /// Replace every simulation with the caller's current list.
    pub fn refresh_simulations(&mut self, simulations: Vec<Simulation>) {
        self.simulations.replace_all(simulations);
    }

    // ── Accounts ─────────────────────────────────────────────────

    /// Open an account with a generated id, number or wallet.
    pub fn open_account(&mut self, sim_id: &str, username: &str, opening: Opening) -> SimResult<EntityId> {
        let id = self.ids.id();
        self.insert_account(sim_id, id, username, opening)
    }

    fn insert_account(
        &mut self,
        sim_id: &str,
        id: EntityId,
        username: &str,
        opening: Opening,
    ) -> SimResult<EntityId> {
        let kind = self
            .simulations
            .by_id(sim_id)
            .ok_or_else(|| SimError::SimulationNotFound { id: sim_id.to_string() })?
            .kind;
        if opening.kind() != kind {
            return Err(SimError::ProviderKindMismatch {
                simulation: kind,
                account:    opening.kind(),
            });
        }

        let account = match opening {
            Opening::Bank { balance, currency } => Account::Bank(BankAccount {
                id: id.clone(),
                username: username.to_string(),
                account_number: self.ids.account_number(),
                balance: ledger::validate_amount(balance)?,
                currency,
                transactions: Vec::new(),
            }),
            Opening::Crypto { balances } => {
                let mut opened: BTreeMap<String, f64> =
                    DEFAULT_COINS.iter().map(|c| (c.to_string(), 0.0)).collect();
                for (coin, amount) in balances {
                    opened.insert(coin, ledger::validate_amount(amount)?);
                }
                Account::Crypto(CryptoAccount {
                    id: id.clone(),
                    username: username.to_string(),
                    wallet_address: self.ids.wallet_address(),
                    balances: opened,
                    transactions: Vec::new(),
                })
            }
        };

        let sim = self
            .simulations
            .by_id_mut(sim_id)
            .ok_or_else(|| SimError::SimulationNotFound { id: sim_id.to_string() })?;
        sim.add_account(account)?;
        log::debug!("sim={sim_id} account {id} ({username}) opened");
        Ok(id)
    }

    /// Open `count` generated accounts with plausible balances.
    pub fn populate(&mut self, sim_id: &str, count: usize) -> SimResult<Vec<EntityId>> {
        let kind = self
            .simulations
            .by_id(sim_id)
            .ok_or_else(|| SimError::SimulationNotFound { id: sim_id.to_string() })?
            .kind;

        let mut opened = Vec::with_capacity(count);
        for _ in 0..count {
            let mut username = NameGenerator::generate_username(&mut self.ids.names);
            let taken = self
                .simulations
                .by_id(sim_id)
                .is_some_and(|s| s.accounts().iter().any(|a| a.username() == username));
            if taken {
                username = NameGenerator::generate_handle(&mut self.ids.names);
            }

            let rng = &mut self.ids.balances;
            let opening = match kind {
                ProviderKind::Bank => {
                    let currency = if rng.chance(0.7) {
                        Currency::USD
                    } else if rng.chance(0.5) {
                        Currency::EUR
                    } else {
                        Currency::GEL
                    };
                    Opening::Bank {
                        balance: (rng.next_f64() * 10_000.0 * 100.0).round() / 100.0,
                        currency,
                    }
                }
                ProviderKind::Crypto => Opening::Crypto {
                    balances: BTreeMap::from([
                        ("BTC".to_string(), (rng.next_f64() * 2.0 * 1e4).round() / 1e4),
                        ("ETH".to_string(), (rng.next_f64() * 20.0 * 1e4).round() / 1e4),
                        ("USDT".to_string(), (rng.next_f64() * 5_000.0 * 100.0).round() / 100.0),
                    ]),
                },
            };
            opened.push(self.open_account(sim_id, &username, opening)?);
        }
        log::info!("sim={sim_id} populated with {count} synthetic accounts");
        Ok(opened)
    }

    // ── Custom APIs ──────────────────────────────────────────────

    /// Register a definition under its name. Last write wins.
    pub fn register_custom_api(&mut self, definition: CustomApiDefinition) {
        log::info!(
            "custom api '{}' registered ({} endpoints)",
            definition.name,
            definition.endpoints.len()
        );
        self.schemas.register(definition);
    }

    /// Parse JSON documentation and register the result. Returns the name.
    pub fn register_custom_api_json(&mut self, doc_text: &str) -> SimResult<String> {
        let definition = schema::parse_definition_json(doc_text, self.ids.id())?;
        let name = definition.name.clone();
        self.register_custom_api(definition);
        Ok(name)
    }

    pub fn remove_custom_api(&mut self, provider_name: &str) -> bool {
        self.schemas.remove(provider_name).is_some()
    }

    // ── Calls ────────────────────────────────────────────────────

    /// Direct access to the built-in APIs.
    pub fn fixed(&mut self) -> FixedSimulator<'_> {
        FixedSimulator::new(&mut self.simulations)
    }

    /// Direct access to the custom-schema APIs.
    pub fn dynamic(&mut self) -> DynamicSimulator<'_> {
        DynamicSimulator::new(&mut self.simulations, &self.schemas)
    }

    /// Route, execute and log one request.
    pub fn send(&mut self, request: &ApiRequest) -> ApiResponse {
        let started = Instant::now();
        let (response, method) = self.route(request);
        let latency_ms = started.elapsed().as_millis() as u64;

        let entry = RequestLogEntry {
            id:         Uuid::new_v4().to_string(),
            api_key:    request.api_key.clone(),
            endpoint:   request.endpoint.clone(),
            method:     request.method.clone().unwrap_or(method),
            body:       request.body.clone(),
            response:   response.clone(),
            status:     response.status_code(),
            latency_ms,
            timestamp:  Utc::now(),
        };
        if let Err(e) = self.store.append(&entry) {
            log::warn!("request log write failed for {}: {e}", request.endpoint);
        }
        response
    }

    fn route(&mut self, request: &ApiRequest) -> (ApiResponse, String) {
        let endpoint_name = request.endpoint.as_str();
        let fail = |e: SimError, method: &str| {
            (ApiResponse::from_result(endpoint_name, Err::<Value, _>(e)), method.to_string())
        };

        let Some(provider) = self
            .simulations
            .by_key(&request.api_key)
            .map(|s| s.provider.clone())
        else {
            return fail(SimError::InvalidKey, "POST");
        };

        if let Some(definition) = self.schemas.get(&provider) {
            let Some(endpoint) = definition.endpoint(endpoint_name).cloned() else {
                return fail(SimError::EndpointNotImplemented, "POST");
            };
            let response = DynamicSimulator::new(&mut self.simulations, &self.schemas).execute(
                &endpoint,
                &request.body,
                &request.api_key,
            );
            return (response, endpoint.method);
        }

        match FixedEndpoint::from_path(endpoint_name) {
            Some(endpoint) => {
                let response = FixedSimulator::new(&mut self.simulations).dispatch(
                    endpoint,
                    &request.api_key,
                    &request.body,
                );
                (response, endpoint.method().to_string())
            }
            None => fail(SimError::EndpointNotImplemented, "POST"),
        }
    }

    // ── Request log ──────────────────────────────────────────────

    pub fn request_log(&self, limit: usize) -> SimResult<Vec<RequestLogEntry>> {
        self.store.recent(limit)
    }

    pub fn clear_request_log(&self) -> SimResult<()> {
        self.store.clear()
    }
}
