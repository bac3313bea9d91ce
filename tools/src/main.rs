//! apisim-runner: headless session runner for the API simulator.
//!
//! Usage:
//!   apisim-runner --config session.json --seed 12345 --db requests.db
//!   apisim-runner --config session.json --ipc-mode

use anyhow::Result;
use apisim_core::{
    command::ApiRequest,
    config::SessionConfig,
    engine::{ApiEngine, Opening},
    request::RequestBody,
    store::{RequestLogEntry, RequestStore},
    types::{Currency, ProviderKind},
};
use std::collections::BTreeMap;
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Send {
        api_key:  String,
        endpoint: String,
        #[serde(default)]
        body:     serde_json::Value,
    },
    CreateSimulation {
        name:     String,
        kind:     ProviderKind,
        provider: String,
    },
    OpenAccount {
        simulation_id: String,
        username:      String,
        #[serde(default)]
        balance:       f64,
        #[serde(default)]
        currency:      Option<Currency>,
        #[serde(default)]
        balances:      BTreeMap<String, f64>,
    },
    Populate {
        simulation_id: String,
        count:         usize,
    },
    RegisterApi {
        definition: serde_json::Value,
    },
    RequestLog {
        #[serde(default = "default_log_limit")]
        limit: usize,
    },
    Quit,
}

fn default_log_limit() -> usize {
    20
}

#[derive(serde::Serialize)]
struct SimulationSummary {
    id:       String,
    name:     String,
    kind:     ProviderKind,
    provider: String,
    api_key:  String,
    accounts: usize,
    custom:   bool,
}

#[derive(serde::Serialize)]
struct UiState {
    seed:          u64,
    simulations:   Vec<SimulationSummary>,
    custom_apis:   Vec<String>,
    request_count: i64,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let db = flag_value(&args, "--db").unwrap_or(":memory:");
    let config_path = flag_value(&args, "--config");

    let mut config = match config_path {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    config.seed = parse_arg(&args, "--seed", config.seed);

    if !ipc_mode {
        println!("API Simulator — apisim-runner");
        println!("  seed:    {}", config.seed);
        println!("  config:  {}", config_path.unwrap_or("(none)"));
        println!("  db:      {db}");
        println!("  started: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        println!();
    }

    let store = if db == ":memory:" {
        RequestStore::in_memory()?
    } else {
        RequestStore::open(db)?
    };
    store.migrate()?;

    let mut engine = ApiEngine::build(&config, store)?;

    if ipc_mode {
        run_ipc_loop(&mut engine)?;
    } else {
        print_summary(&engine)?;
    }

    Ok(())
}

fn run_ipc_loop(engine: &mut ApiEngine) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                writeln!(stdout, "{}", serde_json::json!({ "error": e.to_string() }))?;
                stdout.flush()?;
                continue;
            }
        };
        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let reply = match handle_command(engine, cmd) {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("ipc command failed: {e}");
                serde_json::json!({ "error": e.to_string() })
            }
        };
        writeln!(stdout, "{reply}")?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(engine: &mut ApiEngine, cmd: IpcCommand) -> Result<serde_json::Value> {
    let reply = match cmd {
        IpcCommand::GetState | IpcCommand::Quit => serde_json::to_value(build_ui_state(engine)?)?,
        IpcCommand::Send { api_key, endpoint, body } => {
            let request = ApiRequest::new(api_key, endpoint, RequestBody::from_value(body)?);
            serde_json::to_value(engine.send(&request))?
        }
        IpcCommand::CreateSimulation { name, kind, provider } => {
            let sim = engine.create_simulation(&name, kind, &provider);
            serde_json::json!({ "id": sim.id, "apiKey": sim.api_key })
        }
        IpcCommand::OpenAccount { simulation_id, username, balance, currency, balances } => {
            let kind = engine
                .simulations
                .by_id(&simulation_id)
                .map(|s| s.kind)
                .ok_or_else(|| anyhow::anyhow!("Simulation not found: {simulation_id}"))?;
            let opening = match kind {
                ProviderKind::Bank => Opening::Bank {
                    balance,
                    currency: currency.unwrap_or(Currency::USD),
                },
                ProviderKind::Crypto => Opening::Crypto { balances },
            };
            let id = engine.open_account(&simulation_id, &username, opening)?;
            serde_json::json!({ "id": id })
        }
        IpcCommand::Populate { simulation_id, count } => {
            let ids = engine.populate(&simulation_id, count)?;
            serde_json::json!({ "ids": ids })
        }
        IpcCommand::RegisterApi { definition } => {
            let name = engine.register_custom_api_json(&definition.to_string())?;
            serde_json::json!({ "registered": name })
        }
        IpcCommand::RequestLog { limit } => {
            let entries: Vec<RequestLogEntry> = engine.request_log(limit)?;
            serde_json::to_value(entries)?
        }
    };
    Ok(reply)
}

fn build_ui_state(engine: &ApiEngine) -> Result<UiState> {
    let simulations = engine
        .simulations
        .iter()
        .map(|s| SimulationSummary {
            id:       s.id.clone(),
            name:     s.name.clone(),
            kind:     s.kind,
            provider: s.provider.clone(),
            api_key:  s.api_key.clone(),
            accounts: s.accounts().len(),
            custom:   engine.schemas.contains(&s.provider),
        })
        .collect();

    Ok(UiState {
        seed:          engine.seed(),
        simulations,
        custom_apis:   engine.schemas.names().into_iter().map(String::from).collect(),
        request_count: engine.store.count()?,
    })
}

fn print_summary(engine: &ApiEngine) -> Result<()> {
    println!("=== SESSION SUMMARY ===");
    if engine.simulations.is_empty() {
        println!("  (No simulations configured)");
    }
    for sim in engine.simulations.iter() {
        println!(
            "  {} | {} ({}) | provider: {} | key: {} | accounts: {}",
            sim.id,
            sim.name,
            sim.kind,
            sim.provider,
            sim.api_key,
            sim.accounts().len()
        );
    }

    println!();
    println!("=== CUSTOM APIS ===");
    let names = engine.schemas.names();
    if names.is_empty() {
        println!("  (None registered)");
    }
    for name in names {
        if let Some(def) = engine.schemas.get(name) {
            println!(
                "  {} ({}) | {} endpoints | {}",
                def.name,
                def.kind,
                def.endpoints.len(),
                def.features().join(", ")
            );
        }
    }
    println!();
    println!("  requests logged: {}", engine.store.count()?);
    Ok(())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
