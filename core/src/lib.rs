//! Request-simulation engine for mock bank and crypto APIs.
//!
//! A session holds simulations (named sandboxes bound to a provider), their
//! accounts, and any custom API definitions. Calls go through
//! `engine::ApiEngine::send`, which routes to the fixed or the dynamic
//! simulator and logs every request.

pub mod command;
pub mod config;
pub mod dynamic_simulator;
pub mod engine;
pub mod error;
pub mod fixed_simulator;
pub mod ledger;
pub mod model;
pub mod name_generator;
pub mod recorder;
pub mod registry;
pub mod request;
pub mod rng;
pub mod schema;
pub mod store;
pub mod types;
