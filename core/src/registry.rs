//! Session-scoped lookup tables.
//!
//! `SimulationRegistry` resolves API keys to simulations; `SchemaRegistry`
//! resolves provider names to custom definitions. Both are created at
//! session start, refreshed by their owner, and dropped at session end.
//! A stale or empty registry simply fails lookups.

use crate::{
    model::Simulation,
    schema::CustomApiDefinition,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct SimulationRegistry {
    simulations: Vec<Simulation>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, simulation: Simulation) -> &mut Simulation {
        self.simulations.push(simulation);
        let last = self.simulations.len() - 1;
        &mut self.simulations[last]
    }

    /// Remove by id. Returns the removed simulation, if any.
    pub fn remove(&mut self, id: &str) -> Option<Simulation> {
        let pos = self.simulations.iter().position(|s| s.id == id)?;
        Some(self.simulations.remove(pos))
    }

    /// Replace the whole table with the owner's current list.
    pub fn replace_all(&mut self, simulations: Vec<Simulation>) {
        self.simulations = simulations;
    }

    pub fn by_key(&self, api_key: &str) -> Option<&Simulation> {
        self.simulations.iter().find(|s| s.api_key == api_key)
    }

    pub fn by_key_mut(&mut self, api_key: &str) -> Option<&mut Simulation> {
        self.simulations.iter_mut().find(|s| s.api_key == api_key)
    }

    pub fn by_id(&self, id: &str) -> Option<&Simulation> {
        self.simulations.iter().find(|s| s.id == id)
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Simulation> {
        self.simulations.iter_mut().find(|s| s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Simulation> {
        self.simulations.iter()
    }

    pub fn len(&self) -> usize {
        self.simulations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulations.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    definitions: HashMap<String, CustomApiDefinition>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register under the definition's name. Last write wins.
    pub fn register(&mut self, definition: CustomApiDefinition) -> Option<CustomApiDefinition> {
        let replaced = self.definitions.insert(definition.name.clone(), definition);
        if let Some(old) = &replaced {
            log::info!("custom api '{}' replaced (old id {})", old.name, old.id);
        }
        replaced
    }

    pub fn remove(&mut self, provider_name: &str) -> Option<CustomApiDefinition> {
        self.definitions.remove(provider_name)
    }

    pub fn get(&self, provider_name: &str) -> Option<&CustomApiDefinition> {
        log::debug!("looking up custom definition for '{provider_name}'");
        self.definitions.get(provider_name)
    }

    pub fn contains(&self, provider_name: &str) -> bool {
        self.definitions.contains_key(provider_name)
    }

    /// Registered provider names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
