use thiserror::Error;

/// Every failure the simulator can produce.
///
/// The domain variants are expected outcomes of a simulated call; their
/// Display text is exactly what a caller sees in the failure envelope.
#[derive(Error, Debug)]
pub enum SimError {
    // ── Domain outcomes ─────────────────────────────
    #[error("Invalid API key")]
    InvalidKey,

    #[error("User not found")]
    UserNotFound,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Currency mismatch")]
    CurrencyMismatch,

    #[error("Endpoint not implemented")]
    EndpointNotImplemented,

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Custom API definition not found")]
    DefinitionNotFound,

    // ── Setup errors ────────────────────────────────
    #[error("Invalid API definition: {0}")]
    InvalidDefinition(String),

    #[error("Account kind {account} does not match simulation kind {simulation}")]
    ProviderKindMismatch {
        simulation: crate::types::ProviderKind,
        account:    crate::types::ProviderKind,
    },

    #[error("Simulation '{id}' not found")]
    SimulationNotFound { id: String },

    #[error("API key '{api_key}' is already used by another simulation")]
    DuplicateApiKey { api_key: String },

    // ── Infrastructure ──────────────────────────────
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    /// Shorthand for a `MalformedInput` with a formatted reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        SimError::MalformedInput(reason.into())
    }
}

pub type SimResult<T> = Result<T, SimError>;
