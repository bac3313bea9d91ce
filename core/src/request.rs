//! Request bodies as a string-keyed field table.
//!
//! Callers hand over arbitrary JSON objects; the simulators only ever read
//! named fields through these accessors.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestBody {
    fields: Map<String, Value>,
}

impl RequestBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value. Anything but an object is malformed input.
    pub fn from_value(value: Value) -> SimResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            Value::Null => Ok(Self::default()),
            other => Err(SimError::malformed(format!(
                "request body must be a JSON object, got {other}"
            ))),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A string field; numbers are accepted and rendered as text.
    pub fn text(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// First present field among `names`, in order.
    pub fn text_any(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|n| self.text(n))
    }

    /// A string field that must be present.
    pub fn require_text(&self, name: &str) -> SimResult<String> {
        self.text(name)
            .ok_or_else(|| SimError::malformed(format!("missing field '{name}'")))
    }

    /// The `amount` field: present, numeric, finite and not negative.
    pub fn amount(&self) -> SimResult<f64> {
        let amount = match self.fields.get("amount") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| SimError::malformed("amount is not representable"))?,
            Some(other) => {
                return Err(SimError::malformed(format!("amount must be a number, got {other}")))
            }
            None => return Err(SimError::malformed("missing field 'amount'")),
        };
        crate::ledger::validate_amount(amount)
    }

    /// `coin` wins over `currency`; `None` when neither is set.
    pub fn coin(&self) -> Option<String> {
        self.text_any(&["coin", "currency"])
    }
}

impl From<Map<String, Value>> for RequestBody {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
