//! Server configuration read from the host
//!
//! The host pushes settings as loosely-typed JSON, either as
//! `initializationOptions` or through `workspace/didChangeConfiguration`.
//! Only the `emmet` namespace is consulted.

use serde::Deserialize;
use serde_json::Value;

/// Settings under the `emmet` namespace.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EmmetSettings {
    /// Offer expansions from the completion provider. When disabled the
    /// provider returns an empty list without extraction, expansion, or
    /// catalog access.
    pub autocomplete: bool,
}

impl Default for EmmetSettings {
    fn default() -> Self {
        Self { autocomplete: true }
    }
}

impl EmmetSettings {
    /// Parse settings from a host payload. The payload may carry the settings
    /// directly or wrap them in an `emmet` object; malformed payloads fall
    /// back to the defaults.
    pub fn from_value(value: &Value) -> Self {
        let scoped = value.get("emmet").unwrap_or(value);
        serde_json::from_value(scoped.clone()).unwrap_or_default()
    }
}
