//! # Capability Definitions
//!
//! A capability is one configured unit of behavior attached to the shared
//! edge client: observe/report twin state, forward a module input, send to
//! a module output, or handle a direct method.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which edge client flavour the process connects with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    /// Module client configured from the edge runtime environment.
    #[default]
    Module,
    /// Device client using an x509 connection string.
    Device,
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => f.write_str("module"),
            Self::Device => f.write_str("device"),
        }
    }
}

/// Capability type together with its configuration key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CapabilityKind {
    /// Twin observer/reporter. `name` is a display label only.
    Twin {
        #[serde(default = "default_twin_name")]
        name: String,
    },
    /// Forwards messages arriving on the named module input.
    Input {
        #[serde(default = "default_input")]
        input: String,
    },
    /// Sends host payloads to the named module output.
    Output {
        #[serde(default = "default_output")]
        output: String,
    },
    /// Handles the named direct method.
    Method {
        #[serde(default = "default_method")]
        method: String,
    },
}

impl CapabilityKind {
    /// The configuration key (input, output or method name; twin label).
    pub fn key(&self) -> &str {
        match self {
            Self::Twin { name } => name,
            Self::Input { input } => input,
            Self::Output { output } => output,
            Self::Method { method } => method,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Twin { .. } => "twin",
            Self::Input { .. } => "input",
            Self::Output { .. } => "output",
            Self::Method { .. } => "method",
        }
    }
}

fn default_twin_name() -> String {
    "Module Twin".to_string()
}

fn default_input() -> String {
    "input1".to_string()
}

fn default_output() -> String {
    "output1".to_string()
}

fn default_method() -> String {
    "method1".to_string()
}

/// One capability node as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityConfig {
    /// Host node identifier.
    pub id: String,
    #[serde(flatten)]
    pub kind: CapabilityKind,
}

impl CapabilityConfig {
    pub fn new(id: impl Into<String>, kind: CapabilityKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_apply_when_key_missing() {
        let configs: Vec<CapabilityConfig> = serde_json::from_value(json!([
            {"id": "n1", "type": "input"},
            {"id": "n2", "type": "output"},
            {"id": "n3", "type": "method"},
            {"id": "n4", "type": "twin"}
        ]))
        .unwrap();

        assert_eq!(configs[0].kind.key(), "input1");
        assert_eq!(configs[1].kind.key(), "output1");
        assert_eq!(configs[2].kind.key(), "method1");
        assert_eq!(configs[3].kind.key(), "Module Twin");
    }

    #[test]
    fn test_explicit_key() {
        let config: CapabilityConfig =
            serde_json::from_value(json!({"id": "m", "type": "method", "method": "reboot"}))
                .unwrap();
        assert_eq!(
            config.kind,
            CapabilityKind::Method {
                method: "reboot".to_string()
            }
        );
        assert_eq!(config.kind.type_name(), "method");
    }

    #[test]
    fn test_client_kind_default() {
        assert_eq!(ClientKind::default(), ClientKind::Module);
        assert_eq!(ClientKind::Device.to_string(), "device");
    }
}
