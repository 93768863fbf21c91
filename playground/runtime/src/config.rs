//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Names under which the module exposes its capabilities.
///
/// The defaults match the evaluator binary shipped with the playground.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportNames {
    pub memory: String,
    pub allocate: String,
    pub deallocate: String,
    pub evaluate: String,
    pub format: String,
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            memory: "memory".to_string(),
            allocate: "alloc".to_string(),
            deallocate: "dealloc".to_string(),
            evaluate: "eval".to_string(),
            format: "format".to_string(),
        }
    }
}

/// Who frees the buffer the host writes an operation's input into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalPolicy {
    /// The host releases the input buffer as soon as the export returns.
    #[default]
    HostReleases,
    /// The module takes ownership of the input buffer and frees it itself.
    ModuleReleases,
}

/// Configuration for loading and driving a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Export names to look up at load time.
    pub exports: ExportNames,

    /// Input buffer disposal rule.
    pub disposal: DisposalPolicy,

    /// Upper bound on fetch + instantiate, in milliseconds.
    pub load_timeout_ms: Option<u64>,

    /// Maximum size the module's memory may grow to.
    pub max_memory_bytes: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            exports: ExportNames::default(),
            disposal: DisposalPolicy::default(),
            load_timeout_ms: None,
            max_memory_bytes: 64 * 1024 * 1024,
        }
    }
}

impl BridgeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Set the input buffer disposal policy.
    pub fn with_disposal(mut self, disposal: DisposalPolicy) -> Self {
        self.disposal = disposal;
        self
    }

    /// Bound the time `load` may take.
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }
}
