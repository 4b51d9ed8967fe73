//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.

use serde::{Deserialize, Serialize};

use crate::report::DEFAULT_MAX_SUPPLEMENTAL_ENTRIES;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct DiagnosticsSettings {
    /// Report rendering.
    pub report: ReportConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Simulated transport used by the CLI and harness tests.
    pub simulation: SimulationConfig,
}

/// Output format for rendered reports.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Most recent supplemental calls kept in a report.
    pub max_supplemental_entries: usize,

    /// How reports are rendered by the CLI.
    pub format: ReportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            max_supplemental_entries: DEFAULT_MAX_SUPPLEMENTAL_ENTRIES,
            format: ReportFormat::Text,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Colored log output.
    pub ansi: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            ansi: true,
        }
    }
}

/// One simulated replica.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ReplicaConfig {
    /// Replica endpoint (e.g., "https://eastus.db.example.net:14001/replica/1").
    pub endpoint: String,

    /// Simulated call latency in milliseconds.
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Status code the replica answers with.
    #[serde(default = "default_status_code")]
    pub status_code: u16,

    /// Error text returned instead of a response.
    #[serde(default)]
    pub error: Option<String>,

    /// Error text for this replica's address resolution.
    #[serde(default)]
    pub resolution_error: Option<String>,
}

fn default_latency_ms() -> u64 {
    20
}

fn default_status_code() -> u16 {
    200
}

/// Simulated transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SimulationConfig {
    /// Replicas the logical request fans out to.
    pub replicas: Vec<ReplicaConfig>,

    /// Simulated duration of each background address resolution.
    pub resolution_delay_ms: u64,

    /// Metadata calls issued before the fan-out (recorded as supplemental).
    pub metadata_calls: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            replicas: vec![
                ReplicaConfig {
                    endpoint: "https://eastus.db.example.net:14001/replica/1".to_string(),
                    latency_ms: 15,
                    status_code: 200,
                    error: None,
                    resolution_error: None,
                },
                ReplicaConfig {
                    endpoint: "https://eastus.db.example.net:14002/replica/2".to_string(),
                    latency_ms: 30,
                    status_code: 200,
                    error: None,
                    resolution_error: None,
                },
                ReplicaConfig {
                    endpoint: "https://westus.db.example.net:14001/replica/1".to_string(),
                    latency_ms: 60,
                    status_code: 503,
                    error: Some("service unavailable".to_string()),
                    resolution_error: None,
                },
            ],
            resolution_delay_ms: 40,
            metadata_calls: 12,
        }
    }
}
