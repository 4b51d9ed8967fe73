//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize)
//!     → validation.rs (semantic checks)
//!     → DiagnosticsSettings (validated, immutable)
//!     → ReportFormatter::from_config, init_logging, SimulatedTransport
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DiagnosticsSettings, ObservabilityConfig, ReplicaConfig, ReportConfig, ReportFormat,
    SimulationConfig,
};
pub use validation::{validate_config, ValidationError};
