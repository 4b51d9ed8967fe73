//! Request diagnostics harness.
//!
//! Drives the recorder through a simulated transport and prints the report
//! a real client would attach to its logs or errors.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── logical request ─────────────────────────────┐
//!   │                                                                          │
//!   │   metadata calls ──────────┐                                             │
//!   │                            ▼                                             │
//!   │   replica 1 call ───▶ ┌─────────────────────┐     snapshot()             │
//!   │   replica 2 call ───▶ │ RequestDiagnostics  │ ───────────────┐           │
//!   │   replica N call ───▶ │  (one mutex)        │                ▼           │
//!   │                       └─────────────────────┘       ┌────────────────┐   │
//!   │   address resolution ──▶ start / end ▲              │ReportFormatter │   │
//!   │   (background, may stay pending) ────┘              └───────┬────────┘   │
//!   │                                                             ▼            │
//!   │                                            logs  /  OperationFailure     │
//!   └──────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use request_diagnostics::config::{load_config, DiagnosticsSettings, ReportFormat};
use request_diagnostics::diagnostics::{duration_millis, OperationType, ResourceType, SystemClock};
use request_diagnostics::observability::logging::init_logging;
use request_diagnostics::report::ReportFormatter;
use request_diagnostics::simulation::SimulatedTransport;

#[derive(Parser)]
#[command(name = "request-diagnostics")]
#[command(about = "Simulate a fanned-out database request and print its diagnostics", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one simulated logical request and print its report
    Simulate {
        #[arg(long, default_value = "Document")]
        resource: ResourceType,

        #[arg(long, default_value = "Read")]
        operation: OperationType,

        /// Print the report as JSON regardless of configuration
        #[arg(long)]
        json: bool,

        /// Wait for background address resolutions before reporting
        #[arg(long)]
        settle: bool,
    },
    /// Validate a configuration file
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => DiagnosticsSettings::default(),
    };

    init_logging(&settings.observability)?;

    match cli.command {
        Commands::CheckConfig => {
            tracing::info!(
                max_supplemental_entries = settings.report.max_supplemental_entries,
                replicas = settings.simulation.replicas.len(),
                "Configuration is valid"
            );
            println!("configuration OK");
        }
        Commands::Simulate {
            resource,
            operation,
            json,
            settle,
        } => {
            let formatter = ReportFormatter::from_config(&settings.report);
            let transport = SimulatedTransport::new(settings.simulation.clone(), Arc::new(SystemClock));

            let mut request = transport.execute(resource, operation).await;
            if settle {
                request.settle().await;
            }

            match request.outcome(&formatter) {
                Ok(result) => tracing::info!(
                    activity_id = %request.diagnostics().activity_id(),
                    latency_ms = duration_millis(request.diagnostics().request_latency()),
                    result = %result,
                    "Request succeeded"
                ),
                Err(failure) => tracing::error!(error = %failure, "Request failed"),
            }

            let report = request.diagnostics().complete(&formatter);
            if json || settings.report.format == ReportFormat::Json {
                println!("{}", report.to_json_pretty()?);
            } else {
                print!("{}", report);
            }
        }
    }

    Ok(())
}
