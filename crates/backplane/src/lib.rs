//! # Backplane - Reference Driver
//!
//! Runs one sector, its zone servers and a view server in a single process,
//! wired through channel handles.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration
//! backplane
//!
//! # Specify custom configuration
//! backplane --config cluster.toml
//!
//! # Override specific settings
//! backplane --fps 60 --log-level debug
//!
//! # JSON logging for production
//! backplane --json-logs
//! ```
//!
//! ## Configuration
//!
//! The driver loads configuration from a TOML file (default: `backplane.toml`).
//! If the file doesn't exist, a default configuration will be created.
//!
//! ## Signal Handling
//!
//! SIGINT (Ctrl+C) and SIGTERM stop the role tasks through a shared
//! [`zone_protocol::ShutdownState`]. A second signal exits immediately.

use tracing::error;

pub mod app;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod logging;
pub mod signals;
pub mod sink;

pub use app::Application;
pub use cli::CliArgs;
pub use cluster::{Cluster, ClusterError, RunningCluster, StoppedCluster};
pub use config::{AppConfig, ClusterSettings, DemoSettings, LoggingSettings};

/// Parses arguments, sets up logging and runs the application until
/// shutdown.
///
/// # Exit Codes
///
/// * **0**: Successful execution and shutdown
/// * **1**: Error during startup, configuration, or runtime
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Logging settings come from the file, before it is validated.
    let mut config = AppConfig::load_from_file(&args.config_path).await.unwrap_or_default();
    app::apply_overrides(&mut config, &args);

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(args).await {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
