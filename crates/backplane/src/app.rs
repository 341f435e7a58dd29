//! Application lifecycle: configuration, cluster startup and graceful
//! shutdown.

use crate::cli::CliArgs;
use crate::cluster::Cluster;
use crate::config::AppConfig;
use crate::logging::display_banner;
use crate::signals::{wait_for_shutdown_signal, wait_for_signal};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, warn};
use zone_protocol::ShutdownState;

/// How long the role tasks get to return after shutdown is initiated.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(8);

/// Applies command-line overrides on top of the file configuration.
pub fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(fps) = args.fps {
        config.zone.fps = fps;
    }
}

pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Loads configuration (creating a default file if missing), applies
    /// CLI overrides and validates the result.
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let mut config = AppConfig::load_from_file(&args.config_path).await?;
        apply_overrides(&mut config, &args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        display_banner();
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs the cluster until a shutdown signal arrives.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.log_configuration_summary();

        let shutdown_state = ShutdownState::new();
        let cluster = Cluster::build(&self.config)?;
        let running = cluster.spawn(&shutdown_state);

        info!("✅ Backplane is now running");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        wait_for_shutdown_signal(&shutdown_state).await?;

        // A second signal skips the graceful path.
        tokio::spawn(async move {
            if let Err(e) = wait_for_signal().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }
            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        let unreported: u64 = running
            .frame_counters()
            .iter()
            .map(|counter| counter.load(Ordering::Relaxed))
            .sum();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, running.join()).await {
            Ok(Ok(stopped)) => {
                shutdown_state.complete_shutdown();
                info!("📊 Final Statistics:");
                info!("  - Objects on record: {}", stopped.sector.object_count());
                for (index, zone) in stopped.zones.iter().enumerate() {
                    info!(
                        "  - Zone server {}: {} frames, {} skipped, {} objects",
                        index,
                        zone.frames_run(),
                        zone.frames_skipped(),
                        zone.object_count()
                    );
                }
                info!("  - Frames since last report: {}", unreported);
                info!("  - Client deliveries: {}", stopped.view.delivered());
            }
            Ok(Err(e)) => {
                error!("❌ A role task failed: {}", e);
                return Err(e.into());
            }
            Err(_) => {
                warn!("⏰ Role tasks did not stop within {:?}", SHUTDOWN_TIMEOUT);
            }
        }

        info!("✅ Backplane shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        let cluster = &self.config.cluster;
        info!("📋 Configuration Summary:");
        info!("  🌍 Sector: {}", self.config.sector.sector_id);
        info!(
            "  🧱 Zones: {}x{} of {} units on {} zone servers",
            cluster.grid_width, cluster.grid_height, self.config.zone.zone_size, cluster.zone_servers
        );
        info!(
            "  ⏱️ Frame rate: {} fps, simulation step: {} fps",
            self.config.zone.fps, self.config.zone.sim_fps
        );
        info!("  👁️ Views: {}", cluster.views);
        info!("  🎲 Demo objects: {}", self.config.demo.objects);
    }
}
