//! Configuration management for the backplane driver.
//!
//! Loads the cluster layout and the role tunables from a TOML file. A missing
//! file is created with the defaults.

use sector_server::SectorConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use view_server::ViewServerConfig;
use zone_protocol::{Vec2d, Vec2f, ZoneCoord};
use zone_server::ZoneServerConfig;

fn default_zone_servers() -> u32 {
    2
}

fn default_grid() -> u32 {
    2
}

fn default_views() -> u32 {
    1
}

fn default_report_interval_ms() -> u64 {
    1000
}

fn default_flush_interval_ms() -> u64 {
    50
}

fn default_demo_objects() -> u32 {
    4
}

fn default_demo_speed() -> f32 {
    100.0
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cluster: ClusterSettings,
    #[serde(default)]
    pub zone: ZoneServerConfig,
    #[serde(default)]
    pub sector: SectorConfig,
    #[serde(default)]
    pub view: ViewServerConfig,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub demo: DemoSettings,
}

/// Layout of the colocated cluster.
///
/// Zones form a `grid_width` x `grid_height` block starting at cell (0, 0),
/// dealt to the zone servers round-robin in row-major order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSettings {
    #[serde(default = "default_zone_servers")]
    pub zone_servers: u32,
    #[serde(default = "default_grid")]
    pub grid_width: u32,
    #[serde(default = "default_grid")]
    pub grid_height: u32,
    /// Views hosted by the single view server
    #[serde(default = "default_views")]
    pub views: u32,
    /// Interval of the frame-count report
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
    /// Interval between delivery flushes on the view server
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            zone_servers: default_zone_servers(),
            grid_width: default_grid(),
            grid_height: default_grid(),
            views: default_views(),
            report_interval_ms: default_report_interval_ms(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl ClusterSettings {
    /// Every zone coordinate with the index of the zone server running it.
    pub fn assignments(&self) -> Vec<(ZoneCoord, u32)> {
        let mut assignments = Vec::new();
        for y in 0..self.grid_height {
            for x in 0..self.grid_width {
                let index = (y * self.grid_width + x) % self.zone_servers.max(1);
                assignments.push((ZoneCoord::new(x as i32, y as i32), index));
            }
        }
        assignments
    }
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
    /// Whether to output logs in JSON format
    pub json_format: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Objects admitted at startup so the cluster has something to simulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoSettings {
    #[serde(default = "default_demo_objects")]
    pub objects: u32,
    /// Initial speed along +x, in units per second
    #[serde(default = "default_demo_speed")]
    pub speed: f32,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            objects: default_demo_objects(),
            speed: default_demo_speed(),
        }
    }
}

impl DemoSettings {
    /// Start cell, position and velocity of demo object `index`. Objects
    /// start at the center of the zones in assignment order.
    pub fn placement(&self, index: u32, cells: &[ZoneCoord], zone_size: f64) -> Option<(ZoneCoord, Vec2d, Vec2f)> {
        if cells.is_empty() {
            return None;
        }
        let coord = cells[index as usize % cells.len()];
        let pos = Vec2d::new(
            (coord.x as f64 + 0.5) * zone_size,
            (coord.y as f64 + 0.5) * zone_size,
        );
        Some((coord, pos, Vec2f::new(self.speed, 0.0)))
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    pub async fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the merged configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.cluster.zone_servers == 0 {
            return Err("cluster.zone_servers must be greater than 0".to_string());
        }
        if self.cluster.grid_width == 0 || self.cluster.grid_height == 0 {
            return Err("cluster grid must contain at least one zone".to_string());
        }
        if self.cluster.grid_width > i32::MAX as u32 || self.cluster.grid_height > i32::MAX as u32 {
            return Err("cluster grid is too large".to_string());
        }
        if self.cluster.report_interval_ms == 0 || self.cluster.flush_interval_ms == 0 {
            return Err("cluster intervals must be greater than 0".to_string());
        }

        self.zone.validate().map_err(|e| format!("zone: {e}"))?;
        self.sector.validate().map_err(|e| format!("sector: {e}"))?;
        self.view.validate().map_err(|e| format!("view: {e}"))?;

        if !self.demo.speed.is_finite() {
            return Err(format!("demo.speed must be finite, got {}", self.demo.speed));
        }
        if self.demo.objects as usize > self.sector.max_objects {
            return Err(format!(
                "demo.objects ({}) exceeds sector.max_objects ({})",
                self.demo.objects, self.sector.max_objects
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.cluster.zone_servers, 2);
        assert_eq!(config.cluster.grid_width, 2);
        assert_eq!(config.cluster.grid_height, 2);
        assert_eq!(config.cluster.report_interval_ms, 1000);
        assert_eq!(config.zone.fps, 128);
        assert_eq!(config.sector.sector_id, 1);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_assignments_round_robin() {
        let cluster = ClusterSettings {
            zone_servers: 3,
            grid_width: 2,
            grid_height: 2,
            ..ClusterSettings::default()
        };
        assert_eq!(
            cluster.assignments(),
            vec![
                (ZoneCoord::new(0, 0), 0),
                (ZoneCoord::new(1, 0), 1),
                (ZoneCoord::new(0, 1), 2),
                (ZoneCoord::new(1, 1), 0),
            ]
        );
    }

    #[test]
    fn test_demo_placement_centers_objects() {
        let demo = DemoSettings::default();
        let cells = [ZoneCoord::new(0, 0), ZoneCoord::new(1, 0)];

        let (coord, pos, velocity) = demo.placement(3, &cells, 1000.0).expect("placement");
        assert_eq!(coord, ZoneCoord::new(1, 0));
        assert_eq!(pos, Vec2d::new(1500.0, 500.0));
        assert_eq!(velocity, Vec2f::new(100.0, 0.0));
        assert_eq!(ZoneCoord::containing(pos, 1000.0), coord);

        assert!(demo.placement(0, &[], 1000.0).is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        config.cluster.zone_servers = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.zone.fps = 0;
        assert!(config.validate().unwrap_err().starts_with("zone:"));

        let mut config = AppConfig::default();
        config.demo.objects = 20;
        config.sector.max_objects = 10;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_nonexistent_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("backplane.toml");

        let config = AppConfig::load_from_file(&path).await.expect("default config");
        assert_eq!(config.cluster.zone_servers, 2);
        assert!(path.exists());

        // The written file loads back to the same settings.
        let reloaded = AppConfig::load_from_file(&path).await.expect("reload");
        assert_eq!(reloaded.cluster, config.cluster);
        assert_eq!(reloaded.zone, config.zone);
        assert_eq!(reloaded.sector, config.sector);
    }

    #[tokio::test]
    async fn test_load_partial_file_uses_defaults() {
        let file = NamedTempFile::new().expect("temp file");
        tokio::fs::write(
            file.path(),
            "[cluster]\nzone_servers = 4\n\n[zone]\nfps = 60\n\n[logging]\nlevel = \"debug\"\njson_format = true\n",
        )
        .await
        .expect("write config");

        let config = AppConfig::load_from_file(file.path()).await.expect("load");
        assert_eq!(config.cluster.zone_servers, 4);
        assert_eq!(config.cluster.grid_width, 2);
        assert_eq!(config.zone.fps, 60);
        assert_eq!(config.zone.sim_fps, 64);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(config.demo, DemoSettings::default());
    }

    #[tokio::test]
    async fn test_load_invalid_toml() {
        let file = NamedTempFile::new().expect("temp file");
        tokio::fs::write(file.path(), "[cluster\nzone_servers = ").await.expect("write");
        assert!(AppConfig::load_from_file(file.path()).await.is_err());
    }
}
