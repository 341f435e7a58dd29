//! Zone server configuration types and defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_fps() -> u32 {
    128
}

fn default_sim_fps() -> u32 {
    64
}

fn default_catch_up_threshold() -> u32 {
    2
}

fn default_zone_size() -> f64 {
    1000.0
}

fn default_admission_timeout_ms() -> u64 {
    5000
}

fn default_max_control_inputs() -> usize {
    16
}

fn default_control_window_us() -> u64 {
    1_000_000
}

fn default_thrust_impulse() -> f32 {
    10.0
}

fn default_max_spin() -> f32 {
    std::f32::consts::PI
}

fn default_brake_factor() -> f32 {
    0.5
}

/// Tunables for one zone server process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneServerConfig {
    /// Target frame rate of `run_frame`; halved under overload.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Fixed step rate of each zone's simulation.
    #[serde(default = "default_sim_fps")]
    pub sim_fps: u32,
    /// More elapsed frames than this in one `run_frame` counts as overload.
    #[serde(default = "default_catch_up_threshold")]
    pub catch_up_threshold: u32,
    /// Edge length of a zone cell in world units.
    #[serde(default = "default_zone_size")]
    pub zone_size: f64,
    /// Deadline for a sector's admission decision.
    #[serde(default = "default_admission_timeout_ms")]
    pub admission_timeout_ms: u64,
    #[serde(default = "default_max_control_inputs")]
    pub max_control_inputs: usize,
    /// Control frames older than the zone clock minus this window are stale.
    #[serde(default = "default_control_window_us")]
    pub control_window_us: u64,
    /// Velocity change of a full thrust input, units per second.
    #[serde(default = "default_thrust_impulse")]
    pub thrust_impulse: f32,
    /// Spin rate of a full turn input, radians per second.
    #[serde(default = "default_max_spin")]
    pub max_spin: f32,
    /// Fraction of velocity removed by a full brake input.
    #[serde(default = "default_brake_factor")]
    pub brake_factor: f32,
}

impl Default for ZoneServerConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            sim_fps: default_sim_fps(),
            catch_up_threshold: default_catch_up_threshold(),
            zone_size: default_zone_size(),
            admission_timeout_ms: default_admission_timeout_ms(),
            max_control_inputs: default_max_control_inputs(),
            control_window_us: default_control_window_us(),
            thrust_impulse: default_thrust_impulse(),
            max_spin: default_max_spin(),
            brake_factor: default_brake_factor(),
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than 0")]
    Zero(&'static str),

    #[error("{field} must be finite and positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("brake_factor must be within [0, 1], got {0}")]
    BrakeFactor(f32),
}

impl ZoneServerConfig {
    pub fn admission_timeout(&self) -> Duration {
        Duration::from_millis(self.admission_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.fps == 0 {
            return Err(ConfigError::Zero("fps"));
        }
        if self.sim_fps == 0 {
            return Err(ConfigError::Zero("sim_fps"));
        }
        if self.max_control_inputs == 0 {
            return Err(ConfigError::Zero("max_control_inputs"));
        }
        if !self.zone_size.is_finite() || self.zone_size <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "zone_size",
                value: self.zone_size,
            });
        }
        for (field, value) in [("thrust_impulse", self.thrust_impulse), ("max_spin", self.max_spin)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive {
                    field,
                    value: value as f64,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.brake_factor) {
            return Err(ConfigError::BrakeFactor(self.brake_factor));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ZoneServerConfig::default();
        assert_eq!(config.fps, 128);
        assert_eq!(config.sim_fps, 64);
        assert_eq!(config.catch_up_threshold, 2);
        assert_eq!(config.admission_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = ZoneServerConfig::default();
        config.fps = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("fps")));

        let mut config = ZoneServerConfig::default();
        config.zone_size = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::NotPositive { field: "zone_size", .. })));

        let mut config = ZoneServerConfig::default();
        config.brake_factor = 1.5;
        assert_eq!(config.validate(), Err(ConfigError::BrakeFactor(1.5)));
    }
}
