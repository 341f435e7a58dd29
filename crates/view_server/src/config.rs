//! View server configuration types and defaults.

use crate::error::ViewError;
use serde::{Deserialize, Serialize};
use zone_protocol::ViewData;

fn default_max_watch_distance() -> f32 {
    1000.0
}

fn default_flush_batch() -> usize {
    256
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewServerConfig {
    /// Upper bound for watch distances of views created with defaults
    #[serde(default = "default_max_watch_distance")]
    pub max_watch_distance: f32,

    /// Deliveries handed to clients per flush
    #[serde(default = "default_flush_batch")]
    pub flush_batch: usize,
}

impl Default for ViewServerConfig {
    fn default() -> Self {
        Self {
            max_watch_distance: default_max_watch_distance(),
            flush_batch: default_flush_batch(),
        }
    }
}

impl ViewServerConfig {
    pub fn view_data(&self) -> ViewData {
        ViewData {
            max_watch_distance: self.max_watch_distance,
        }
    }

    pub fn validate(&self) -> Result<(), ViewError> {
        if !self.max_watch_distance.is_finite() || self.max_watch_distance <= 0.0 {
            return Err(ViewError::Config(format!(
                "max_watch_distance must be finite and positive, got {}",
                self.max_watch_distance
            )));
        }
        if self.flush_batch == 0 {
            return Err(ViewError::Config("flush_batch must be greater than 0".to_string()));
        }
        Ok(())
    }
}
