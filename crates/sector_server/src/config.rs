//! Sector configuration types and defaults.

use crate::error::SectorError;
use serde::{Deserialize, Serialize};
use zone_protocol::{SectorData, SectorId};

fn default_sector_id() -> SectorId {
    1
}

fn default_max_objects() -> usize {
    10_000
}

/// Configuration of one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorConfig {
    #[serde(default = "default_sector_id")]
    pub sector_id: SectorId,

    /// Generation seed handed to zone servers
    #[serde(default)]
    pub seed: u32,

    /// Admission refuses new objects once this many are known
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            sector_id: default_sector_id(),
            seed: 0,
            max_objects: default_max_objects(),
        }
    }
}

impl SectorConfig {
    pub fn sector_data(&self) -> SectorData {
        SectorData { seed: self.seed }
    }

    pub fn validate(&self) -> Result<(), SectorError> {
        if self.max_objects == 0 {
            return Err(SectorError::Config(format!(
                "sector {}: max_objects must be greater than 0",
                self.sector_id
            )));
        }
        Ok(())
    }
}
