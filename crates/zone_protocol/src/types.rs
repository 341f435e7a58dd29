//! # Core Identifiers
//!
//! Opaque handles used as keys by every role. They carry no business meaning
//! beyond lookup and comparison.
//!
//! ## Key Types
//!
//! - [`SectorRef`] - a persistent spatial partition
//! - [`ZoneRef`] - one grid cell of a sector, the unit of active simulation
//! - [`ObjectRef`] - a simulated entity
//! - [`ViewRef`] - a remote observer
//! - [`NodeRef`] / [`ModuleRef`] - indices into one object's attachment graph

use serde::{Deserialize, Serialize};
use std::fmt;

pub type SectorId = u32;
pub type ObjectId = u32;
pub type ViewId = u32;

/// Reference to a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectorRef {
    pub sector_id: SectorId,
}

impl SectorRef {
    pub fn new(sector_id: SectorId) -> Self {
        Self { sector_id }
    }
}

impl fmt::Display for SectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector:{}", self.sector_id)
    }
}

/// Integer grid cell of a zone inside its sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct ZoneCoord {
    pub x: i32,
    pub y: i32,
}

impl ZoneCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the cell containing a world position for square cells of
    /// `zone_size` units. Positions on a cell's lower edge belong to it.
    pub fn containing(pos: Vec2d, zone_size: f64) -> Self {
        let cell = |v: f64| {
            let c = (v / zone_size).floor();
            c.clamp(i32::MIN as f64, i32::MAX as f64) as i32
        };
        Self {
            x: cell(pos.x),
            y: cell(pos.y),
        }
    }
}

impl fmt::Display for ZoneCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Reference to one zone: its sector plus its grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneRef {
    pub sector_id: SectorId,
    pub coord: ZoneCoord,
}

impl ZoneRef {
    pub const fn new(sector_id: SectorId, coord: ZoneCoord) -> Self {
        Self { sector_id, coord }
    }

    pub fn sector(&self) -> SectorRef {
        SectorRef::new(self.sector_id)
    }
}

impl fmt::Display for ZoneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone:{}{}", self.sector_id, self.coord)
    }
}

/// Reference to a simulated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
}

impl ObjectRef {
    pub const fn new(object_id: ObjectId) -> Self {
        Self { object_id }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object:{}", self.object_id)
    }
}

/// Reference to a remote observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewRef {
    pub view_id: ViewId,
}

impl ViewRef {
    pub const fn new(view_id: ViewId) -> Self {
        Self { view_id }
    }
}

impl fmt::Display for ViewRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view:{}", self.view_id)
    }
}

/// Index of a node inside one object's node sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRef {
    pub object: ObjectRef,
    pub node_index: u16,
}

/// Index of a module inside one object's module sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleRef {
    pub object: ObjectRef,
    pub module_index: u16,
}

/// 2D vector. Double precision because world positions span a large range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl Vec2d {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// 2D vector in single precision, used for velocities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2f {
    pub x: f32,
    pub y: f32,
}

impl Vec2f {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}
