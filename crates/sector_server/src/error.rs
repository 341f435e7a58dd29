//! Error types for sector operations.
//!
//! These cover the operator-facing calls (assignment, handoff, placing
//! objects). Notifications from zones and views never fail; they are logged
//! and dropped instead.

use zone_protocol::{ObjectDataError, ObjectRef, SectorId, ViewRef, ZoneCoord};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SectorError {
    /// No zone server is attached under this index
    #[error("unknown zone server {0}")]
    UnknownZoneServer(u32),

    /// No view server is attached under this index
    #[error("unknown view server {0}")]
    UnknownViewServer(u32),

    #[error("{0} is not registered")]
    UnknownView(ViewRef),

    #[error("{0} is not known to this sector")]
    UnknownObject(ObjectRef),

    #[error("zone {0} is not assigned to a zone server")]
    ZoneNotAssigned(ZoneCoord),

    /// Moving an assigned zone requires a handoff
    #[error("zone {coord} is already run by zone server {server}")]
    ZoneAlreadyAssigned { coord: ZoneCoord, server: u32 },

    #[error("zone {0} is being handed to another zone server")]
    ZoneDraining(ZoneCoord),

    #[error("zone {0} has no handoff in progress")]
    NotDraining(ZoneCoord),

    #[error("zone {coord} is already run by zone server {server}")]
    SameServer { coord: ZoneCoord, server: u32 },

    #[error("sector {expected} cannot hold an object of sector {actual}")]
    WrongSector { expected: SectorId, actual: SectorId },

    #[error("invalid object data: {0}")]
    InvalidObject(#[from] ObjectDataError),

    #[error("invalid configuration: {0}")]
    Config(String),
}
