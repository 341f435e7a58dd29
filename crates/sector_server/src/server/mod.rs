//! Sector state machine.
//!
//! `core` holds the struct, registries and object placement, `assignment`
//! the zone map and handoffs, `admission` the admission policy and
//! `handlers` the inbound contracts.

pub mod admission;
pub mod assignment;
pub mod core;
pub mod handlers;

pub use self::core::{ObjectRecord, SectorServer, ViewRegistration};
