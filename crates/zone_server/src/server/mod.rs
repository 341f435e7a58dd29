//! Zone server state machine.
//!
//! `core` holds the struct and the frame loop, `handlers` the inbound
//! contracts and `admission` the creation of new objects.

pub mod admission;
pub mod core;
pub mod handlers;

pub use admission::AdmissionFailure;
pub use self::core::{frame_period, ZoneServer, MAX_ZONE_SPEED};
