//! # Zone Server
//!
//! Runs the active simulation of the zones a sector assigns to it.
//!
//! ## Responsibilities
//!
//! * **Tables** - sectors, their zones and the registered views, plus the
//!   arena of resident objects indexed by sector and zone
//! * **Frame loop** - [`ZoneServer::run_frame`] feeds each local zone's
//!   fixed-step [`Sim`] and returns when the next frame is due; falling too
//!   far behind halves the frame rate instead of simulating the backlog
//! * **Handoff** - objects that cross into a zone run by a peer are sent to
//!   that peer and forgotten; the sector and watching views are told
//! * **Admission** - new objects only become resident once their sector
//!   accepts them
//! * **Control** - validated client input frames are queued per object and
//!   applied by the simulation step they are due at
//!
//! The server implements the inbound contracts it receives
//! (`SectorToZoneServer`, `ZoneToZoneServer`, `ViewToZoneServer`) directly.
//! A single owner drives it, so no call ever runs concurrently with another.

pub use config::{ConfigError, ZoneServerConfig};
pub use server::{frame_period, AdmissionFailure, ZoneServer};
pub use sim::{Sim, SimFrame};
pub use utils::create_zone_server_with_config;

pub mod config;
pub mod data;
pub mod physics;
pub mod server;
pub mod sim;
pub mod utils;

mod tests;
