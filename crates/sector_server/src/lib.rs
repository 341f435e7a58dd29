//! # Sector Server
//!
//! Durable owner of one sector's objects and of the decision which zone
//! server runs which zone.
//!
//! ## Responsibilities
//!
//! * **Location index** - every admitted object's zone and last reported
//!   state, kept current by the zone servers' `update_object` calls
//! * **Assignment** - the `zone_to_server` map pins each zone coordinate to
//!   one attached zone server; moving a zone goes through
//!   [`SectorServer::begin_zone_handoff`] and
//!   [`SectorServer::complete_zone_handoff`]
//! * **Admission** - zone servers ask before a new object becomes resident;
//!   the decision travels back through the request's reply channel
//! * **Views** - registered views are announced to every zone server, and
//!   watch or control requests are relayed to the zone server owning the
//!   object

pub use config::SectorConfig;
pub use error::SectorError;
pub use server::{ObjectRecord, SectorServer, ViewRegistration};

pub mod config;
pub mod error;
pub mod server;
