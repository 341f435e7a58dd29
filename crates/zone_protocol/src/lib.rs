//! # Zone Protocol
//!
//! Shared vocabulary of the sector/zone/view backplane: identifiers, the
//! object data model, and the contracts the three server roles expose to each
//! other.
//!
//! ## Roles
//!
//! * **Sector** - durable owner of objects and of the zone to zone-server
//!   assignment of one sector
//! * **Zone server** - runs the simulation of the zones assigned to it and is
//!   the only role allowed to mutate the objects resident in them
//! * **View server** - keeps interest-managed replicas for remote observers
//!
//! ## Transport
//!
//! Contracts are plain traits ([`interfaces`]). A colocated caller may call a
//! server directly; a [`channel::ChannelHandle`] implements the same traits by
//! queueing tagged [`messages`] onto the callee's inbox, so the roles never
//! need to know which one they hold.

pub mod admission;
pub mod channel;
pub mod control;
pub mod data;
pub mod error;
pub mod interfaces;
pub mod messages;
pub mod shutdown;
pub mod types;

pub use admission::{admission_channel, AddObjectReply, AdmissionReply, AdmissionResult, AdmissionTicket};
pub use channel::{inbox, ChannelHandle};
pub use control::{ControlAxis, ControlFrame, ControlInput};
pub use data::*;
pub use error::{AdmissionError, ControlError, ObjectDataError};
pub use interfaces::*;
pub use messages::*;
pub use shutdown::ShutdownState;
pub use types::*;
