//! # View Server
//!
//! Hosts the views of remote observers. Each view keeps a watch list; the
//! zone server owning a watched object pushes its state here, and the view
//! server forwards the latest state of every watched object to the client
//! connections through a [`ClientSink`].
//!
//! Delivery is latest-state: while an update waits in the
//! [`DeliveryQueue`], a newer update or a removal for the same object takes
//! its place, so a slow client never receives stale intermediate states.
//!
//! Watch and control requests go through the sector, which knows which zone
//! server runs each object. When an object changes zone, or the sector moves
//! a zone to another zone server, the view server re-issues its watches.

pub use config::ViewServerConfig;
pub use delivery::{Delivery, DeliveryQueue};
pub use error::ViewError;
pub use server::{Replica, ViewEntry, ViewServer};
pub use sink::{BufferedSink, ClientSink};

pub mod config;
pub mod delivery;
pub mod error;
pub mod server;
pub mod sink;
