//! # Cross-Role Contracts
//!
//! Each trait is the inbound surface one role exposes to another. A server
//! implements the traits it receives directly, so a colocated caller can hold
//! `&mut` to it; a remote caller holds a [`ChannelHandle`](crate::channel::ChannelHandle)
//! implementing the same trait. Methods are notifications: they return nothing
//! and the callee tolerates stale or duplicate calls.
//!
//! Handles are single-owner. A role receiving a handle (for example in
//! `update_sector_info`) keeps it until the entry is replaced or removed and
//! never shares it. [`Connector`]s mint fresh handles when a role needs to
//! give one away.

use crate::admission::AdmissionReply;
use crate::control::ControlFrame;
use crate::data::{ObjectData, SectorData, ViewData, ZoneData};
use crate::types::{ObjectRef, SectorRef, ViewRef, ZoneRef};

/// Calls a zone server receives from its sector.
pub trait SectorToZoneServer {
    fn update_sector_info(&mut self, sector: SectorRef, isector: ZoneToSectorHandle, sector_data: SectorData);
    fn remove_sector_info(&mut self, sector: SectorRef);

    /// `owner` is `None` when the receiving server runs the zone itself and
    /// names the peer that runs it otherwise.
    fn update_zone_info(&mut self, zone: ZoneRef, owner: Option<ZoneToZoneHandle>, zone_data: ZoneData);
    fn remove_zone_info(&mut self, zone: ZoneRef);

    fn update_view_info(&mut self, view: ViewRef, iview: ZoneToViewHandle, view_data: ViewData);
    fn remove_view_info(&mut self, view: ViewRef);

    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData);
    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef);
}

/// Calls a sector receives from the zone servers it delegates to.
pub trait ZoneToSectorServer {
    /// Asks the sector to admit a newly created object. The decision arrives
    /// through `reply`.
    fn add_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData, reply: AdmissionReply);
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData);
    fn remove_object(&mut self, object: ObjectRef);
}

/// Calls a zone server receives from a peer handing objects over.
pub trait ZoneToZoneServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData);
    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef);
}

/// Calls a view server receives from the zone owning a watched object.
pub trait ZoneToViewServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData);
    fn remove_object(&mut self, object: ObjectRef);
}

/// Calls a view server receives from a sector.
pub trait SectorToViewServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData);
    fn remove_object(&mut self, object: ObjectRef);
    /// `zone` is now run by zone server `server_index`.
    fn zone_reassigned(&mut self, zone: ZoneRef, server_index: u32);
}

/// Calls a zone server receives on behalf of a view.
pub trait ViewToZoneServer {
    fn update_watch(&mut self, view: ViewRef, object: ObjectRef, distance: f32);
    fn remove_watch(&mut self, view: ViewRef, object: ObjectRef);
    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame);
}

/// Calls a sector receives from a view server. The sector relays them to the
/// zone server owning the object.
pub trait ViewToSectorServer {
    fn watch_object(&mut self, view: ViewRef, object: ObjectRef, distance: f32);
    fn unwatch_object(&mut self, view: ViewRef, object: ObjectRef);
    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame);
}

pub type SectorToZoneHandle = Box<dyn SectorToZoneServer + Send>;
pub type ZoneToSectorHandle = Box<dyn ZoneToSectorServer + Send>;
pub type ZoneToZoneHandle = Box<dyn ZoneToZoneServer + Send>;
pub type ZoneToViewHandle = Box<dyn ZoneToViewServer + Send>;
pub type SectorToViewHandle = Box<dyn SectorToViewServer + Send>;
pub type ViewToZoneHandle = Box<dyn ViewToZoneServer + Send>;
pub type ViewToSectorHandle = Box<dyn ViewToSectorServer + Send>;

/// Mints a fresh single-owner handle to one role instance.
pub type Connector<H> = Box<dyn Fn() -> H + Send>;

pub type ZoneToSectorConnector = Connector<ZoneToSectorHandle>;
pub type ZoneToZoneConnector = Connector<ZoneToZoneHandle>;
pub type ZoneToViewConnector = Connector<ZoneToViewHandle>;

/// Everything a sector needs to drive one zone server.
pub struct ZoneServerLink {
    pub to_zone: SectorToZoneHandle,
    /// Used to relay watch and control requests from views.
    pub from_view: ViewToZoneHandle,
    /// Mints handles other zone servers use to hand objects to this one.
    pub peer: ZoneToZoneConnector,
}

/// Everything a sector needs to drive one view server.
pub struct ViewServerLink {
    pub to_view: SectorToViewHandle,
    /// Mints handles zone servers use to push object state to this one.
    pub from_zone: ZoneToViewConnector,
}
