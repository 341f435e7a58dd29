//! # Tagged Messages
//!
//! One enum variant per contract method, so a contract call can be queued,
//! carried to another task and replayed on the callee with `dispatch`. The
//! per-role envelopes (`ZoneInbound`, `SectorInbound`, `ViewInbound`) merge the
//! contracts one role receives into the single inbox its event loop drains.

use crate::admission::AdmissionReply;
use crate::control::ControlFrame;
use crate::data::{ObjectData, SectorData, ViewData, ZoneData};
use crate::interfaces::*;
use crate::types::{ObjectRef, SectorRef, ViewRef, ZoneRef};

pub enum SectorToZoneMessage {
    UpdateSectorInfo { sector: SectorRef, isector: ZoneToSectorHandle, sector_data: SectorData },
    RemoveSectorInfo { sector: SectorRef },
    UpdateZoneInfo { zone: ZoneRef, owner: Option<ZoneToZoneHandle>, zone_data: ZoneData },
    RemoveZoneInfo { zone: ZoneRef },
    UpdateViewInfo { view: ViewRef, iview: ZoneToViewHandle, view_data: ViewData },
    RemoveViewInfo { view: ViewRef },
    UpdateObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData },
    RemoveObject { sector: SectorRef, object: ObjectRef },
}

impl SectorToZoneMessage {
    pub fn dispatch<T: SectorToZoneServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::UpdateSectorInfo { sector, isector, sector_data } => {
                target.update_sector_info(sector, isector, sector_data)
            }
            Self::RemoveSectorInfo { sector } => target.remove_sector_info(sector),
            Self::UpdateZoneInfo { zone, owner, zone_data } => target.update_zone_info(zone, owner, zone_data),
            Self::RemoveZoneInfo { zone } => target.remove_zone_info(zone),
            Self::UpdateViewInfo { view, iview, view_data } => target.update_view_info(view, iview, view_data),
            Self::RemoveViewInfo { view } => target.remove_view_info(view),
            Self::UpdateObject { object, zone, object_data } => target.update_object(object, zone, object_data),
            Self::RemoveObject { sector, object } => target.remove_object(sector, object),
        }
    }
}

pub enum ZoneToSectorMessage {
    AddObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData, reply: AdmissionReply },
    UpdateObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData },
    RemoveObject { object: ObjectRef },
}

impl ZoneToSectorMessage {
    pub fn dispatch<T: ZoneToSectorServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::AddObject { object, zone, object_data, reply } => target.add_object(object, zone, object_data, reply),
            Self::UpdateObject { object, zone, object_data } => target.update_object(object, zone, object_data),
            Self::RemoveObject { object } => target.remove_object(object),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ZoneToZoneMessage {
    UpdateObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData },
    RemoveObject { sector: SectorRef, object: ObjectRef },
}

impl ZoneToZoneMessage {
    pub fn dispatch<T: ZoneToZoneServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::UpdateObject { object, zone, object_data } => target.update_object(object, zone, object_data),
            Self::RemoveObject { sector, object } => target.remove_object(sector, object),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ZoneToViewMessage {
    UpdateObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData },
    RemoveObject { object: ObjectRef },
}

impl ZoneToViewMessage {
    pub fn dispatch<T: ZoneToViewServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::UpdateObject { object, zone, object_data } => target.update_object(object, zone, object_data),
            Self::RemoveObject { object } => target.remove_object(object),
        }
    }
}

#[derive(Debug, Clone)]
pub enum SectorToViewMessage {
    UpdateObject { object: ObjectRef, zone: ZoneRef, object_data: ObjectData },
    RemoveObject { object: ObjectRef },
    ZoneReassigned { zone: ZoneRef, server_index: u32 },
}

impl SectorToViewMessage {
    pub fn dispatch<T: SectorToViewServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::UpdateObject { object, zone, object_data } => target.update_object(object, zone, object_data),
            Self::RemoveObject { object } => target.remove_object(object),
            Self::ZoneReassigned { zone, server_index } => target.zone_reassigned(zone, server_index),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ViewToZoneMessage {
    UpdateWatch { view: ViewRef, object: ObjectRef, distance: f32 },
    RemoveWatch { view: ViewRef, object: ObjectRef },
    ControlObject { view: ViewRef, object: ObjectRef, frame: ControlFrame },
}

impl ViewToZoneMessage {
    pub fn dispatch<T: ViewToZoneServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::UpdateWatch { view, object, distance } => target.update_watch(view, object, distance),
            Self::RemoveWatch { view, object } => target.remove_watch(view, object),
            Self::ControlObject { view, object, frame } => target.control_object(view, object, frame),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ViewToSectorMessage {
    WatchObject { view: ViewRef, object: ObjectRef, distance: f32 },
    UnwatchObject { view: ViewRef, object: ObjectRef },
    ControlObject { view: ViewRef, object: ObjectRef, frame: ControlFrame },
}

impl ViewToSectorMessage {
    pub fn dispatch<T: ViewToSectorServer + ?Sized>(self, target: &mut T) {
        match self {
            Self::WatchObject { view, object, distance } => target.watch_object(view, object, distance),
            Self::UnwatchObject { view, object } => target.unwatch_object(view, object),
            Self::ControlObject { view, object, frame } => target.control_object(view, object, frame),
        }
    }
}

/// Inbox of a zone server.
pub enum ZoneInbound {
    FromSector(SectorToZoneMessage),
    FromView(ViewToZoneMessage),
    FromZone(ZoneToZoneMessage),
}

impl ZoneInbound {
    pub fn dispatch<T>(self, target: &mut T)
    where
        T: SectorToZoneServer + ViewToZoneServer + ZoneToZoneServer,
    {
        match self {
            Self::FromSector(message) => message.dispatch(target),
            Self::FromView(message) => message.dispatch(target),
            Self::FromZone(message) => message.dispatch(target),
        }
    }
}

impl From<SectorToZoneMessage> for ZoneInbound {
    fn from(message: SectorToZoneMessage) -> Self {
        Self::FromSector(message)
    }
}

impl From<ViewToZoneMessage> for ZoneInbound {
    fn from(message: ViewToZoneMessage) -> Self {
        Self::FromView(message)
    }
}

impl From<ZoneToZoneMessage> for ZoneInbound {
    fn from(message: ZoneToZoneMessage) -> Self {
        Self::FromZone(message)
    }
}

/// Inbox of a sector server.
pub enum SectorInbound {
    FromZone(ZoneToSectorMessage),
    FromView(ViewToSectorMessage),
}

impl SectorInbound {
    pub fn dispatch<T>(self, target: &mut T)
    where
        T: ZoneToSectorServer + ViewToSectorServer,
    {
        match self {
            Self::FromZone(message) => message.dispatch(target),
            Self::FromView(message) => message.dispatch(target),
        }
    }
}

impl From<ZoneToSectorMessage> for SectorInbound {
    fn from(message: ZoneToSectorMessage) -> Self {
        Self::FromZone(message)
    }
}

impl From<ViewToSectorMessage> for SectorInbound {
    fn from(message: ViewToSectorMessage) -> Self {
        Self::FromView(message)
    }
}

/// Inbox of a view server.
#[derive(Debug, Clone)]
pub enum ViewInbound {
    FromZone(ZoneToViewMessage),
    FromSector(SectorToViewMessage),
}

impl ViewInbound {
    pub fn dispatch<T>(self, target: &mut T)
    where
        T: ZoneToViewServer + SectorToViewServer,
    {
        match self {
            Self::FromZone(message) => message.dispatch(target),
            Self::FromSector(message) => message.dispatch(target),
        }
    }
}

impl From<ZoneToViewMessage> for ViewInbound {
    fn from(message: ZoneToViewMessage) -> Self {
        Self::FromZone(message)
    }
}

impl From<SectorToViewMessage> for ViewInbound {
    fn from(message: SectorToViewMessage) -> Self {
        Self::FromSector(message)
    }
}
