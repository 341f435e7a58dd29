//! Channel-backed contract handles.
//!
//! A [`ChannelHandle`] turns every contract call into a tagged message pushed
//! onto the callee's inbox. Messages from one handle arrive in the order they
//! were sent, which gives the per source/object FIFO guarantee. A closed inbox
//! means the callee is gone; the call is dropped and logged, like any other
//! undeliverable notification.

use crate::admission::AdmissionReply;
use crate::control::ControlFrame;
use crate::data::{ObjectData, SectorData, ViewData, ZoneData};
use crate::interfaces::*;
use crate::messages::*;
use crate::types::{ObjectRef, SectorRef, ViewRef, ZoneRef};
use tokio::sync::mpsc;
use tracing::debug;

/// Sending side of a role's inbox.
pub struct ChannelHandle<E> {
    sender: mpsc::UnboundedSender<E>,
}

impl<E> Clone for ChannelHandle<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

/// Creates an inbox and the handle feeding it.
pub fn inbox<E>() -> (ChannelHandle<E>, mpsc::UnboundedReceiver<E>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelHandle { sender }, receiver)
}

impl<E: Send + 'static> ChannelHandle<E> {
    pub fn send<M: Into<E>>(&self, message: M) {
        if self.sender.send(message.into()).is_err() {
            debug!("Dropping message: inbox closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub fn zone_to_sector_connector(&self) -> ZoneToSectorConnector
    where
        E: From<ZoneToSectorMessage>,
    {
        let handle = self.clone();
        Box::new(move || Box::new(handle.clone()) as ZoneToSectorHandle)
    }

    pub fn zone_to_zone_connector(&self) -> ZoneToZoneConnector
    where
        E: From<ZoneToZoneMessage>,
    {
        let handle = self.clone();
        Box::new(move || Box::new(handle.clone()) as ZoneToZoneHandle)
    }

    pub fn zone_to_view_connector(&self) -> ZoneToViewConnector
    where
        E: From<ZoneToViewMessage>,
    {
        let handle = self.clone();
        Box::new(move || Box::new(handle.clone()) as ZoneToViewHandle)
    }
}

impl<E> SectorToZoneServer for ChannelHandle<E>
where
    E: From<SectorToZoneMessage> + Send + 'static,
{
    fn update_sector_info(&mut self, sector: SectorRef, isector: ZoneToSectorHandle, sector_data: SectorData) {
        self.send(SectorToZoneMessage::UpdateSectorInfo { sector, isector, sector_data });
    }

    fn remove_sector_info(&mut self, sector: SectorRef) {
        self.send(SectorToZoneMessage::RemoveSectorInfo { sector });
    }

    fn update_zone_info(&mut self, zone: ZoneRef, owner: Option<ZoneToZoneHandle>, zone_data: ZoneData) {
        self.send(SectorToZoneMessage::UpdateZoneInfo { zone, owner, zone_data });
    }

    fn remove_zone_info(&mut self, zone: ZoneRef) {
        self.send(SectorToZoneMessage::RemoveZoneInfo { zone });
    }

    fn update_view_info(&mut self, view: ViewRef, iview: ZoneToViewHandle, view_data: ViewData) {
        self.send(SectorToZoneMessage::UpdateViewInfo { view, iview, view_data });
    }

    fn remove_view_info(&mut self, view: ViewRef) {
        self.send(SectorToZoneMessage::RemoveViewInfo { view });
    }

    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.send(SectorToZoneMessage::UpdateObject { object, zone, object_data });
    }

    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef) {
        self.send(SectorToZoneMessage::RemoveObject { sector, object });
    }
}

impl<E> ZoneToSectorServer for ChannelHandle<E>
where
    E: From<ZoneToSectorMessage> + Send + 'static,
{
    fn add_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData, reply: AdmissionReply) {
        self.send(ZoneToSectorMessage::AddObject { object, zone, object_data, reply });
    }

    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.send(ZoneToSectorMessage::UpdateObject { object, zone, object_data });
    }

    fn remove_object(&mut self, object: ObjectRef) {
        self.send(ZoneToSectorMessage::RemoveObject { object });
    }
}

impl<E> ZoneToZoneServer for ChannelHandle<E>
where
    E: From<ZoneToZoneMessage> + Send + 'static,
{
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.send(ZoneToZoneMessage::UpdateObject { object, zone, object_data });
    }

    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef) {
        self.send(ZoneToZoneMessage::RemoveObject { sector, object });
    }
}

impl<E> ZoneToViewServer for ChannelHandle<E>
where
    E: From<ZoneToViewMessage> + Send + 'static,
{
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.send(ZoneToViewMessage::UpdateObject { object, zone, object_data });
    }

    fn remove_object(&mut self, object: ObjectRef) {
        self.send(ZoneToViewMessage::RemoveObject { object });
    }
}

impl<E> SectorToViewServer for ChannelHandle<E>
where
    E: From<SectorToViewMessage> + Send + 'static,
{
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.send(SectorToViewMessage::UpdateObject { object, zone, object_data });
    }

    fn remove_object(&mut self, object: ObjectRef) {
        self.send(SectorToViewMessage::RemoveObject { object });
    }

    fn zone_reassigned(&mut self, zone: ZoneRef, server_index: u32) {
        self.send(SectorToViewMessage::ZoneReassigned { zone, server_index });
    }
}

impl<E> ViewToZoneServer for ChannelHandle<E>
where
    E: From<ViewToZoneMessage> + Send + 'static,
{
    fn update_watch(&mut self, view: ViewRef, object: ObjectRef, distance: f32) {
        self.send(ViewToZoneMessage::UpdateWatch { view, object, distance });
    }

    fn remove_watch(&mut self, view: ViewRef, object: ObjectRef) {
        self.send(ViewToZoneMessage::RemoveWatch { view, object });
    }

    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame) {
        self.send(ViewToZoneMessage::ControlObject { view, object, frame });
    }
}

impl<E> ViewToSectorServer for ChannelHandle<E>
where
    E: From<ViewToSectorMessage> + Send + 'static,
{
    fn watch_object(&mut self, view: ViewRef, object: ObjectRef, distance: f32) {
        self.send(ViewToSectorMessage::WatchObject { view, object, distance });
    }

    fn unwatch_object(&mut self, view: ViewRef, object: ObjectRef) {
        self.send(ViewToSectorMessage::UnwatchObject { view, object });
    }

    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame) {
        self.send(ViewToSectorMessage::ControlObject { view, object, frame });
    }
}
