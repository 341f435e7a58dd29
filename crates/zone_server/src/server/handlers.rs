//! Inbound contracts of the zone server.
//!
//! Every call is an idempotent upsert or removal. Unknown ids are tolerated
//! and logged; nothing here fails the caller.

use crate::data::{PendingControl, ViewMeta, ZoneMeta, ZoneOwner};
use crate::server::core::ZoneServer;
use crate::sim::Sim;
use tracing::{debug, info, trace, warn};
use zone_protocol::{
    ControlError, ControlFrame, ObjectData, ObjectRef, SectorData, SectorRef, SectorToZoneServer, ViewData,
    ViewRef, ViewToZoneServer, ZoneData, ZoneRef, ZoneToSectorHandle, ZoneToViewHandle, ZoneToZoneHandle,
    ZoneToZoneServer,
};

impl ZoneServer {
    /// Authoritative write of an object arriving from the sector or a peer.
    fn write_object(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) {
        if let Err(error) = data.validate(object) {
            warn!("Ignoring update of {}: {}", object, error);
            return;
        }

        if self.data.objects.upsert(object, zone, data.clone()) {
            debug!("{} is now resident in {}", object, zone);
        }

        match self.data.zone(zone).map(|meta| meta.owner.is_local()) {
            Some(false) => self.hand_off(object, zone),
            _ => self.data.notify_watchers_update(object, zone, &data),
        }
    }

    fn drop_object(&mut self, sector: SectorRef, object: ObjectRef) {
        match self.data.objects.zone_of(object) {
            Some(zone) if zone.sector_id == sector.sector_id => {
                self.data.evict(object);
                debug!("Removed {} from {}", object, zone);
            }
            Some(zone) => debug!("Ignoring removal of {} from {}: it lives in {}", object, sector, zone),
            None => {
                if self.cancel_admission(sector, object) {
                    debug!("Cancelled admission of {}", object);
                } else {
                    debug!("Ignoring removal of unknown {}", object);
                }
            }
        }
    }

    /// Validates a control frame and queues it on the object.
    ///
    /// # Returns
    ///
    /// The reason the frame was refused. A refused frame changes nothing.
    pub fn accept_control(&mut self, view: ViewRef, object: ObjectRef, frame: &ControlFrame) -> Result<(), ControlError> {
        if !self.data.views.contains_key(&view.view_id) {
            return Err(ControlError::UnknownView(view.view_id));
        }
        let zone = self
            .data
            .objects
            .zone_of(object)
            .ok_or(ControlError::UnknownObject(object))?;
        let inputs = frame.decode(self.config.max_control_inputs)?;
        let now = self.data.zone(zone).map_or(0, |meta| meta.sim.timestamp());
        let window = self.config.control_window_us;

        let resident = self
            .data
            .objects
            .get_mut(object)
            .ok_or(ControlError::UnknownObject(object))?;
        if let Some(last) = resident.last_control {
            if frame.timestamp <= last {
                return Err(ControlError::OutOfOrder {
                    timestamp: frame.timestamp,
                    last,
                });
            }
        }
        if frame.timestamp.saturating_add(window) < now {
            return Err(ControlError::Stale {
                timestamp: frame.timestamp,
                now,
            });
        }

        resident.last_control = Some(frame.timestamp);
        resident.controls.push_back(PendingControl {
            timestamp: frame.timestamp,
            inputs,
        });
        Ok(())
    }
}

impl SectorToZoneServer for ZoneServer {
    fn update_sector_info(&mut self, sector: SectorRef, isector: ZoneToSectorHandle, sector_data: SectorData) {
        let meta = self.data.sectors.entry(sector.sector_id).or_default();
        meta.isector = Some(isector);
        meta.sector_data = sector_data;
        debug!("Updated {} (seed {})", sector, sector_data.seed);
    }

    fn remove_sector_info(&mut self, sector: SectorRef) {
        let Some(meta) = self.data.sectors.remove(&sector.sector_id) else {
            debug!("Ignoring removal of unknown {}", sector);
            return;
        };
        let residents = self.data.objects.in_sector(sector.sector_id);
        for object in &residents {
            self.data.evict(*object);
        }
        info!(
            "🗑️ Removed {} with {} zones and {} resident objects",
            sector,
            meta.zones.len(),
            residents.len()
        );
    }

    fn update_zone_info(&mut self, zone: ZoneRef, owner: Option<ZoneToZoneHandle>, zone_data: ZoneData) {
        let sim_fps = self.config.sim_fps;
        let sector = self.data.sectors.entry(zone.sector_id).or_default();
        let owner = ZoneOwner::from(owner);
        let local = owner.is_local();

        match sector.zones.get_mut(&zone.coord) {
            Some(meta) => {
                meta.owner = owner;
                meta.zone_data = zone_data;
            }
            None => {
                sector.zones.insert(
                    zone.coord,
                    ZoneMeta {
                        owner,
                        zone_data,
                        sim: Sim::new(sim_fps),
                    },
                );
            }
        }
        debug!("Updated {} (local: {}, speed {})", zone, local, zone_data.speed);

        if !local {
            let residents = self.data.objects.in_zone(zone);
            if !residents.is_empty() {
                for object in &residents {
                    self.hand_off(*object, zone);
                }
                info!("🔀 Drained {} objects of {} to its new owner", residents.len(), zone);
            }
        }
    }

    fn remove_zone_info(&mut self, zone: ZoneRef) {
        let removed = self
            .data
            .sectors
            .get_mut(&zone.sector_id)
            .and_then(|sector| sector.zones.remove(&zone.coord));
        if removed.is_none() {
            debug!("Ignoring removal of unknown {}", zone);
        }
        let residents = self.data.objects.in_zone(zone);
        for object in &residents {
            self.data.evict(*object);
        }
        if !residents.is_empty() {
            info!("Removed {} with {} resident objects", zone, residents.len());
        }
    }

    fn update_view_info(&mut self, view: ViewRef, iview: ZoneToViewHandle, view_data: ViewData) {
        self.data.views.insert(view.view_id, ViewMeta { iview, view_data });
        debug!("Updated {}", view);
    }

    fn remove_view_info(&mut self, view: ViewRef) {
        if self.data.views.remove(&view.view_id).is_none() {
            debug!("Ignoring removal of unknown {}", view);
            return;
        }
        self.data.watches.retain(|_, views| {
            views.remove(&view.view_id);
            !views.is_empty()
        });
        debug!("Removed {}", view);
    }

    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.write_object(object, zone, object_data);
    }

    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef) {
        self.drop_object(sector, object);
    }
}

impl ZoneToZoneServer for ZoneServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        trace!("Receiving {} from a peer", object);
        self.write_object(object, zone, object_data);
    }

    fn remove_object(&mut self, sector: SectorRef, object: ObjectRef) {
        self.drop_object(sector, object);
    }
}

impl ViewToZoneServer for ZoneServer {
    fn update_watch(&mut self, view: ViewRef, object: ObjectRef, distance: f32) {
        let Some(meta) = self.data.views.get(&view.view_id) else {
            warn!("Ignoring watch of {} by unknown {}", object, view);
            return;
        };
        if !distance.is_finite() || distance < 0.0 || distance > meta.view_data.max_watch_distance {
            warn!(
                "Ignoring watch of {} by {}: distance {} outside [0, {}]",
                object, view, distance, meta.view_data.max_watch_distance
            );
            return;
        }
        let Some(resident) = self.data.objects.get(object) else {
            debug!("Ignoring watch of {} by {}: not resident", object, view);
            return;
        };
        let zone = resident.zone;
        let data = resident.data.clone();

        self.data
            .watches
            .entry(object.object_id)
            .or_default()
            .insert(view.view_id, distance);
        if let Some(meta) = self.data.views.get_mut(&view.view_id) {
            meta.iview.update_object(object, zone, data);
        }
        debug!("{} watches {} at distance {}", view, object, distance);
    }

    fn remove_watch(&mut self, view: ViewRef, object: ObjectRef) {
        let Some(views) = self.data.watches.get_mut(&object.object_id) else {
            return;
        };
        views.remove(&view.view_id);
        if views.is_empty() {
            self.data.watches.remove(&object.object_id);
        }
        debug!("{} no longer watches {}", view, object);
    }

    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame) {
        match self.accept_control(view, object, &frame) {
            Ok(()) => trace!("Queued control frame {} for {}", frame.timestamp, object),
            Err(error) => warn!("Rejected control of {} from {}: {}", object, view, error),
        }
    }
}
