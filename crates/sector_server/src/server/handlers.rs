//! Inbound contracts of the sector.
//!
//! Zone servers report object state here; view servers ask for watches and
//! send control frames, which are relayed to the zone server running the
//! object's zone.

use crate::server::core::SectorServer;
use tracing::{debug, info, warn};
use zone_protocol::{
    AdmissionReply, ControlFrame, ObjectData, ObjectRef, ViewRef, ViewToSectorServer, ViewToZoneHandle, ZoneRef,
    ZoneToSectorServer,
};

impl SectorServer {
    /// The relay handle of the zone server running `object`'s zone.
    fn relay_for(&mut self, object: ObjectRef) -> Option<&mut ViewToZoneHandle> {
        let Some(record) = self.objects.get(&object.object_id) else {
            debug!("{}: no record of {}", self.sector, object);
            return None;
        };
        let coord = record.zone.coord;
        let Some(owner) = self.zone_to_server.get(&coord) else {
            debug!("{}: zone of {} is not assigned", self.sector, object);
            return None;
        };
        self.zone_servers.get_mut(owner).map(|link| &mut link.from_view)
    }
}

impl ZoneToSectorServer for SectorServer {
    fn add_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData, reply: AdmissionReply) {
        match self.admit_object(object, zone, object_data) {
            Ok(accepted) => {
                info!(
                    "✅ {} admitted {} into {} ({} objects)",
                    self.sector, object, zone, accepted.sector_population
                );
                reply.accept(accepted);
            }
            Err(error) => {
                warn!("❌ {} refused {} into {}: {}", self.sector, object, zone, error);
                reply.reject(error);
            }
        }
    }

    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        if zone.sector_id != self.sector.sector_id {
            warn!("{} ignoring update of {} for foreign {}", self.sector, object, zone);
            return;
        }
        match self.objects.get_mut(&object.object_id) {
            Some(record) => {
                record.zone = zone;
                record.data = object_data;
            }
            None => debug!("{} ignoring update of unknown {}", self.sector, object),
        }
    }

    fn remove_object(&mut self, object: ObjectRef) {
        if self.objects.remove(&object.object_id).is_none() {
            debug!("{} ignoring removal of unknown {}", self.sector, object);
            return;
        }
        self.forward_removal(object);
        debug!("{} removed {}", self.sector, object);
    }
}

impl ViewToSectorServer for SectorServer {
    fn watch_object(&mut self, view: ViewRef, object: ObjectRef, distance: f32) {
        if let Some(relay) = self.relay_for(object) {
            relay.update_watch(view, object, distance);
        }
    }

    fn unwatch_object(&mut self, view: ViewRef, object: ObjectRef) {
        if let Some(relay) = self.relay_for(object) {
            relay.remove_watch(view, object);
        }
    }

    fn control_object(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame) {
        if let Some(relay) = self.relay_for(object) {
            relay.control_object(view, object, frame);
        }
    }
}
