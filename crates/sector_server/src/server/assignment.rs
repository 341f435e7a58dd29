//! Zone to zone-server assignment and controlled handoff.
//!
//! A zone is pinned to exactly one zone server. Moving it happens in two
//! steps: `begin_zone_handoff` stops admissions and lets the old owner drain
//! its residents into the new one, `complete_zone_handoff` flips the
//! assignment and tells everyone else.

use crate::error::SectorError;
use crate::server::core::SectorServer;
use tracing::info;
use zone_protocol::{ObjectRef, ZoneCoord, ZoneData};

impl SectorServer {
    /// Pins an unassigned zone to a zone server, or updates the zone data of
    /// a zone already run by that server.
    pub fn assign_zone(&mut self, coord: ZoneCoord, index: u32, zone_data: ZoneData) -> Result<(), SectorError> {
        if !self.zone_servers.contains_key(&index) {
            return Err(SectorError::UnknownZoneServer(index));
        }
        if self.draining.contains_key(&coord) {
            return Err(SectorError::ZoneDraining(coord));
        }
        if let Some(&server) = self.zone_to_server.get(&coord) {
            if server != index {
                return Err(SectorError::ZoneAlreadyAssigned { coord, server });
            }
        }

        let newly_assigned = self.zone_to_server.insert(coord, index).is_none();
        self.zones.insert(coord, zone_data);
        self.broadcast_zone(coord, index, zone_data);

        if newly_assigned {
            // Objects kept on record while the zone had no server.
            let zone = self.zone_ref(coord);
            let residents: Vec<_> = self
                .objects
                .iter()
                .filter(|(_, record)| record.zone == zone)
                .map(|(id, record)| (*id, record.data.clone()))
                .collect();
            if let Some(link) = self.zone_servers.get_mut(&index) {
                for (id, data) in residents {
                    link.to_zone.update_object(ObjectRef::new(id), zone, data);
                }
            }
            info!("📍 {} assigned to zone server {}", zone, index);
        }
        Ok(())
    }

    /// Takes a zone away from every zone server. Its objects stay on record.
    pub fn unassign_zone(&mut self, coord: ZoneCoord) -> Result<(), SectorError> {
        if self.zone_to_server.remove(&coord).is_none() {
            return Err(SectorError::ZoneNotAssigned(coord));
        }
        self.zones.remove(&coord);
        self.draining.remove(&coord);

        let zone = self.zone_ref(coord);
        for link in self.zone_servers.values_mut() {
            link.to_zone.remove_zone_info(zone);
        }
        info!("{} unassigned", zone);
        Ok(())
    }

    /// Starts moving a zone to zone server `to`.
    ///
    /// New admissions into the zone are refused until the handoff completes.
    /// The new owner is told to run the zone before the old owner is told to
    /// give it away, so drained objects always find it running.
    pub fn begin_zone_handoff(&mut self, coord: ZoneCoord, to: u32) -> Result<(), SectorError> {
        let from = *self
            .zone_to_server
            .get(&coord)
            .ok_or(SectorError::ZoneNotAssigned(coord))?;
        if !self.zone_servers.contains_key(&to) {
            return Err(SectorError::UnknownZoneServer(to));
        }
        if from == to {
            return Err(SectorError::SameServer { coord, server: to });
        }
        if self.draining.contains_key(&coord) {
            return Err(SectorError::ZoneDraining(coord));
        }

        let zone = self.zone_ref(coord);
        let zone_data = self.zones.get(&coord).copied().unwrap_or_default();
        self.draining.insert(coord, to);

        if let Some(link) = self.zone_servers.get_mut(&to) {
            link.to_zone.update_zone_info(zone, None, zone_data);
        }
        let handle = self.owner_handle(to, from);
        if let Some(link) = self.zone_servers.get_mut(&from) {
            link.to_zone.update_zone_info(zone, handle, zone_data);
        }
        info!("🔀 Handoff of {} from zone server {} to {} started", zone, from, to);
        Ok(())
    }

    /// Finishes a handoff: flips the assignment, updates the remaining zone
    /// servers and tells every view server.
    pub fn complete_zone_handoff(&mut self, coord: ZoneCoord) -> Result<(), SectorError> {
        let to = self
            .draining
            .remove(&coord)
            .ok_or(SectorError::NotDraining(coord))?;
        let from = self.zone_to_server.insert(coord, to);

        let zone = self.zone_ref(coord);
        let zone_data = self.zones.get(&coord).copied().unwrap_or_default();
        let others: Vec<u32> = self
            .zone_servers
            .keys()
            .copied()
            .filter(|index| *index != to && Some(*index) != from)
            .collect();
        for index in others {
            let handle = self.owner_handle(to, index);
            if let Some(link) = self.zone_servers.get_mut(&index) {
                link.to_zone.update_zone_info(zone, handle, zone_data);
            }
        }
        for view_server in self.view_servers.values_mut() {
            view_server.to_view.zone_reassigned(zone, to);
        }
        info!("✅ Handoff of {} to zone server {} complete", zone, to);
        Ok(())
    }

    /// Tells every zone server who runs `coord`.
    fn broadcast_zone(&mut self, coord: ZoneCoord, owner: u32, zone_data: ZoneData) {
        let zone = self.zone_ref(coord);
        let recipients: Vec<u32> = self.zone_servers.keys().copied().collect();
        for index in recipients {
            let handle = self.owner_handle(owner, index);
            if let Some(link) = self.zone_servers.get_mut(&index) {
                link.to_zone.update_zone_info(zone, handle, zone_data);
            }
        }
    }
}
