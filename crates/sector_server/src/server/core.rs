//! Core sector implementation.
//!
//! The sector is the durable owner of its objects. It records where every
//! admitted object lives, decides which zone server runs each zone and keeps
//! every attached zone server informed about the sector, its zones and the
//! registered views.

use crate::config::SectorConfig;
use crate::error::SectorError;
use std::collections::BTreeMap;
use tracing::{debug, info};
use zone_protocol::{
    ObjectData, ObjectId, ObjectRef, SectorData, SectorRef, ViewData, ViewId, ViewRef, ViewServerLink, ZoneCoord,
    ZoneData, ZoneRef, ZoneServerLink, ZoneToSectorConnector, ZoneToZoneHandle,
};

/// Durable record of one admitted object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub zone: ZoneRef,
    pub data: ObjectData,
}

/// A registered view and the view server hosting it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRegistration {
    pub view_server: u32,
    pub view_data: ViewData,
}

pub struct SectorServer {
    pub(crate) config: SectorConfig,
    pub(crate) sector: SectorRef,
    pub(crate) sector_data: SectorData,
    /// Mints the handles zone servers use to call this sector.
    pub(crate) connector: ZoneToSectorConnector,
    pub(crate) zone_servers: BTreeMap<u32, ZoneServerLink>,
    pub(crate) next_zone_server: u32,
    pub(crate) view_servers: BTreeMap<u32, ViewServerLink>,
    pub(crate) next_view_server: u32,
    /// Zone coordinate -> index of the zone server running it.
    pub(crate) zone_to_server: BTreeMap<ZoneCoord, u32>,
    pub(crate) zones: BTreeMap<ZoneCoord, ZoneData>,
    /// Zones being handed over -> index of the receiving zone server.
    pub(crate) draining: BTreeMap<ZoneCoord, u32>,
    pub(crate) objects: BTreeMap<ObjectId, ObjectRecord>,
    pub(crate) views: BTreeMap<ViewId, ViewRegistration>,
}

impl SectorServer {
    /// Creates a sector with no zone servers attached.
    ///
    /// # Arguments
    ///
    /// * `config` - Sector identity, seed and capacity
    /// * `connector` - Mints handles to this sector's inbox for zone servers
    pub fn new(config: SectorConfig, connector: ZoneToSectorConnector) -> Self {
        let sector = SectorRef::new(config.sector_id);
        let sector_data = config.sector_data();
        Self {
            config,
            sector,
            sector_data,
            connector,
            zone_servers: BTreeMap::new(),
            next_zone_server: 0,
            view_servers: BTreeMap::new(),
            next_view_server: 0,
            zone_to_server: BTreeMap::new(),
            zones: BTreeMap::new(),
            draining: BTreeMap::new(),
            objects: BTreeMap::new(),
            views: BTreeMap::new(),
        }
    }

    pub(crate) fn zone_ref(&self, coord: ZoneCoord) -> ZoneRef {
        ZoneRef::new(self.sector.sector_id, coord)
    }

    /// Handle telling `recipient` who runs a zone owned by `owner`: `None`
    /// when the recipient is the owner.
    pub(crate) fn owner_handle(&self, owner: u32, recipient: u32) -> Option<ZoneToZoneHandle> {
        if owner == recipient {
            return None;
        }
        self.zone_servers.get(&owner).map(|link| (link.peer)())
    }

    /// Starts delegating to a zone server and brings it up to date.
    ///
    /// # Returns
    ///
    /// The index the sector uses for this zone server from now on.
    pub fn attach_zone_server(&mut self, mut link: ZoneServerLink) -> u32 {
        let index = self.next_zone_server;
        self.next_zone_server += 1;

        link.to_zone
            .update_sector_info(self.sector, (self.connector)(), self.sector_data);
        for (view_id, registration) in &self.views {
            if let Some(view_server) = self.view_servers.get(&registration.view_server) {
                link.to_zone
                    .update_view_info(ViewRef::new(*view_id), (view_server.from_zone)(), registration.view_data);
            }
        }
        for (coord, owner) in &self.zone_to_server {
            let zone_data = self.zones.get(coord).copied().unwrap_or_default();
            let handle = self.zone_servers.get(owner).map(|owner_link| (owner_link.peer)());
            link.to_zone.update_zone_info(self.zone_ref(*coord), handle, zone_data);
        }

        self.zone_servers.insert(index, link);
        info!("🔗 {} attached zone server {}", self.sector, index);
        index
    }

    /// Stops delegating to a zone server. Its zones become unassigned; their
    /// objects stay on record and are pushed again once the zones are
    /// reassigned.
    pub fn detach_zone_server(&mut self, index: u32) -> Result<(), SectorError> {
        let mut link = self
            .zone_servers
            .remove(&index)
            .ok_or(SectorError::UnknownZoneServer(index))?;

        let orphaned: Vec<ZoneCoord> = self
            .zone_to_server
            .iter()
            .filter(|(_, owner)| **owner == index)
            .map(|(coord, _)| *coord)
            .collect();
        for coord in &orphaned {
            self.zone_to_server.remove(coord);
            self.zones.remove(coord);
            self.draining.remove(coord);
            let zone = self.zone_ref(*coord);
            for other in self.zone_servers.values_mut() {
                other.to_zone.remove_zone_info(zone);
            }
        }
        // Handoffs towards the detached server cannot complete.
        self.draining.retain(|_, to| *to != index);

        link.to_zone.remove_sector_info(self.sector);
        info!(
            "🔌 {} detached zone server {} ({} zones unassigned)",
            self.sector,
            index,
            orphaned.len()
        );
        Ok(())
    }

    /// Starts forwarding to a view server.
    pub fn attach_view_server(&mut self, link: ViewServerLink) -> u32 {
        let index = self.next_view_server;
        self.next_view_server += 1;
        self.view_servers.insert(index, link);
        info!("🔗 {} attached view server {}", self.sector, index);
        index
    }

    /// Stops forwarding to a view server and unregisters its views.
    pub fn detach_view_server(&mut self, index: u32) -> Result<(), SectorError> {
        self.view_servers
            .remove(&index)
            .ok_or(SectorError::UnknownViewServer(index))?;
        let hosted: Vec<ViewRef> = self
            .views
            .iter()
            .filter(|(_, registration)| registration.view_server == index)
            .map(|(view_id, _)| ViewRef::new(*view_id))
            .collect();
        for view in hosted {
            self.unregister_view(view)?;
        }
        info!("🔌 {} detached view server {}", self.sector, index);
        Ok(())
    }

    /// Registers a view hosted by `view_server` with every zone server.
    pub fn register_view(&mut self, view: ViewRef, view_server: u32, view_data: ViewData) -> Result<(), SectorError> {
        let link = self
            .view_servers
            .get(&view_server)
            .ok_or(SectorError::UnknownViewServer(view_server))?;
        for zone_server in self.zone_servers.values_mut() {
            zone_server
                .to_zone
                .update_view_info(view, (link.from_zone)(), view_data);
        }
        self.views.insert(
            view.view_id,
            ViewRegistration {
                view_server,
                view_data,
            },
        );
        debug!("{} registered {} on view server {}", self.sector, view, view_server);
        Ok(())
    }

    pub fn unregister_view(&mut self, view: ViewRef) -> Result<(), SectorError> {
        self.views
            .remove(&view.view_id)
            .ok_or(SectorError::UnknownView(view))?;
        for zone_server in self.zone_servers.values_mut() {
            zone_server.to_zone.remove_view_info(view);
        }
        debug!("{} unregistered {}", self.sector, view);
        Ok(())
    }

    /// Records a durable object and pushes it to the zone server running its
    /// zone.
    pub fn place_object(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) -> Result<(), SectorError> {
        if zone.sector_id != self.sector.sector_id {
            return Err(SectorError::WrongSector {
                expected: self.sector.sector_id,
                actual: zone.sector_id,
            });
        }
        data.validate(object)?;
        let owner = *self
            .zone_to_server
            .get(&zone.coord)
            .ok_or(SectorError::ZoneNotAssigned(zone.coord))?;

        self.objects.insert(
            object.object_id,
            ObjectRecord {
                zone,
                data: data.clone(),
            },
        );
        if let Some(link) = self.zone_servers.get_mut(&owner) {
            link.to_zone.update_object(object, zone, data);
        }
        debug!("{} placed {} in {}", self.sector, object, zone);
        Ok(())
    }

    /// Forgets a durable object and tells its zone server and the view
    /// servers.
    pub fn retire_object(&mut self, object: ObjectRef) -> Result<(), SectorError> {
        let record = self
            .objects
            .remove(&object.object_id)
            .ok_or(SectorError::UnknownObject(object))?;

        if let Some(owner) = self.zone_to_server.get(&record.zone.coord) {
            if let Some(link) = self.zone_servers.get_mut(owner) {
                link.to_zone.remove_object(self.sector, object);
            }
        }
        self.forward_removal(object);
        debug!("{} retired {}", self.sector, object);
        Ok(())
    }

    pub(crate) fn forward_removal(&mut self, object: ObjectRef) {
        for view_server in self.view_servers.values_mut() {
            view_server.to_view.remove_object(object);
        }
    }

    pub fn sector(&self) -> SectorRef {
        self.sector
    }

    pub fn config(&self) -> &SectorConfig {
        &self.config
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn has_object(&self, object: ObjectRef) -> bool {
        self.objects.contains_key(&object.object_id)
    }

    pub fn object(&self, object: ObjectRef) -> Option<&ObjectRecord> {
        self.objects.get(&object.object_id)
    }

    /// Zone the location index holds for `object`.
    pub fn object_zone(&self, object: ObjectRef) -> Option<ZoneRef> {
        self.objects.get(&object.object_id).map(|record| record.zone)
    }

    /// Index of the zone server running `coord`.
    pub fn zone_owner(&self, coord: ZoneCoord) -> Option<u32> {
        self.zone_to_server.get(&coord).copied()
    }

    pub fn is_draining(&self, coord: ZoneCoord) -> bool {
        self.draining.contains_key(&coord)
    }

    pub fn zone_server_count(&self) -> usize {
        self.zone_servers.len()
    }

    pub fn view_registration(&self, view: ViewRef) -> Option<ViewRegistration> {
        self.views.get(&view.view_id).copied()
    }
}
