//! # Zone Server Tables
//!
//! Sectors, their zones, registered views and the resident object arena.
//! Objects live in one map keyed by id; two index maps record sector and zone
//! membership. Every write to an object's location goes through
//! [`ObjectTable`], which keeps the indexes in step so an object is a member
//! of exactly one zone.

use crate::sim::Sim;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use zone_protocol::{
    ControlAxis, ObjectData, ObjectId, ObjectRef, SectorData, SectorId, ViewData, ViewId, ZoneCoord, ZoneData,
    ZoneRef, ZoneToSectorHandle, ZoneToViewHandle, ZoneToZoneHandle,
};

/// Who runs a zone this server knows about.
pub enum ZoneOwner {
    /// This server simulates the zone.
    Local,
    /// A peer does; objects entering the zone are handed to it.
    Peer(ZoneToZoneHandle),
}

impl ZoneOwner {
    pub fn is_local(&self) -> bool {
        matches!(self, ZoneOwner::Local)
    }
}

impl From<Option<ZoneToZoneHandle>> for ZoneOwner {
    fn from(owner: Option<ZoneToZoneHandle>) -> Self {
        match owner {
            Some(peer) => ZoneOwner::Peer(peer),
            None => ZoneOwner::Local,
        }
    }
}

pub struct ZoneMeta {
    pub owner: ZoneOwner,
    pub zone_data: ZoneData,
    pub sim: Sim,
}

#[derive(Default)]
pub struct SectorMeta {
    /// Absent until the sector introduces itself with `update_sector_info`.
    pub isector: Option<ZoneToSectorHandle>,
    pub sector_data: SectorData,
    pub zones: BTreeMap<ZoneCoord, ZoneMeta>,
}

pub struct ViewMeta {
    pub iview: ZoneToViewHandle,
    pub view_data: ViewData,
}

/// A control frame accepted for later application.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingControl {
    pub timestamp: u64,
    pub inputs: Vec<(ControlAxis, f32)>,
}

pub struct ResidentObject {
    pub zone: ZoneRef,
    pub data: ObjectData,
    /// Accepted control frames, oldest first.
    pub controls: VecDeque<PendingControl>,
    pub last_control: Option<u64>,
    /// Changed since it was last reported.
    pub dirty: bool,
}

impl ResidentObject {
    fn new(zone: ZoneRef, data: ObjectData) -> Self {
        Self {
            zone,
            data,
            controls: VecDeque::new(),
            last_control: None,
            dirty: false,
        }
    }
}

/// Arena of resident objects with sector and zone membership indexes.
#[derive(Default)]
pub struct ObjectTable {
    objects: HashMap<ObjectId, ResidentObject>,
    by_sector: BTreeMap<SectorId, BTreeSet<ObjectId>>,
    by_zone: BTreeMap<ZoneRef, BTreeSet<ObjectId>>,
}

impl ObjectTable {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, object: ObjectRef) -> bool {
        self.objects.contains_key(&object.object_id)
    }

    pub fn get(&self, object: ObjectRef) -> Option<&ResidentObject> {
        self.objects.get(&object.object_id)
    }

    pub fn get_mut(&mut self, object: ObjectRef) -> Option<&mut ResidentObject> {
        self.objects.get_mut(&object.object_id)
    }

    pub fn zone_of(&self, object: ObjectRef) -> Option<ZoneRef> {
        self.get(object).map(|resident| resident.zone)
    }

    /// Inserts or overwrites an object. Pending control frames survive an
    /// overwrite. Returns `true` if the object was not resident before.
    pub fn upsert(&mut self, object: ObjectRef, zone: ZoneRef, data: ObjectData) -> bool {
        match self.objects.get_mut(&object.object_id) {
            Some(resident) => {
                let previous = resident.zone;
                resident.zone = zone;
                resident.data = data;
                if previous != zone {
                    Self::unindex(&mut self.by_sector, &mut self.by_zone, object.object_id, previous);
                    Self::index(&mut self.by_sector, &mut self.by_zone, object.object_id, zone);
                }
                false
            }
            None => {
                self.objects.insert(object.object_id, ResidentObject::new(zone, data));
                Self::index(&mut self.by_sector, &mut self.by_zone, object.object_id, zone);
                true
            }
        }
    }

    /// Moves a resident object to another zone. No-op for unknown ids.
    pub fn relocate(&mut self, object: ObjectRef, zone: ZoneRef) {
        let Some(resident) = self.objects.get_mut(&object.object_id) else {
            return;
        };
        let previous = resident.zone;
        if previous == zone {
            return;
        }
        resident.zone = zone;
        Self::unindex(&mut self.by_sector, &mut self.by_zone, object.object_id, previous);
        Self::index(&mut self.by_sector, &mut self.by_zone, object.object_id, zone);
    }

    pub fn remove(&mut self, object: ObjectRef) -> Option<ResidentObject> {
        let resident = self.objects.remove(&object.object_id)?;
        Self::unindex(&mut self.by_sector, &mut self.by_zone, object.object_id, resident.zone);
        Some(resident)
    }

    /// Ids resident in `zone`, ascending.
    pub fn in_zone(&self, zone: ZoneRef) -> Vec<ObjectRef> {
        self.by_zone
            .get(&zone)
            .map(|ids| ids.iter().copied().map(ObjectRef::new).collect())
            .unwrap_or_default()
    }

    /// Ids resident anywhere in `sector_id`, ascending.
    pub fn in_sector(&self, sector_id: SectorId) -> Vec<ObjectRef> {
        self.by_sector
            .get(&sector_id)
            .map(|ids| ids.iter().copied().map(ObjectRef::new).collect())
            .unwrap_or_default()
    }

    pub fn zone_population(&self, zone: ZoneRef) -> usize {
        self.by_zone.get(&zone).map_or(0, BTreeSet::len)
    }

    /// Runs `f` on every object of `zone`.
    pub fn for_each_in_zone_mut<F: FnMut(ObjectRef, &mut ResidentObject)>(&mut self, zone: ZoneRef, mut f: F) {
        let Some(ids) = self.by_zone.get(&zone) else {
            return;
        };
        for id in ids {
            if let Some(resident) = self.objects.get_mut(id) {
                f(ObjectRef::new(*id), resident);
            }
        }
    }

    /// Objects changed since their last report, ascending by id.
    pub fn dirty(&self) -> Vec<ObjectRef> {
        let mut ids: Vec<ObjectId> = self
            .objects
            .iter()
            .filter(|(_, resident)| resident.dirty)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(ObjectRef::new).collect()
    }

    fn index(
        by_sector: &mut BTreeMap<SectorId, BTreeSet<ObjectId>>,
        by_zone: &mut BTreeMap<ZoneRef, BTreeSet<ObjectId>>,
        id: ObjectId,
        zone: ZoneRef,
    ) {
        by_sector.entry(zone.sector_id).or_default().insert(id);
        by_zone.entry(zone).or_default().insert(id);
    }

    fn unindex(
        by_sector: &mut BTreeMap<SectorId, BTreeSet<ObjectId>>,
        by_zone: &mut BTreeMap<ZoneRef, BTreeSet<ObjectId>>,
        id: ObjectId,
        zone: ZoneRef,
    ) {
        if let Some(ids) = by_sector.get_mut(&zone.sector_id) {
            ids.remove(&id);
            if ids.is_empty() {
                by_sector.remove(&zone.sector_id);
            }
        }
        if let Some(ids) = by_zone.get_mut(&zone) {
            ids.remove(&id);
            if ids.is_empty() {
                by_zone.remove(&zone);
            }
        }
    }
}

/// Everything one zone server knows.
#[derive(Default)]
pub struct Data {
    pub sectors: BTreeMap<SectorId, SectorMeta>,
    pub views: BTreeMap<ViewId, ViewMeta>,
    pub objects: ObjectTable,
    /// object -> view -> watch distance
    pub watches: BTreeMap<ObjectId, BTreeMap<ViewId, f32>>,
}

impl Data {
    pub fn zone(&self, zone: ZoneRef) -> Option<&ZoneMeta> {
        self.sectors.get(&zone.sector_id)?.zones.get(&zone.coord)
    }

    pub fn is_local(&self, zone: ZoneRef) -> bool {
        self.zone(zone).is_some_and(|meta| meta.owner.is_local())
    }

    /// Pushes an object's state to every view watching it.
    pub fn notify_watchers_update(&mut self, object: ObjectRef, zone: ZoneRef, data: &ObjectData) {
        let Some(watchers) = self.watches.get(&object.object_id) else {
            return;
        };
        for view_id in watchers.keys() {
            if let Some(view) = self.views.get_mut(view_id) {
                view.iview.update_object(object, zone, data.clone());
            }
        }
    }

    /// Tells every watching view the object is gone and forgets the watches.
    pub fn notify_watchers_removed(&mut self, object: ObjectRef) {
        let Some(watchers) = self.watches.remove(&object.object_id) else {
            return;
        };
        for view_id in watchers.keys() {
            if let Some(view) = self.views.get_mut(view_id) {
                view.iview.remove_object(object);
            }
        }
    }

    /// Evicts `object` and informs its watchers. No-op for unknown ids.
    pub fn evict(&mut self, object: ObjectRef) -> Option<ResidentObject> {
        let resident = self.objects.remove(object)?;
        self.notify_watchers_removed(object);
        Some(resident)
    }
}
