//! View server state and inbound contracts.

use crate::config::ViewServerConfig;
use crate::delivery::{Delivery, DeliveryQueue};
use crate::error::ViewError;
use crate::sink::ClientSink;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, trace};
use zone_protocol::{
    ControlFrame, ObjectData, ObjectId, ObjectRef, SectorToViewServer, ViewData, ViewId, ViewRef,
    ViewToSectorHandle, ZoneRef, ZoneToViewServer,
};

/// One hosted view and the objects it watches.
#[derive(Debug, Clone)]
pub struct ViewEntry {
    pub view_data: ViewData,
    /// object id -> requested distance
    pub watches: BTreeMap<ObjectId, f32>,
}

/// Last state received for a watched object.
#[derive(Debug, Clone, PartialEq)]
pub struct Replica {
    pub zone: ZoneRef,
    pub data: ObjectData,
}

pub struct ViewServer {
    config: ViewServerConfig,
    isector: ViewToSectorHandle,
    views: BTreeMap<ViewId, ViewEntry>,
    /// object id -> views watching it
    watchers: BTreeMap<ObjectId, BTreeSet<ViewId>>,
    replicas: HashMap<ObjectId, Replica>,
    /// Views owed a removal, captured when their watches were cleared.
    departed: HashMap<ObjectId, BTreeSet<ViewId>>,
    queue: DeliveryQueue,
    delivered: u64,
}

impl ViewServer {
    pub fn new(config: ViewServerConfig, isector: ViewToSectorHandle) -> Self {
        Self {
            config,
            isector,
            views: BTreeMap::new(),
            watchers: BTreeMap::new(),
            replicas: HashMap::new(),
            departed: HashMap::new(),
            queue: DeliveryQueue::new(),
            delivered: 0,
        }
    }

    /// Hosts `view` here, replacing its data if already hosted.
    pub fn add_view(&mut self, view: ViewRef, view_data: ViewData) {
        match self.views.get_mut(&view.view_id) {
            Some(entry) => entry.view_data = view_data,
            None => {
                self.views.insert(
                    view.view_id,
                    ViewEntry {
                        view_data,
                        watches: BTreeMap::new(),
                    },
                );
                info!("👁️ Hosting {}", view);
            }
        }
    }

    /// Hosts `view` with the configured defaults.
    pub fn add_default_view(&mut self, view: ViewRef) {
        self.add_view(view, self.config.view_data());
    }

    /// Stops hosting `view`, releasing every watch it held.
    pub fn remove_view(&mut self, view: ViewRef) -> Result<(), ViewError> {
        let entry = self.views.remove(&view.view_id).ok_or(ViewError::UnknownView(view))?;
        for object_id in entry.watches.keys() {
            let object = ObjectRef::new(*object_id);
            self.release_watcher(view, object);
            self.isector.unwatch_object(view, object);
        }
        self.departed.retain(|_, views| {
            views.remove(&view.view_id);
            !views.is_empty()
        });
        info!("👁️ Released {} ({} watches)", view, entry.watches.len());
        Ok(())
    }

    /// Records a watch and asks the sector to set it up on the owning zone
    /// server. Watching again updates the distance.
    pub fn watch(&mut self, view: ViewRef, object: ObjectRef, distance: f32) -> Result<(), ViewError> {
        let entry = self.views.get_mut(&view.view_id).ok_or(ViewError::UnknownView(view))?;
        let max = entry.view_data.max_watch_distance;
        if !distance.is_finite() || distance < 0.0 || distance > max {
            return Err(ViewError::InvalidDistance { distance, max });
        }
        entry.watches.insert(object.object_id, distance);
        self.watchers.entry(object.object_id).or_default().insert(view.view_id);
        self.isector.watch_object(view, object, distance);
        debug!("{} watching {} at {}", view, object, distance);
        Ok(())
    }

    pub fn unwatch(&mut self, view: ViewRef, object: ObjectRef) -> Result<(), ViewError> {
        let entry = self.views.get_mut(&view.view_id).ok_or(ViewError::UnknownView(view))?;
        if entry.watches.remove(&object.object_id).is_none() {
            return Err(ViewError::NotWatching { view, object });
        }
        self.release_watcher(view, object);
        self.isector.unwatch_object(view, object);
        debug!("{} stopped watching {}", view, object);
        Ok(())
    }

    /// Relays a client's control frame. Validation happens on the zone
    /// server that owns the object.
    pub fn control(&mut self, view: ViewRef, object: ObjectRef, frame: ControlFrame) -> Result<(), ViewError> {
        if !self.views.contains_key(&view.view_id) {
            return Err(ViewError::UnknownView(view));
        }
        self.isector.control_object(view, object, frame);
        Ok(())
    }

    /// Hands up to `max` queued deliveries to `sink`, once per recipient
    /// view. Returns the number of deliveries taken off the queue.
    pub fn flush(&mut self, sink: &mut impl ClientSink, max: usize) -> usize {
        let batch = self.queue.drain(max);
        for delivery in &batch {
            let object = delivery.object();
            // Views that lost the object before a newer update superseded
            // the removal still get the removal.
            if let Some(departed) = self.departed.remove(&object.object_id) {
                let removal = Delivery::Remove { object };
                for view_id in departed {
                    sink.deliver(ViewRef::new(view_id), &removal);
                    self.delivered += 1;
                }
            }
            if let Delivery::Update { .. } = delivery {
                for view_id in self.watchers.get(&object.object_id).into_iter().flatten() {
                    sink.deliver(ViewRef::new(*view_id), delivery);
                    self.delivered += 1;
                }
            }
        }
        if !batch.is_empty() {
            trace!("Flushed {} deliveries, {} still queued", batch.len(), self.queue.len());
        }
        batch.len()
    }

    /// Flushes one configured batch.
    pub fn flush_batch(&mut self, sink: &mut impl ClientSink) -> usize {
        let max = self.config.flush_batch;
        self.flush(sink, max)
    }

    fn release_watcher(&mut self, view: ViewRef, object: ObjectRef) {
        let Some(views) = self.watchers.get_mut(&object.object_id) else {
            return;
        };
        views.remove(&view.view_id);
        if views.is_empty() {
            self.watchers.remove(&object.object_id);
            self.replicas.remove(&object.object_id);
            if matches!(self.queue.get(object), Some(Delivery::Update { .. })) {
                self.queue.discard(object);
                if self.departed.contains_key(&object.object_id) {
                    self.queue.push(Delivery::Remove { object });
                }
            }
        }
    }

    /// Asks the sector to re-establish every local watch on `object`.
    fn rewatch(&mut self, object: ObjectRef) {
        let Some(views) = self.watchers.get(&object.object_id) else {
            return;
        };
        for view_id in views {
            let distance = self
                .views
                .get(view_id)
                .and_then(|entry| entry.watches.get(&object.object_id))
                .copied();
            if let Some(distance) = distance {
                self.isector.watch_object(ViewRef::new(*view_id), object, distance);
            }
        }
    }

    fn receive_update(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        if !self.watchers.contains_key(&object.object_id) {
            debug!("Dropping update of unwatched {}", object);
            return;
        }
        let moved = self
            .replicas
            .get(&object.object_id)
            .map_or(false, |replica| replica.zone != zone);
        self.replicas.insert(
            object.object_id,
            Replica {
                zone,
                data: object_data.clone(),
            },
        );
        if let Some(departed) = self.departed.get_mut(&object.object_id) {
            if let Some(watching) = self.watchers.get(&object.object_id) {
                departed.retain(|view_id| !watching.contains(view_id));
            }
            if departed.is_empty() {
                self.departed.remove(&object.object_id);
            }
        }
        self.queue.push(Delivery::Update {
            object,
            zone,
            data: object_data,
        });
        if moved {
            // The old zone server dropped the watch with the object.
            debug!("{} moved to {}, re-watching", object, zone);
            self.rewatch(object);
        }
    }

    fn receive_removal(&mut self, object: ObjectRef) {
        let Some(views) = self.watchers.remove(&object.object_id) else {
            debug!("Ignoring removal of unwatched {}", object);
            return;
        };
        for view_id in &views {
            if let Some(entry) = self.views.get_mut(view_id) {
                entry.watches.remove(&object.object_id);
            }
        }
        self.replicas.remove(&object.object_id);
        self.departed.entry(object.object_id).or_default().extend(views);
        self.queue.push(Delivery::Remove { object });
        debug!("{} removed", object);
    }

    pub fn config(&self) -> &ViewServerConfig {
        &self.config
    }

    pub fn has_view(&self, view: ViewRef) -> bool {
        self.views.contains_key(&view.view_id)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    pub fn view(&self, view: ViewRef) -> Option<&ViewEntry> {
        self.views.get(&view.view_id)
    }

    /// Views hosted here that watch `object`.
    pub fn watchers(&self, object: ObjectRef) -> Vec<ViewRef> {
        self.watchers
            .get(&object.object_id)
            .map(|views| views.iter().map(|id| ViewRef::new(*id)).collect())
            .unwrap_or_default()
    }

    pub fn replica(&self, object: ObjectRef) -> Option<&Replica> {
        self.replicas.get(&object.object_id)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    /// Per-view deliveries handed to sinks so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }
}

impl ZoneToViewServer for ViewServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.receive_update(object, zone, object_data);
    }

    fn remove_object(&mut self, object: ObjectRef) {
        self.receive_removal(object);
    }
}

impl SectorToViewServer for ViewServer {
    fn update_object(&mut self, object: ObjectRef, zone: ZoneRef, object_data: ObjectData) {
        self.receive_update(object, zone, object_data);
    }

    fn remove_object(&mut self, object: ObjectRef) {
        self.receive_removal(object);
    }

    fn zone_reassigned(&mut self, zone: ZoneRef, server_index: u32) {
        let mut moved: Vec<ObjectRef> = self
            .replicas
            .iter()
            .filter(|(_, replica)| replica.zone == zone)
            .map(|(id, _)| ObjectRef::new(*id))
            .collect();
        moved.sort();
        info!(
            "🔀 {} now runs on zone server {}, re-watching {} objects",
            zone,
            server_index,
            moved.len()
        );
        for object in moved {
            self.rewatch(object);
        }
    }
}
