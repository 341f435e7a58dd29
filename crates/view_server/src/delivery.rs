/// Latest-state delivery queue for object replicas
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use zone_protocol::{ObjectData, ObjectId, ObjectRef, ZoneRef};

/// One change to hand to client connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Delivery {
    Update {
        object: ObjectRef,
        zone: ZoneRef,
        data: ObjectData,
    },
    Remove {
        object: ObjectRef,
    },
}

impl Delivery {
    pub fn object(&self) -> ObjectRef {
        match self {
            Delivery::Update { object, .. } | Delivery::Remove { object } => *object,
        }
    }
}

/// Queue holding at most one pending delivery per object.
///
/// Objects leave in the order they were first queued. A newer delivery for
/// an object that is still pending replaces it in place, so a slow consumer
/// only ever sees the latest state.
#[derive(Debug, Default)]
pub struct DeliveryQueue {
    order: VecDeque<ObjectId>,
    pending: HashMap<ObjectId, Delivery>,
    superseded: u64,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a delivery. Returns `true` if it replaced a pending one.
    pub fn push(&mut self, delivery: Delivery) -> bool {
        let id = delivery.object().object_id;
        match self.pending.insert(id, delivery) {
            Some(_) => {
                self.superseded += 1;
                true
            }
            None => {
                self.order.push_back(id);
                false
            }
        }
    }

    pub fn pop(&mut self) -> Option<Delivery> {
        while let Some(id) = self.order.pop_front() {
            if let Some(delivery) = self.pending.remove(&id) {
                return Some(delivery);
            }
        }
        None
    }

    /// Pending delivery for one object.
    pub fn get(&self, object: ObjectRef) -> Option<&Delivery> {
        self.pending.get(&object.object_id)
    }

    /// Drains up to `count` deliveries in queue order
    pub fn drain(&mut self, count: usize) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(count.min(self.len()));
        while deliveries.len() < count {
            match self.pop() {
                Some(delivery) => deliveries.push(delivery),
                None => break,
            }
        }
        deliveries
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drops the pending delivery for `object`, if any.
    pub fn discard(&mut self, object: ObjectRef) -> Option<Delivery> {
        let delivery = self.pending.remove(&object.object_id)?;
        self.order.retain(|id| *id != object.object_id);
        Some(delivery)
    }

    /// Deliveries replaced before they were sent.
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}
