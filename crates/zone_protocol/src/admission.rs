//! Admission reply channel for `add_object`.
//!
//! The sector answers exactly once through an [`AdmissionReply`]; the zone
//! polls the matching [`AdmissionTicket`] from its frame loop and enforces
//! its own deadline. A dropped reply means the object was not admitted.

use crate::error::AdmissionError;
use crate::types::{ObjectRef, ZoneRef};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::debug;

/// Payload of an accepted admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddObjectReply {
    pub object: ObjectRef,
    pub zone: ZoneRef,
    /// Objects resident in the sector after this admission.
    pub sector_population: usize,
}

pub type AdmissionResult = Result<AddObjectReply, AdmissionError>;

/// Sending half, owned by whoever decides the admission.
#[derive(Debug)]
pub struct AdmissionReply {
    sender: oneshot::Sender<AdmissionResult>,
}

/// Receiving half, owned by the zone that asked.
#[derive(Debug)]
pub struct AdmissionTicket {
    receiver: oneshot::Receiver<AdmissionResult>,
}

/// Creates a connected reply/ticket pair.
pub fn admission_channel() -> (AdmissionReply, AdmissionTicket) {
    let (sender, receiver) = oneshot::channel();
    (AdmissionReply { sender }, AdmissionTicket { receiver })
}

impl AdmissionReply {
    /// Delivers the decision. The asker may already have given up, which is
    /// not an error for the sector.
    pub fn send(self, result: AdmissionResult) {
        if self.sender.send(result).is_err() {
            debug!("Admission reply dropped: requester no longer waiting");
        }
    }

    pub fn accept(self, reply: AddObjectReply) {
        self.send(Ok(reply));
    }

    pub fn reject(self, error: AdmissionError) {
        self.send(Err(error));
    }
}

impl AdmissionTicket {
    /// Non-blocking check. `None` while the decision is still pending.
    pub fn poll(&mut self) -> Option<AdmissionResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(AdmissionError::Disconnected)),
        }
    }
}
