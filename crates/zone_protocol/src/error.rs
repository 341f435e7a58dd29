//! Error types shared by every role.
//!
//! Notifications between roles never fail: unknown ids are tolerated and
//! logged by the receiver. These errors describe the cases that do have a
//! caller to report to, the admission reply and locally validated input.

use crate::types::{ObjectRef, SectorId, ZoneRef};

/// Structural problems in an [`ObjectData`](crate::data::ObjectData).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ObjectDataError {
    #[error("object state contains a non-finite value")]
    NonFinite,

    #[error("effect window ends ({end}) before it starts ({start})")]
    InvalidEffectWindow { start: u64, end: u64 },

    #[error("object graph exceeds u16 indexing")]
    TooLarge,

    #[error("node {node} references parent {parent} which does not precede it")]
    ParentAfterNode { node: u16, parent: u16 },

    #[error("reference to unknown node {0}")]
    UnknownNode(u16),

    #[error("module {module} references sub-node {sub_node} of node {node} which does not exist")]
    UnknownSubNode { module: u16, node: u16, sub_node: u16 },

    #[error("reference to unknown module {0}")]
    UnknownModule(u16),

    #[error("module link references a module of {0}")]
    ForeignModule(ObjectRef),
}

/// Reasons a sector refuses to admit a newly created object.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AdmissionError {
    #[error("sector {expected} cannot admit an object for sector {actual}")]
    WrongSector { expected: SectorId, actual: SectorId },

    #[error("invalid object data: {0}")]
    InvalidObject(#[from] ObjectDataError),

    #[error("{0} is not assigned to a zone server")]
    ZoneNotAssigned(ZoneRef),

    #[error("{0} is being handed to another zone server")]
    ZoneDraining(ZoneRef),

    #[error("sector is at capacity ({limit} objects)")]
    Capacity { limit: usize },

    #[error("no admission reply within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("sector dropped the admission request")]
    Disconnected,

    #[error("object was removed before its admission completed")]
    Removed,
}

impl AdmissionError {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdmissionError::ZoneDraining(_) | AdmissionError::Timeout { .. } | AdmissionError::Disconnected
        )
    }
}

/// Reasons a control frame from a view is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControlError {
    #[error("view {0} is not registered")]
    UnknownView(u32),

    #[error("{0} is not resident on this zone server")]
    UnknownObject(ObjectRef),

    #[error("control frame has no inputs")]
    Empty,

    #[error("control frame has {count} inputs, limit is {limit}")]
    TooManyInputs { count: usize, limit: usize },

    #[error("unknown input kind {0}")]
    UnknownInput(u16),

    #[error("input value {0} is outside [-1, 1]")]
    ValueOutOfRange(f32),

    #[error("timestamp {timestamp} is not newer than {last}")]
    OutOfOrder { timestamp: u64, last: u64 },

    #[error("timestamp {timestamp} is older than the accepted window (now {now})")]
    Stale { timestamp: u64, now: u64 },
}
