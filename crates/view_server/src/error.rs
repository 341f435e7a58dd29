//! Errors of view-facing operations.

use zone_protocol::{ObjectRef, ViewRef};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewError {
    #[error("{0} is not hosted by this view server")]
    UnknownView(ViewRef),

    #[error("watch distance {distance} outside [0, {max}]")]
    InvalidDistance { distance: f32, max: f32 },

    #[error("{view} does not watch {object}")]
    NotWatching { view: ViewRef, object: ObjectRef },

    #[error("invalid configuration: {0}")]
    Config(String),
}
