//! Client input frames forwarded from a view to the zone that owns the object.

use crate::error::ControlError;
use serde::{Deserialize, Serialize};

/// Input axes a client may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlAxis {
    /// Accelerate along the facing angle.
    Thrust,
    /// Set the spin rate.
    Turn,
    /// Damp the velocity.
    Brake,
}

impl TryFrom<u16> for ControlAxis {
    type Error = ControlError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ControlAxis::Thrust),
            1 => Ok(ControlAxis::Turn),
            2 => Ok(ControlAxis::Brake),
            other => Err(ControlError::UnknownInput(other)),
        }
    }
}

/// One typed input/value pair as sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlInput {
    pub input: u16,
    pub value: f32,
}

impl ControlInput {
    pub fn new(axis: ControlAxis, value: f32) -> Self {
        let input = match axis {
            ControlAxis::Thrust => 0,
            ControlAxis::Turn => 1,
            ControlAxis::Brake => 2,
        };
        Self { input, value }
    }
}

/// A client input frame, to be applied at or after `timestamp` (zone clock
/// microseconds).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlFrame {
    pub timestamp: u64,
    pub inputs: Vec<ControlInput>,
}

impl ControlFrame {
    pub fn new(timestamp: u64, inputs: Vec<ControlInput>) -> Self {
        Self { timestamp, inputs }
    }

    /// Checks the frame's shape and decodes its inputs. Timestamp checks
    /// depend on the zone clock and are left to the zone.
    pub fn decode(&self, max_inputs: usize) -> Result<Vec<(ControlAxis, f32)>, ControlError> {
        if self.inputs.is_empty() {
            return Err(ControlError::Empty);
        }
        if self.inputs.len() > max_inputs {
            return Err(ControlError::TooManyInputs {
                count: self.inputs.len(),
                limit: max_inputs,
            });
        }
        self.inputs
            .iter()
            .map(|input| {
                let axis = ControlAxis::try_from(input.input)?;
                if !input.value.is_finite() || !(-1.0..=1.0).contains(&input.value) {
                    return Err(ControlError::ValueOutOfRange(input.value));
                }
                Ok((axis, input.value))
            })
            .collect()
    }
}
