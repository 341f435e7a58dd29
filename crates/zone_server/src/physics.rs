//! Per-step object integration.

use crate::config::ZoneServerConfig;
use crate::data::ResidentObject;
use crate::sim::SimFrame;
use std::f32::consts::TAU;
use zone_protocol::{ControlAxis, Vec2f};

/// Applies control frames due at `frame` and integrates one step.
pub fn step_object(resident: &mut ResidentObject, frame: SimFrame, config: &ZoneServerConfig) {
    while resident
        .controls
        .front()
        .is_some_and(|control| control.timestamp <= frame.timestamp)
    {
        if let Some(control) = resident.controls.pop_front() {
            for (axis, value) in control.inputs {
                apply_input(resident, axis, value, config);
            }
            resident.dirty = true;
        }
    }

    let dt = frame.dt_seconds();
    let data = &mut resident.data;
    let orientation = &mut data.orientation;

    if orientation.velocity != Vec2f::default() {
        data.pos.x += orientation.velocity.x as f64 * dt;
        data.pos.y += orientation.velocity.y as f64 * dt;
        resident.dirty = true;
    }
    if orientation.spin != 0.0 {
        orientation.angle = (orientation.angle + orientation.spin * dt as f32).rem_euclid(TAU);
        resident.dirty = true;
    }

    let expired = data
        .effect
        .as_ref()
        .is_some_and(|effect| frame.timestamp >= effect.time_end);
    if expired {
        data.effect = None;
        resident.dirty = true;
    } else if let Some(effect) = data.effect.as_mut() {
        if frame.timestamp >= effect.time_start && effect.growth != 0.0 {
            effect.size = (effect.size + effect.growth * dt as f32).max(0.0);
            resident.dirty = true;
        }
    }
}

fn apply_input(resident: &mut ResidentObject, axis: ControlAxis, value: f32, config: &ZoneServerConfig) {
    let orientation = &mut resident.data.orientation;
    match axis {
        ControlAxis::Thrust => {
            let impulse = value * config.thrust_impulse;
            orientation.velocity.x += orientation.angle.cos() * impulse;
            orientation.velocity.y += orientation.angle.sin() * impulse;
        }
        ControlAxis::Turn => {
            orientation.spin = value * config.max_spin;
        }
        ControlAxis::Brake => {
            let keep = 1.0 - value.abs() * config.brake_factor;
            orientation.velocity.x *= keep;
            orientation.velocity.y *= keep;
        }
    }
}
