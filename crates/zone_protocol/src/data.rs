//! # Data Contracts
//!
//! Plain value types exchanged between the sector, zone and view roles. The
//! only behavior here is [`ObjectData::validate`], which checks the object's
//! attachment graph before a role trusts it.

use crate::error::ObjectDataError;
use crate::types::{ModuleRef, ObjectRef, Vec2d, Vec2f};
use serde::{Deserialize, Serialize};

/// Model descriptor of an object's body.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectBody {
    pub model_type: u16,
    pub flags: u16,
}

/// Motion state of an object.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectOrientation {
    /// Units per second.
    pub velocity: Vec2f,
    /// Facing angle in radians.
    pub angle: f32,
    /// Radians per second.
    pub spin: f32,
}

/// Visual effect envelope. `time_start`/`time_end` are zone clock microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectEffect {
    pub size: f32,
    pub growth: f32,
    pub time_start: u64,
    pub time_end: u64,
}

/// Attachment point in the object's node tree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectNode {
    pub parent_node_index: u16,
    pub node_type: u16,
    pub flags: u16,
    /// Polar offset from the parent node.
    pub theta: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectNodeLink {
    pub node1: u16,
    pub node2: u16,
    pub link_type: u16,
    pub flags: u16,
}

/// Module instance mounted on a node. `sub_node_index` selects one of the
/// node's children, or the node itself (index 0) when it has none.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectModule {
    pub node_index: u16,
    pub sub_node_index: u16,
    pub module_type: u16,
    pub flags: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectModuleLink {
    pub attacher: ModuleRef,
    pub foundation: ModuleRef,
    pub link_type: u16,
    pub flags: u16,
}

/// Full mutable state of one simulated object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectData {
    pub body: ObjectBody,
    pub pos: Vec2d,
    pub orientation: ObjectOrientation,
    pub effect: Option<ObjectEffect>,
    pub nodes: Vec<ObjectNode>,
    pub node_links: Vec<ObjectNodeLink>,
    pub modules: Vec<ObjectModule>,
    pub module_links: Vec<ObjectModuleLink>,
}

impl ObjectData {
    /// Creates a bare object at a position with no attachment graph.
    pub fn at(pos: Vec2d) -> Self {
        Self {
            pos,
            ..Default::default()
        }
    }

    /// Children of every node, indexed like `nodes`. A root is not its own child.
    pub fn child_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            let parent = node.parent_node_index as usize;
            if parent != index {
                if let Some(count) = counts.get_mut(parent) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Checks the attachment graph and the numeric state of an object owned
    /// by `object`.
    pub fn validate(&self, object: ObjectRef) -> Result<(), ObjectDataError> {
        if !self.pos.is_finite()
            || !self.orientation.velocity.is_finite()
            || !self.orientation.angle.is_finite()
            || !self.orientation.spin.is_finite()
        {
            return Err(ObjectDataError::NonFinite);
        }
        if let Some(effect) = &self.effect {
            if !effect.size.is_finite() || !effect.growth.is_finite() {
                return Err(ObjectDataError::NonFinite);
            }
            if effect.time_end < effect.time_start {
                return Err(ObjectDataError::InvalidEffectWindow {
                    start: effect.time_start,
                    end: effect.time_end,
                });
            }
        }

        let node_count = self.nodes.len();
        if node_count > u16::MAX as usize || self.modules.len() > u16::MAX as usize {
            return Err(ObjectDataError::TooLarge);
        }

        // Parents precede children, so the node sequence is a forest with no cycles.
        for (index, node) in self.nodes.iter().enumerate() {
            if node.parent_node_index as usize > index {
                return Err(ObjectDataError::ParentAfterNode {
                    node: index as u16,
                    parent: node.parent_node_index,
                });
            }
            if !node.theta.is_finite() || !node.radius.is_finite() {
                return Err(ObjectDataError::NonFinite);
            }
        }

        for link in &self.node_links {
            for node in [link.node1, link.node2] {
                if node as usize >= node_count {
                    return Err(ObjectDataError::UnknownNode(node));
                }
            }
        }

        let children = self.child_counts();
        for (index, module) in self.modules.iter().enumerate() {
            let Some(count) = children.get(module.node_index as usize) else {
                return Err(ObjectDataError::UnknownNode(module.node_index));
            };
            if module.sub_node_index as usize >= (*count).max(1) {
                return Err(ObjectDataError::UnknownSubNode {
                    module: index as u16,
                    node: module.node_index,
                    sub_node: module.sub_node_index,
                });
            }
        }

        for link in &self.module_links {
            for module in [link.attacher, link.foundation] {
                if module.object != object {
                    return Err(ObjectDataError::ForeignModule(module.object));
                }
                if module.module_index as usize >= self.modules.len() {
                    return Err(ObjectDataError::UnknownModule(module.module_index));
                }
            }
        }

        Ok(())
    }
}

/// Durable per-sector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SectorData {
    pub seed: u32,
}

/// Per-zone tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneData {
    /// Simulation speed multiplier.
    pub speed: f32,
}

impl ZoneData {
    /// Speed to apply; non-finite or negative speeds pause the zone.
    pub fn effective_speed(&self) -> f32 {
        if self.speed.is_finite() && self.speed > 0.0 {
            self.speed
        } else {
            0.0
        }
    }
}

impl Default for ZoneData {
    fn default() -> Self {
        Self { speed: 1.0 }
    }
}

/// Per-observer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewData {
    /// Watches requested beyond this distance are refused.
    pub max_watch_distance: f32,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            max_watch_distance: 1000.0,
        }
    }
}
