//! Scene and physics descriptions emitted by the simulation
//!
//! The world never owns renderer or physics objects. It describes what should
//! exist through [`SceneCommand`]s; the host turns those into meshes and
//! bodies (see [`crate::host`]).

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Stable handle shared by an entity's visual node and its physical body
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

/// Cosmetic vertex displacement applied by the renderer to slab faces
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weathering {
    /// Maximum displacement along the face normal
    pub amplitude: f32,
    /// Seed for the per-vertex noise
    pub seed: u64,
    /// Only displace vertices on faces aligned with a box axis
    pub axis_aligned_only: bool,
}

/// Surface appearance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialDesc {
    /// 0xRRGGBB
    pub color: u32,
    pub opacity: f32,
    /// Refractive transmission (glass); 0 for opaque materials
    pub transmission: f32,
    pub roughness: f32,
    pub metalness: f32,
    /// 0xRRGGBB emissive tint
    pub emissive: u32,
    pub emissive_intensity: f32,
}

impl MaterialDesc {
    /// Plain lit surface with the given color
    pub fn solid(color: u32, opacity: f32) -> Self {
        Self {
            color,
            opacity,
            transmission: 0.0,
            roughness: 0.7,
            metalness: 0.2,
            emissive: 0,
            emissive_intensity: 0.0,
        }
    }
}

/// Geometry of a visual node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Rectangular slab (box platforms, traps, glass walls)
    Slab {
        size: Vec3,
        weathering: Option<Weathering>,
    },
    /// N-sided pyramid (cone platforms)
    Pyramid { radius: f32, height: f32, sides: u32 },
    /// Flat cylinder (disc platforms)
    Disc { radius: f32, height: f32, segments: u32 },
    /// Thin cylinder (coin pickup)
    Coin { radius: f32, thickness: f32 },
    /// Four-sided cone (gem pickup)
    Gem { radius: f32, height: f32 },
    /// Flat five-point star (star pickup)
    Star { outer: f32, inner: f32, spikes: u32 },
    /// Glass sphere (hostile)
    Sphere { radius: f32 },
}

/// A visual node to add to the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualDesc {
    pub geometry: Geometry,
    pub material: MaterialDesc,
    pub position: Vec3,
    pub rotation: Quat,
    pub cast_shadow: bool,
}

/// Collider shape of a physical body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
}

/// A physical body to add to the physics world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyDesc {
    pub shape: ColliderShape,
    pub position: Vec3,
    pub rotation: Quat,
    /// Zero mass = static/kinematic, positions driven by the engine
    pub mass: f32,
    /// Sensor bodies detect overlap without collision response
    pub sensor: bool,
}

impl BodyDesc {
    pub fn fixed(shape: ColliderShape, position: Vec3) -> Self {
        Self {
            shape,
            position,
            rotation: Quat::IDENTITY,
            mass: 0.0,
            sensor: false,
        }
    }
}

/// Commands from the simulation to its scene/physics/HUD collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SceneCommand {
    AddNode { id: EntityId, visual: VisualDesc },
    RemoveNode(EntityId),
    SetTransform {
        id: EntityId,
        position: Vec3,
        rotation: Quat,
        scale: f32,
    },
    SetMaterial {
        id: EntityId,
        opacity: f32,
        transmission: f32,
    },
    AddBody { id: EntityId, body: BodyDesc },
    RemoveBody(EntityId),
    SetBodyPosition { id: EntityId, position: Vec3 },
    /// Score text changed (display only)
    ScoreChanged(u32),
}

/// Outgoing command queue, drained by the host once per frame
#[derive(Debug, Default)]
pub struct Outbox {
    commands: Vec<SceneCommand>,
}

impl Outbox {
    pub fn push(&mut self, command: SceneCommand) {
        self.commands.push(command);
    }

    /// Spawn a node and its body under one id
    pub fn spawn(&mut self, id: EntityId, visual: VisualDesc, body: BodyDesc) {
        self.commands.push(SceneCommand::AddNode { id, visual });
        self.commands.push(SceneCommand::AddBody { id, body });
    }

    /// Release a node and its body
    pub fn despawn(&mut self, id: EntityId) {
        self.commands.push(SceneCommand::RemoveNode(id));
        self.commands.push(SceneCommand::RemoveBody(id));
    }

    /// Move a node and its body together
    pub fn move_to(&mut self, id: EntityId, position: Vec3, rotation: Quat) {
        self.commands.push(SceneCommand::SetTransform {
            id,
            position,
            rotation,
            scale: 1.0,
        });
        self.commands.push(SceneCommand::SetBodyPosition { id, position });
    }

    pub fn drain(&mut self) -> Vec<SceneCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn as_slice(&self) -> &[SceneCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Convert HSL (all in [0, 1]) to 0xRRGGBB
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> u32 {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = (h.rem_euclid(1.0)) * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to_byte = |v: f32| (((v + m).clamp(0.0, 1.0)) * 255.0).round() as u32;
    (to_byte(r) << 16) | (to_byte(g) << 8) | to_byte(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), 0xff0000);
        assert_eq!(hsl_to_rgb(1.0 / 3.0, 1.0, 0.5), 0x00ff00);
        assert_eq!(hsl_to_rgb(2.0 / 3.0, 1.0, 0.5), 0x0000ff);
        assert_eq!(hsl_to_rgb(0.3, 0.0, 1.0), 0xffffff);
    }

    #[test]
    fn test_outbox_spawn_and_despawn_pair_commands() {
        let mut outbox = Outbox::default();
        let id = EntityId(7);
        let visual = VisualDesc {
            geometry: Geometry::Coin {
                radius: 0.3,
                thickness: 0.05,
            },
            material: MaterialDesc::solid(0xffd700, 1.0),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            cast_shadow: false,
        };
        let body = BodyDesc::fixed(
            ColliderShape::Cuboid {
                half_extents: Vec3::ONE,
            },
            Vec3::ZERO,
        );
        outbox.spawn(id, visual, body);
        outbox.despawn(id);
        let commands = outbox.drain();
        assert_eq!(commands.len(), 4);
        assert!(matches!(commands[0], SceneCommand::AddNode { id: EntityId(7), .. }));
        assert_eq!(commands[3], SceneCommand::RemoveBody(id));
        assert!(outbox.is_empty());
    }
}
