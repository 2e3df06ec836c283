//! Hostile chasers
//!
//! Glass spheres and cubes appear ahead of the player, inside a forward arc,
//! and home in on the player at a constant speed. They break after one
//! standard hit and are retired once they drift out of range.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::secs_to_ticks;
use super::scene::{BodyDesc, ColliderShape, EntityId, Geometry, MaterialDesc, VisualDesc};
use super::state::World;
use crate::consts::*;

const HOSTILE_COLOR: u32 = 0x88ccff;
/// Spawn height above the player
const SPAWN_LIFT: f32 = 5.0;

/// Hostile body shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostileShape {
    Sphere,
    Cube,
}

/// A live hostile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hostile {
    pub id: EntityId,
    pub shape: HostileShape,
    pub size: f32,
    /// Units per second
    pub speed: f32,
    pub health: i32,
    pub pos: Vec3,
}

impl Hostile {
    fn visual(&self) -> VisualDesc {
        let geometry = match self.shape {
            HostileShape::Sphere => Geometry::Sphere { radius: self.size },
            HostileShape::Cube => Geometry::Slab {
                size: Vec3::splat(self.size),
                weathering: None,
            },
        };
        VisualDesc {
            geometry,
            material: MaterialDesc {
                color: HOSTILE_COLOR,
                opacity: 0.8,
                transmission: 0.9,
                roughness: 0.1,
                metalness: 0.0,
                emissive: 0,
                emissive_intensity: 0.0,
            },
            position: self.pos,
            rotation: Quat::IDENTITY,
            cast_shadow: true,
        }
    }

    fn body(&self) -> BodyDesc {
        let shape = match self.shape {
            HostileShape::Sphere => ColliderShape::Sphere { radius: self.size },
            HostileShape::Cube => ColliderShape::Cuboid {
                half_extents: Vec3::splat(self.size / 2.0),
            },
        };
        BodyDesc::fixed(shape, self.pos)
    }
}

/// Spawn point `distance` ahead of the player, rotated by `angle` about Y
pub fn spawn_point(player: Vec3, forward: Vec3, distance: f32, angle: f32) -> Vec3 {
    let flat = Vec3::new(forward.x, 0.0, forward.z).normalize_or(Vec3::NEG_Z);
    let dir = Quat::from_rotation_y(angle) * flat;
    Vec3::new(
        player.x + dir.x * distance,
        player.y + SPAWN_LIFT,
        player.z + dir.z * distance,
    )
}

impl World {
    /// Add a hostile at `pos` with rolled shape, size and speed
    pub fn spawn_hostile(&mut self, pos: Vec3) -> EntityId {
        let id = self.next_entity_id();
        let shape = if self.rng.random::<f32>() < 0.5 {
            HostileShape::Sphere
        } else {
            HostileShape::Cube
        };
        let hostile = Hostile {
            id,
            shape,
            size: self.tuning.hostile_size.lerp(self.rng.random::<f32>()),
            speed: self.tuning.hostile_speed.lerp(self.rng.random::<f32>()),
            health: MAX_HEALTH,
            pos,
        };
        self.outbox.spawn(id, hostile.visual(), hostile.body());
        log::debug!("Hostile {} ({:?}) at {:?}", id.0, shape, pos);
        self.hostiles.push(hostile);
        id
    }

    /// Spawn on schedule, chase the player, retire stragglers
    pub(crate) fn update_hostiles(&mut self, player: Vec3, forward: Vec3) {
        let interval = secs_to_ticks(self.tuning.hostile_spawn_interval);
        let due = self
            .last_hostile_spawn
            .is_none_or(|at| self.time_ticks.saturating_sub(at) >= interval);
        if due && (self.hostiles.len() as u32) < self.tuning.max_hostiles {
            let angle = (self.rng.random::<f32>() - 0.5) * self.tuning.hostile_spawn_arc;
            let pos = spawn_point(player, forward, self.tuning.hostile_spawn_distance, angle);
            self.spawn_hostile(pos);
            self.last_hostile_spawn = Some(self.time_ticks);
        }

        let leash = self.tuning.hostile_leash;
        let outbox = &mut self.outbox;
        self.hostiles.retain_mut(|h| {
            let to_player = player - h.pos;
            h.pos += to_player.normalize_or_zero() * h.speed * SIM_DT;
            if h.pos.distance(player) > leash {
                log::debug!("Hostile {} out of range", h.id.0);
                outbox.despawn(h.id);
                return false;
            }
            outbox.move_to(h.id, h.pos, Quat::IDENTITY);
            true
        });
    }

    /// Whether a hostile is touching the player; the touching hostile is removed
    pub fn check_hostile_contact(&mut self, player: Vec3) -> bool {
        let radius = self.tuning.hostile_contact_radius;
        let Some(index) = self.hostiles.iter().position(|h| h.pos.distance(player) < radius) else {
            return false;
        };
        let hostile = self.hostiles.remove(index);
        self.outbox.despawn(hostile.id);
        log::info!("Hostile {} reached the player", hostile.id.0);
        true
    }

    pub(crate) fn find_hostile(&self, id: EntityId) -> Option<usize> {
        self.hostiles.binary_search_by_key(&id, |h| h.id).ok()
    }

    /// Remove a destroyed hostile with a shard burst
    pub(crate) fn shatter_hostile(&mut self, index: usize) {
        let hostile = self.hostiles.remove(index);
        self.outbox.despawn(hostile.id);
        self.effects
            .spawn_hostile_burst(hostile.pos, HOSTILE_COLOR, self.time_ticks);
        log::debug!("Hostile {} destroyed", hostile.id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::scene::SceneCommand;

    #[test]
    fn test_spawn_point_in_forward_arc() {
        let player = Vec3::new(1.0, 2.0, -10.0);
        let ahead = spawn_point(player, Vec3::NEG_Z, 30.0, 0.0);
        assert!((ahead - Vec3::new(1.0, 7.0, -40.0)).length() < 1e-4);

        let edge = spawn_point(player, Vec3::NEG_Z, 30.0, std::f32::consts::FRAC_PI_6);
        let flat = Vec3::new(edge.x - player.x, 0.0, edge.z - player.z);
        assert!((flat.length() - 30.0).abs() < 1e-3);
        assert!(flat.z < 0.0);
    }

    #[test]
    fn test_spawn_respects_cap_and_interval() {
        let mut w = World::with_seed(4);
        let player = Vec3::new(0.0, 2.0, 0.0);
        let interval = secs_to_ticks(w.tuning.hostile_spawn_interval);
        for _ in 0..interval * 10 {
            w.time_ticks += 1;
            w.update_hostiles(player, Vec3::NEG_Z);
            assert!(w.hostiles().len() as u32 <= w.tuning.max_hostiles);
            // Keep hostiles from reaching the player
            for h in &mut w.hostiles {
                h.pos = Vec3::new(h.pos.x, 7.0, -30.0);
            }
        }
        assert_eq!(w.hostiles().len() as u32, w.tuning.max_hostiles);
    }

    #[test]
    fn test_hostiles_chase_player() {
        let mut w = World::with_seed(4);
        let id = w.spawn_hostile(Vec3::new(0.0, 2.0, -20.0));
        w.last_hostile_spawn = Some(0);
        let before = w.hostiles()[0].pos.distance(Vec3::ZERO);
        w.time_ticks = 1;
        w.update_hostiles(Vec3::ZERO, Vec3::NEG_Z);
        let after = w.hostiles()[0].pos.distance(Vec3::ZERO);
        let step = w.hostiles()[0].speed * SIM_DT;
        assert!((before - after - step).abs() < 1e-3);
        assert!(w
            .pending_commands()
            .iter()
            .any(|c| matches!(c, SceneCommand::SetBodyPosition { id: n, .. } if *n == id)));
    }

    #[test]
    fn test_out_of_range_hostile_retired() {
        let mut w = World::with_seed(4);
        let id = w.spawn_hostile(Vec3::new(0.0, 0.0, -100.0));
        w.last_hostile_spawn = Some(0);
        w.time_ticks = 1;
        w.update_hostiles(Vec3::ZERO, Vec3::NEG_Z);
        assert!(w.hostiles().is_empty());
        assert!(w.pending_commands().contains(&SceneCommand::RemoveBody(id)));
    }

    #[test]
    fn test_contact_removes_one_hostile() {
        let mut w = World::with_seed(4);
        w.spawn_hostile(Vec3::new(0.0, 0.0, -1.0));
        w.spawn_hostile(Vec3::new(0.0, 0.0, -50.0));
        assert!(w.check_hostile_contact(Vec3::ZERO));
        assert_eq!(w.hostiles().len(), 1);
        assert!(!w.check_hostile_contact(Vec3::ZERO));
    }
}
