//! Damage routing
//!
//! Hits name their target by entity id. A stale id (already destroyed or
//! retired) is ignored. Destruction removes the target within the same call.

use serde::{Deserialize, Serialize};

use super::scene::{EntityId, SceneCommand};
use super::state::{RemovalCause, World};

/// What a hit landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageTarget {
    Platform(EntityId),
    Wall(EntityId),
    Hostile(EntityId),
}

/// Result of applying damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Target survives with `health` remaining
    Damaged { health: i32 },
    /// Target reached zero health and was removed
    Destroyed,
    /// Unknown target or non-positive amount
    Ignored,
}

impl World {
    /// Apply the standard per-hit damage for the target's type
    pub fn hit(&mut self, target: DamageTarget) -> DamageOutcome {
        let amount = match target {
            DamageTarget::Platform(_) => self.tuning.platform_hit_damage,
            DamageTarget::Wall(_) => self.tuning.wall_hit_damage,
            DamageTarget::Hostile(_) => self.tuning.hostile_hit_damage,
        };
        self.apply_damage(target, amount)
    }

    /// Subtract `amount` health from `target`
    pub fn apply_damage(&mut self, target: DamageTarget, amount: i32) -> DamageOutcome {
        if amount <= 0 {
            return DamageOutcome::Ignored;
        }
        match target {
            DamageTarget::Platform(id) => self.damage_platform(id, amount),
            DamageTarget::Wall(id) => self.damage_wall(id, amount),
            DamageTarget::Hostile(id) => self.damage_hostile(id, amount),
        }
    }

    fn damage_platform(&mut self, id: EntityId, amount: i32) -> DamageOutcome {
        let Some(index) = self.find_platform(id) else {
            log::trace!("Ignoring damage to stale platform {}", id.0);
            return DamageOutcome::Ignored;
        };
        let platform = &mut self.platforms[index];
        platform.health -= amount;
        let health = platform.health;
        if health <= 0 {
            self.remove_platform_at(index, RemovalCause::Destroyed);
            return DamageOutcome::Destroyed;
        }
        self.outbox.push(SceneCommand::SetMaterial {
            id,
            opacity: platform.health_opacity(),
            transmission: 0.0,
        });
        DamageOutcome::Damaged { health }
    }

    fn damage_wall(&mut self, id: EntityId, amount: i32) -> DamageOutcome {
        let Some(index) = self.find_wall(id) else {
            log::trace!("Ignoring damage to stale wall {}", id.0);
            return DamageOutcome::Ignored;
        };
        let platform = &mut self.platforms[index];
        let Some(wall) = platform.wall.as_mut() else {
            return DamageOutcome::Ignored;
        };
        wall.health -= amount;
        let health = wall.health;
        if health > 0 {
            let (opacity, transmission) = wall.glass_response();
            self.outbox.push(SceneCommand::SetMaterial {
                id,
                opacity,
                transmission,
            });
            return DamageOutcome::Damaged { health };
        }

        let at = platform.pos + wall.offset;
        platform.wall = None;
        self.outbox.despawn(id);
        self.effects.spawn_shards(at, self.time_ticks);
        log::debug!("Wall {} shattered", id.0);
        DamageOutcome::Destroyed
    }

    fn damage_hostile(&mut self, id: EntityId, amount: i32) -> DamageOutcome {
        let Some(index) = self.find_hostile(id) else {
            log::trace!("Ignoring damage to stale hostile {}", id.0);
            return DamageOutcome::Ignored;
        };
        let hostile = &mut self.hostiles[index];
        hostile.health -= amount;
        let health = hostile.health;
        if health > 0 {
            return DamageOutcome::Damaged { health };
        }
        self.shatter_hostile(index);
        DamageOutcome::Destroyed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::effects::EffectKind;
    use crate::sim::platform::ShapeKind;
    use glam::Vec3;

    #[test]
    fn test_platform_fades_then_breaks_on_third_hit() {
        let mut w = World::with_seed(2);
        let id = w.force_platform(ShapeKind::Cylinder, Vec3::new(0.0, 2.0, -8.0), 3.0, false);

        assert_eq!(w.hit(DamageTarget::Platform(id)), DamageOutcome::Damaged { health: 66 });
        assert!((w.platform(id).unwrap().health_opacity() - 0.66).abs() < 1e-6);
        assert_eq!(w.hit(DamageTarget::Platform(id)), DamageOutcome::Damaged { health: 32 });
        assert_eq!(w.hit(DamageTarget::Platform(id)), DamageOutcome::Destroyed);
        assert!(w.platform(id).is_none());
        // Later hits on the same id are no-ops
        assert_eq!(w.hit(DamageTarget::Platform(id)), DamageOutcome::Ignored);
    }

    #[test]
    fn test_destroyed_box_crumbles_and_releases_wall() {
        let mut w = World::with_seed(2);
        let id = w.force_platform(ShapeKind::Box, Vec3::new(0.0, 2.0, -8.0), 3.0, true);
        let wall = w.platform(id).unwrap().wall.as_ref().unwrap().id;
        w.drain_commands();

        assert_eq!(w.apply_damage(DamageTarget::Platform(id), 100), DamageOutcome::Destroyed);
        let commands = w.drain_commands();
        for gone in [id, wall] {
            assert!(commands.contains(&SceneCommand::RemoveNode(gone)));
            assert!(commands.contains(&SceneCommand::RemoveBody(gone)));
        }
        let kinds: Vec<_> = w.effects().iter().map(|e| e.kind).collect();
        assert!(kinds.contains(&EffectKind::Crumble));
        assert!(kinds.contains(&EffectKind::Debris));
    }

    #[test]
    fn test_wall_shatters_in_one_hit_platform_survives() {
        let mut w = World::with_seed(2);
        let id = w.force_platform(ShapeKind::Box, Vec3::new(0.0, 2.0, -8.0), 3.0, true);
        let wall = w.platform(id).unwrap().wall.as_ref().unwrap().id;

        assert_eq!(w.hit(DamageTarget::Wall(wall)), DamageOutcome::Destroyed);
        let platform = w.platform(id).unwrap();
        assert!(platform.wall.is_none());
        assert_eq!(platform.health, 100);
        assert!(w.effects().iter().any(|e| e.kind == EffectKind::Shards));
        assert_eq!(w.hit(DamageTarget::Wall(wall)), DamageOutcome::Ignored);
    }

    #[test]
    fn test_partial_wall_damage_thins_glass() {
        let mut w = World::with_seed(2);
        let id = w.force_platform(ShapeKind::Box, Vec3::ZERO, 3.0, true);
        let wall = w.platform(id).unwrap().wall.as_ref().unwrap().id;
        w.drain_commands();

        assert_eq!(
            w.apply_damage(DamageTarget::Wall(wall), 50),
            DamageOutcome::Damaged { health: 50 }
        );
        let commands = w.drain_commands();
        assert!(commands.iter().any(|c| matches!(
            c,
            SceneCommand::SetMaterial { id: n, opacity, transmission }
                if *n == wall && (*opacity - 0.15).abs() < 1e-6 && (*transmission - 0.45).abs() < 1e-6
        )));
    }

    #[test]
    fn test_hostile_breaks_in_one_hit() {
        let mut w = World::with_seed(2);
        let id = w.spawn_hostile(Vec3::new(0.0, 5.0, -20.0));
        assert_eq!(w.hit(DamageTarget::Hostile(id)), DamageOutcome::Destroyed);
        assert!(w.hostiles().is_empty());
        assert!(w.effects().iter().any(|e| e.kind == EffectKind::HostileBurst));
    }

    #[test]
    fn test_non_positive_damage_ignored() {
        let mut w = World::with_seed(2);
        let id = w.force_platform(ShapeKind::Cone, Vec3::ZERO, 3.0, false);
        assert_eq!(w.apply_damage(DamageTarget::Platform(id), 0), DamageOutcome::Ignored);
        assert_eq!(w.apply_damage(DamageTarget::Platform(id), -10), DamageOutcome::Ignored);
        assert_eq!(w.platform(id).unwrap().health, 100);
    }
}
