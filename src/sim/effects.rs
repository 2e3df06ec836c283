//! Short-lived cosmetic effects
//!
//! Every burst, crumble and collection animation is a task in one registry.
//! Tasks expire on their own after a fixed number of ticks; tasks with an
//! owner are revoked when that owner leaves the world. Effects never touch
//! simulation state except to release the node a collection animation holds.
//!
//! Effects draw from their own RNG stream so particle quality settings never
//! change the generated world.

use glam::{Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::scene::{EntityId, Outbox, SceneCommand};
use crate::consts::SIM_DT;
use crate::settings::Settings;

/// Convert seconds to whole simulation ticks
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs / SIM_DT).round().max(0.0) as u64
}

/// Effect families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Grey points drifting up from a destroyed platform
    Debris,
    /// Slab broken into a falling chunk grid
    Crumble,
    /// Glass shards from a shattered wall
    Shards,
    /// Shards from a destroyed hostile
    HostileBurst,
    /// Jittering cracks on an armed trap
    Cracking,
    /// Gold sparkle at a collected pickup
    Sparkle,
    /// Shrink-and-rise of a collected pickup's node
    Collect,
}

/// One particle, shard or chunk
#[derive(Debug, Clone, Copy)]
pub struct Fragment {
    pub pos: Vec3,
    /// Units per second
    pub vel: Vec3,
    /// Euler angles (radians)
    pub rotation: Vec3,
    /// Radians per tick, damped for shards
    pub spin: Vec3,
    pub size: Vec3,
    pub color: u32,
}

/// A running effect
#[derive(Debug, Clone)]
pub struct Effect {
    pub id: u32,
    pub kind: EffectKind,
    /// Entity this effect is bound to; revoked when it is removed
    pub owner: Option<EntityId>,
    pub started: u64,
    /// Lifetime in ticks (None = until revoked)
    pub lifetime: Option<u64>,
    pub fragments: Vec<Fragment>,
    /// Opacity at age zero
    pub base_opacity: f32,
    pub opacity: f32,
    /// Node released when the effect ends (collection animation)
    pub releases: Option<EntityId>,
    /// Start position/rotation of the animated node
    anchor: Vec3,
    anchor_rotation: Quat,
}

impl Effect {
    /// Normalised age in [0, 1] (0 for unbounded effects)
    pub fn progress(&self, now: u64) -> f32 {
        match self.lifetime {
            Some(0) => 1.0,
            Some(life) => (now.saturating_sub(self.started) as f32 / life as f32).min(1.0),
            None => 0.0,
        }
    }

    fn expired(&self, now: u64) -> bool {
        self.lifetime
            .is_some_and(|life| now.saturating_sub(self.started) >= life)
    }
}

const CRUMBLE_GRID: usize = 8;
const CRUMBLE_GRAVITY: f32 = -9.82;
const SHARD_GRAVITY: f32 = -18.0;
const HOSTILE_SHARD_GRAVITY: f32 = -12.0;

/// Registry of running effects
#[derive(Debug)]
pub struct Effects {
    tasks: Vec<Effect>,
    next_id: u32,
    rng: Pcg32,
    settings: Settings,
}

impl Effects {
    pub fn new(seed: u64, settings: Settings) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Effects bound to `owner`
    pub fn owned_by(&self, owner: EntityId) -> impl Iterator<Item = &Effect> {
        self.tasks.iter().filter(move |e| e.owner == Some(owner))
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        kind: EffectKind,
        owner: Option<EntityId>,
        now: u64,
        lifetime: Option<u64>,
        fragments: Vec<Fragment>,
        base_opacity: f32,
        releases: Option<EntityId>,
        anchor: Vec3,
        anchor_rotation: Quat,
    ) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.push(Effect {
            id,
            kind,
            owner,
            started: now,
            lifetime,
            fragments,
            base_opacity,
            opacity: base_opacity,
            releases,
            anchor,
            anchor_rotation,
        });
        id
    }

    fn signed(&mut self) -> f32 {
        self.rng.random::<f32>() - 0.5
    }

    fn point(&self, pos: Vec3, vel: Vec3, size: f32, color: u32) -> Fragment {
        Fragment {
            pos,
            vel,
            rotation: Vec3::ZERO,
            spin: Vec3::ZERO,
            size: Vec3::splat(size),
            color,
        }
    }

    /// Points rising from a destroyed platform (1 s)
    pub fn spawn_debris(&mut self, at: Vec3, now: u64) -> Option<u32> {
        let count = self.settings.fragment_count(20);
        if count == 0 {
            return None;
        }
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = Vec3::new(self.signed(), self.signed(), self.signed()) * 2.0;
            let grey = 0.5 + self.rng.random::<f32>() * 0.2;
            let shade = (grey * 255.0) as u32;
            let color = (shade << 16) | (shade << 8) | shade;
            fragments.push(self.point(at + offset, Vec3::new(0.0, 6.0, 0.0), 0.2, color));
        }
        Some(self.push(
            EffectKind::Debris,
            None,
            now,
            Some(secs_to_ticks(1.0)),
            fragments,
            1.0,
            None,
            at,
            Quat::IDENTITY,
        ))
    }

    /// Chunk grid covering a slab of `extent`, thrown apart under gravity (2 s)
    pub fn spawn_crumble(&mut self, center: Vec3, extent: Vec3, color: u32, now: u64) -> Option<u32> {
        if !self.settings.particles {
            return None;
        }
        // Quality trims the grid resolution, not the covered area
        let side = ((self.settings.fragment_count(CRUMBLE_GRID * CRUMBLE_GRID) as f32).sqrt().round()
            as usize)
            .clamp(1, CRUMBLE_GRID);
        let chunk = Vec3::new(extent.x / side as f32, extent.y, extent.z / side as f32);
        let mut fragments = Vec::with_capacity(side * side);
        for ix in 0..side {
            for iz in 0..side {
                let pos = Vec3::new(
                    center.x - extent.x / 2.0 + chunk.x * (ix as f32 + 0.5),
                    center.y,
                    center.z - extent.z / 2.0 + chunk.z * (iz as f32 + 0.5),
                );
                let vel = Vec3::new(self.signed() * 2.0, self.rng.random::<f32>() * 2.0, self.signed() * 2.0);
                let spin = Vec3::new(self.signed(), self.signed(), self.signed()) * 2.0 * SIM_DT;
                fragments.push(Fragment {
                    pos,
                    vel,
                    rotation: Vec3::ZERO,
                    spin,
                    size: chunk,
                    color,
                });
            }
        }
        Some(self.push(
            EffectKind::Crumble,
            None,
            now,
            Some(secs_to_ticks(2.0)),
            fragments,
            0.8,
            None,
            center,
            Quat::IDENTITY,
        ))
    }

    /// Glass shards from a shattered wall (2 s)
    pub fn spawn_shards(&mut self, at: Vec3, now: u64) -> Option<u32> {
        let count = self.settings.fragment_count(100);
        if count == 0 {
            return None;
        }
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let phi = self.rng.random::<f32>() * std::f32::consts::TAU;
            let theta = self.rng.random::<f32>() * std::f32::consts::PI;
            let radius = 0.1 + self.rng.random::<f32>() * 0.5;
            let offset = Vec3::new(
                radius * phi.sin() * theta.cos(),
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
            );
            // Per-frame velocities of (±0.1, 0..0.3, ±0.1) at 60 Hz
            let vel = Vec3::new(
                self.signed() * 0.2,
                self.rng.random::<f32>() * 0.3,
                self.signed() * 0.2,
            ) / SIM_DT;
            let rotation = Vec3::new(
                self.rng.random::<f32>(),
                self.rng.random::<f32>(),
                self.rng.random::<f32>(),
            ) * std::f32::consts::TAU;
            let tint_r = 0.8 + self.rng.random::<f32>() * 0.2;
            let tint_g = 0.9 + self.rng.random::<f32>() * 0.1;
            let color = (((tint_r * 255.0) as u32) << 16) | (((tint_g * 255.0) as u32) << 8) | 0xff;
            fragments.push(Fragment {
                pos: at + offset,
                vel,
                rotation,
                spin: Vec3::ZERO,
                size: Vec3::splat(0.02 + self.rng.random::<f32>() * 0.03),
                color,
            });
        }
        Some(self.push(
            EffectKind::Shards,
            None,
            now,
            Some(secs_to_ticks(2.0)),
            fragments,
            0.8,
            None,
            at,
            Quat::IDENTITY,
        ))
    }

    /// Radial shard burst from a destroyed hostile (1.2 s)
    pub fn spawn_hostile_burst(&mut self, at: Vec3, color: u32, now: u64) -> Option<u32> {
        let count = self.settings.fragment_count(75);
        if count == 0 {
            return None;
        }
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = Vec3::new(self.signed(), self.signed(), self.signed()) * 0.2;
            let theta = self.rng.random::<f32>() * std::f32::consts::TAU;
            let phi = self.rng.random::<f32>() * std::f32::consts::PI;
            let speed = 3.0 + self.rng.random::<f32>() * 4.0;
            let vel = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()) * speed;
            let spin = Vec3::new(self.signed(), self.signed(), self.signed()) * 0.2;
            fragments.push(Fragment {
                pos: at + offset,
                vel,
                rotation: Vec3::ZERO,
                spin,
                size: Vec3::splat(0.03 + self.rng.random::<f32>() * 0.02),
                color,
            });
        }
        Some(self.push(
            EffectKind::HostileBurst,
            None,
            now,
            Some(secs_to_ticks(1.2)),
            fragments,
            1.0,
            None,
            at,
            Quat::IDENTITY,
        ))
    }

    /// Cracks on an armed trap; lives until the trap is removed
    pub fn spawn_cracking(&mut self, owner: EntityId, at: Vec3, now: u64) -> Option<u32> {
        let count = self.settings.fragment_count(20);
        if count == 0 {
            return None;
        }
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = Vec3::new(self.signed() * 2.0, 0.0, self.signed() * 2.0);
            fragments.push(self.point(at + offset, Vec3::ZERO, 0.1, 0x333333));
        }
        Some(self.push(
            EffectKind::Cracking,
            Some(owner),
            now,
            None,
            fragments,
            0.8,
            None,
            at,
            Quat::IDENTITY,
        ))
    }

    /// Gold sparkle at a collected pickup (0.5 s)
    pub fn spawn_sparkle(&mut self, at: Vec3, now: u64) -> Option<u32> {
        let count = self.settings.fragment_count(10);
        if count == 0 {
            return None;
        }
        let mut fragments = Vec::with_capacity(count);
        for _ in 0..count {
            let offset = Vec3::new(self.signed(), self.signed(), self.signed()) * 0.5;
            fragments.push(self.point(at + offset, Vec3::new(0.0, 3.0, 0.0), 0.1, 0xffd600));
        }
        Some(self.push(
            EffectKind::Sparkle,
            None,
            now,
            Some(secs_to_ticks(0.5)),
            fragments,
            1.0,
            None,
            at,
            Quat::IDENTITY,
        ))
    }

    /// Shrink `node` to nothing while lifting it 2 units, then release it (0.5 s)
    ///
    /// Always runs, even with particles disabled, because it owns the node.
    pub fn spawn_collect(&mut self, node: EntityId, start: Vec3, rotation: Quat, now: u64) -> u32 {
        self.push(
            EffectKind::Collect,
            Some(node),
            now,
            Some(secs_to_ticks(0.5)),
            Vec::new(),
            1.0,
            Some(node),
            start,
            rotation,
        )
    }

    /// Revoke every effect bound to `owner`; returns how many were dropped
    pub fn cancel_owned(&mut self, owner: EntityId, outbox: &mut Outbox) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|e| {
            if e.owner != Some(owner) {
                return true;
            }
            if let Some(node) = e.releases {
                outbox.push(SceneCommand::RemoveNode(node));
            }
            false
        });
        before - self.tasks.len()
    }

    /// Drop every effect, releasing any nodes they hold
    pub fn clear(&mut self, outbox: &mut Outbox) {
        for effect in self.tasks.drain(..) {
            if let Some(node) = effect.releases {
                outbox.push(SceneCommand::RemoveNode(node));
            }
        }
    }

    /// Advance every effect one tick and retire the expired ones
    pub fn tick(&mut self, now: u64, outbox: &mut Outbox) {
        let dt = SIM_DT;
        let rng = &mut self.rng;

        for effect in &mut self.tasks {
            let t = effect.progress(now);
            match effect.kind {
                EffectKind::Debris | EffectKind::Sparkle => {
                    let jitter = if effect.kind == EffectKind::Debris { 0.1 } else { 0.05 };
                    for f in &mut effect.fragments {
                        f.pos += f.vel * dt;
                        f.pos.x += (rng.random::<f32>() - 0.5) * jitter;
                        f.pos.z += (rng.random::<f32>() - 0.5) * jitter;
                    }
                    effect.opacity = effect.base_opacity * (1.0 - t);
                }
                EffectKind::Crumble | EffectKind::Shards | EffectKind::HostileBurst => {
                    let (gravity, damping) = match effect.kind {
                        EffectKind::Crumble => (CRUMBLE_GRAVITY, 1.0),
                        EffectKind::Shards => (SHARD_GRAVITY, 1.0),
                        _ => (HOSTILE_SHARD_GRAVITY, 0.98),
                    };
                    for f in &mut effect.fragments {
                        f.vel.y += gravity * dt;
                        f.pos += f.vel * dt;
                        f.rotation += f.spin;
                        f.spin *= damping;
                    }
                    effect.opacity = effect.base_opacity * (1.0 - t);
                }
                EffectKind::Cracking => {
                    for f in &mut effect.fragments {
                        f.pos.x += (rng.random::<f32>() - 0.5) * 0.02;
                        f.pos.z += (rng.random::<f32>() - 0.5) * 0.02;
                        f.rotation.y += 0.01;
                    }
                }
                EffectKind::Collect => {
                    if let Some(node) = effect.releases {
                        outbox.push(SceneCommand::SetTransform {
                            id: node,
                            position: effect.anchor + Vec3::new(0.0, 2.0 * t, 0.0),
                            rotation: effect.anchor_rotation,
                            scale: 1.0 - t,
                        });
                    }
                }
            }
        }

        self.tasks.retain(|e| {
            if !e.expired(now) {
                return true;
            }
            if let Some(node) = e.releases {
                outbox.push(SceneCommand::RemoveNode(node));
            }
            false
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::QualityPreset;

    fn effects() -> Effects {
        Effects::new(42, Settings::from_preset(QualityPreset::High))
    }

    #[test]
    fn test_burst_expires_after_lifetime() {
        let mut fx = effects();
        let mut outbox = Outbox::default();
        fx.spawn_debris(Vec3::ZERO, 0);
        let life = secs_to_ticks(1.0);
        for now in 1..life {
            fx.tick(now, &mut outbox);
        }
        assert_eq!(fx.len(), 1);
        fx.tick(life, &mut outbox);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_shards_fall_and_fade() {
        let mut fx = effects();
        let mut outbox = Outbox::default();
        fx.spawn_shards(Vec3::new(0.0, 5.0, 0.0), 0);
        let start_vy: Vec<f32> = fx.iter().next().unwrap().fragments.iter().map(|f| f.vel.y).collect();
        fx.tick(30, &mut outbox);
        let effect = fx.iter().next().unwrap();
        assert_eq!(effect.fragments.len(), 100);
        for (f, vy) in effect.fragments.iter().zip(start_vy) {
            assert!(f.vel.y < vy);
        }
        assert!(effect.opacity < 0.8 && effect.opacity > 0.0);
    }

    #[test]
    fn test_cracking_lives_until_cancelled() {
        let mut fx = effects();
        let mut outbox = Outbox::default();
        let trap = EntityId(9);
        fx.spawn_cracking(trap, Vec3::ZERO, 0);
        for now in 1..1000 {
            fx.tick(now, &mut outbox);
        }
        assert_eq!(fx.owned_by(trap).count(), 1);
        assert_eq!(fx.cancel_owned(trap, &mut outbox), 1);
        assert_eq!(fx.owned_by(trap).count(), 0);
    }

    #[test]
    fn test_collect_animation_releases_node_once() {
        let mut fx = effects();
        let mut outbox = Outbox::default();
        let node = EntityId(5);
        fx.spawn_collect(node, Vec3::new(0.0, 1.5, 0.0), Quat::IDENTITY, 0);
        let life = secs_to_ticks(0.5);
        for now in 1..=life + 10 {
            fx.tick(now, &mut outbox);
        }
        let commands = outbox.drain();
        let removals = commands
            .iter()
            .filter(|c| **c == SceneCommand::RemoveNode(node))
            .count();
        assert_eq!(removals, 1);
        // Last transform before release is fully shrunk and raised
        let last = commands
            .iter()
            .rev()
            .find_map(|c| match c {
                SceneCommand::SetTransform { position, scale, .. } => Some((*position, *scale)),
                _ => None,
            })
            .unwrap();
        assert!((last.0.y - 3.5).abs() < 1e-4);
        assert!(last.1.abs() < 1e-4);
    }

    #[test]
    fn test_cancel_collect_still_releases_node() {
        let mut fx = effects();
        let mut outbox = Outbox::default();
        let node = EntityId(5);
        fx.spawn_collect(node, Vec3::ZERO, Quat::IDENTITY, 0);
        fx.cancel_owned(node, &mut outbox);
        assert_eq!(outbox.drain(), vec![SceneCommand::RemoveNode(node)]);
    }

    #[test]
    fn test_particles_disabled_spawns_nothing_but_collect() {
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        let mut fx = Effects::new(1, settings);
        assert!(fx.spawn_debris(Vec3::ZERO, 0).is_none());
        assert!(fx.spawn_crumble(Vec3::ZERO, Vec3::ONE, 0, 0).is_none());
        assert!(fx.spawn_shards(Vec3::ZERO, 0).is_none());
        fx.spawn_collect(EntityId(1), Vec3::ZERO, Quat::IDENTITY, 0);
        assert_eq!(fx.len(), 1);
    }

    #[test]
    fn test_crumble_grid_covers_slab() {
        let mut fx = effects();
        fx.spawn_crumble(Vec3::new(0.0, 2.0, -10.0), Vec3::new(4.0, 0.5, 8.0), 0x336699, 0);
        let effect = fx.iter().next().unwrap();
        assert_eq!(effect.fragments.len(), 64);
        let min_x = effect.fragments.iter().map(|f| f.pos.x).fold(f32::MAX, f32::min);
        let max_z = effect.fragments.iter().map(|f| f.pos.z).fold(f32::MIN, f32::max);
        assert!((min_x - -1.75).abs() < 1e-5);
        assert!((max_z - -6.5).abs() < 1e-5);
    }
}
