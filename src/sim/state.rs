//! World state and entity registries
//!
//! All live simulation state lives in [`World`]: platforms, pickups, hostiles,
//! the streaming frontier, the score ledger and the outgoing scene commands.
//! Lists are kept sorted by entity id so iteration order is deterministic.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collectible::{Collectible, CollectibleKind, SpawnError, build_collectible};
use super::effects::Effects;
use super::hostiles::Hostile;
use super::overlap::{Footprint, PlacementPolicy, resolve_placement};
use super::platform::{
    Platform, PlatformBuild, PlatformIds, ShapeKind, build_box, build_cone, build_cylinder,
    build_random, build_trap,
};
use super::scene::{EntityId, Outbox, SceneCommand};
use super::score::ScoreLedger;
use crate::consts::*;
use crate::depth_of;
use crate::settings::Settings;
use crate::tuning::WorldTuning;

/// Hand-placed opening platforms, nearest first
pub const SEED_PLATFORMS: [Vec3; 8] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(3.0, 1.0, -4.0),
    Vec3::new(-4.0, 2.0, -8.0),
    Vec3::new(2.0, 3.0, -12.0),
    Vec3::new(-2.0, 4.0, -16.0),
    Vec3::new(5.0, 2.0, -20.0),
    Vec3::new(-6.0, 3.0, -24.0),
    Vec3::new(0.0, 4.0, -28.0),
];

/// Why a platform is leaving the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// Fell too far behind the player (silent)
    Distance,
    /// Health reached zero
    Destroyed,
    /// Trap delay elapsed
    Collapsed,
    /// World reset (silent)
    Reset,
}

/// The streaming world
#[derive(Debug)]
pub struct World {
    /// Run seed for reproducibility
    pub seed: u64,
    pub tuning: WorldTuning,
    pub(crate) rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Depth of the furthest emitted row
    pub(crate) frontier: f32,
    /// Live platforms (sorted by id)
    pub(crate) platforms: Vec<Platform>,
    /// Live, uncollected pickups (sorted by id)
    pub(crate) collectibles: Vec<Collectible>,
    /// Live hostiles (sorted by id)
    pub(crate) hostiles: Vec<Hostile>,
    /// Tick of the last hostile spawn
    pub(crate) last_hostile_spawn: Option<u64>,
    /// Cosmetic effect tasks
    pub(crate) effects: Effects,
    pub(crate) score: ScoreLedger,
    pub(crate) outbox: Outbox,
    initialized: bool,
    /// Next entity ID
    next_id: u32,
}

impl World {
    /// Create an empty world; call [`World::initialize`] to place the seeds
    pub fn new(seed: u64, tuning: WorldTuning, settings: Settings) -> Self {
        Self {
            seed,
            tuning,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            frontier: 0.0,
            platforms: Vec::new(),
            collectibles: Vec::new(),
            hostiles: Vec::new(),
            last_hostile_spawn: None,
            effects: Effects::new(seed, settings),
            score: ScoreLedger::default(),
            outbox: Outbox::default(),
            initialized: false,
            next_id: 1,
        }
    }

    /// World with default tuning and settings
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, WorldTuning::default(), Settings::default())
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id += 1;
        EntityId(id)
    }

    /// Simulation time in seconds
    pub fn time(&self) -> f32 {
        self.time_ticks as f32 * SIM_DT
    }

    /// Place the seed platforms and their pickups
    ///
    /// Does nothing if the world is already populated.
    pub fn initialize(&mut self) {
        if self.initialized {
            log::debug!("World already initialized, ignoring");
            return;
        }
        self.initialized = true;

        let mut deepest = 0.0f32;
        for requested in SEED_PLATFORMS {
            deepest = deepest.max(depth_of(requested));
            let placed = self.spawn_platform_at(requested);
            if let Some(pos) = placed.and_then(|id| self.platform(id)).map(|p| p.pos)
                && self.rng.random::<f32>() < self.tuning.collectible_chance
            {
                let kind = CollectibleKind::roll(&mut self.rng);
                self.spawn_collectible(kind, pos + Vec3::Y * self.tuning.collectible_lift);
            }
        }
        self.frontier = deepest;
        self.outbox.push(SceneCommand::ScoreChanged(self.score.get()));

        log::info!(
            "World initialized: seed={}, {} platforms, {} collectibles, frontier={}",
            self.seed,
            self.platforms.len(),
            self.collectibles.len(),
            self.frontier
        );
    }

    /// Release every entity and effect, reset score and streaming, re-seed
    pub fn restart(&mut self) {
        while !self.platforms.is_empty() {
            self.remove_platform_at(self.platforms.len() - 1, RemovalCause::Reset);
        }
        for c in self.collectibles.drain(..) {
            self.outbox.despawn(c.id);
        }
        for h in self.hostiles.drain(..) {
            self.outbox.despawn(h.id);
        }
        self.effects.clear(&mut self.outbox);
        self.reset_score();
        self.frontier = 0.0;
        self.last_hostile_spawn = None;
        self.initialized = false;

        log::info!("World restarting");
        self.initialize();
    }

    // === Queries ===

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn platform(&self, id: EntityId) -> Option<&Platform> {
        self.find_platform(id).map(|i| &self.platforms[i])
    }

    pub fn collectibles(&self) -> &[Collectible] {
        &self.collectibles
    }

    pub fn hostiles(&self) -> &[Hostile] {
        &self.hostiles
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Depth of the furthest emitted row
    pub fn frontier(&self) -> f32 {
        self.frontier
    }

    pub fn score(&self) -> u32 {
        self.score.get()
    }

    /// Commands queued since the last drain
    pub fn pending_commands(&self) -> &[SceneCommand] {
        self.outbox.as_slice()
    }

    /// Hand queued commands to the host
    pub fn drain_commands(&mut self) -> Vec<SceneCommand> {
        self.outbox.drain()
    }

    pub(crate) fn find_platform(&self, id: EntityId) -> Option<usize> {
        self.platforms.binary_search_by_key(&id, |p| p.id).ok()
    }

    pub(crate) fn find_wall(&self, id: EntityId) -> Option<usize> {
        self.platforms
            .iter()
            .position(|p| p.wall.as_ref().is_some_and(|w| w.id == id))
    }

    // === Spawning ===

    fn placement_policy(&self) -> PlacementPolicy {
        PlacementPolicy {
            buffer: self.tuning.overlap_buffer,
            retries: self.tuning.placement_retries,
            jitter: self.tuning.placement_jitter,
        }
    }

    fn reserve_platform_ids(&mut self) -> PlatformIds {
        let platform = self.next_entity_id();
        // Wall id is only consumed if the build actually has a wall
        PlatformIds {
            platform,
            wall: EntityId(self.next_id),
        }
    }

    /// Roll a random platform near `requested` and add it if it fits
    ///
    /// Returns `None` (and adds nothing) when every placement attempt overlaps
    /// a live platform.
    pub fn spawn_platform_at(&mut self, requested: Vec3) -> Option<EntityId> {
        let width = self.tuning.platform_width.lerp(self.rng.random::<f32>());
        // Reserve the slab footprint regardless of shape
        let footprint = Footprint::new(width, self.tuning.slab_length);
        let live: Vec<_> = self.platforms.iter().map(Platform::placed_footprint).collect();
        let policy = self.placement_policy();

        let Some(pos) = resolve_placement(requested, footprint, &live, policy, &mut self.rng) else {
            log::trace!("Dropped platform at {:?}: no free placement", requested);
            return None;
        };

        let ids = self.reserve_platform_ids();
        let now = self.time();
        let build = build_random(ids, pos, width, now, &self.tuning, &mut self.rng);
        Some(self.insert_platform(build))
    }

    /// Add a platform of `kind` exactly at `pos`, skipping placement checks
    pub fn force_platform(&mut self, kind: ShapeKind, pos: Vec3, width: f32, with_wall: bool) -> EntityId {
        let ids = self.reserve_platform_ids();
        let build = match kind {
            ShapeKind::Box => build_box(ids, pos, width, None, with_wall, &self.tuning, &mut self.rng),
            ShapeKind::Cone => build_cone(ids.platform, pos, width, None, &mut self.rng),
            ShapeKind::Cylinder => build_cylinder(ids.platform, pos, width, None, &mut self.rng),
            ShapeKind::Trap => build_trap(ids.platform, pos, width, self.tuning.slab_length),
        };
        self.insert_platform(build)
    }

    fn insert_platform(&mut self, build: PlatformBuild) -> EntityId {
        let PlatformBuild {
            platform,
            visual,
            body,
            wall,
        } = build;
        let id = platform.id;

        self.outbox.spawn(id, visual, body);
        if let (Some((wall_visual, wall_body)), Some(record)) = (wall, platform.wall.as_ref()) {
            self.next_id += 1;
            self.outbox.spawn(record.id, wall_visual, wall_body);
        }

        log::debug!(
            "Platform {} ({:?}) at {:?}{}{}",
            id.0,
            platform.kind,
            platform.pos,
            if platform.movement.is_some() { " moving" } else { "" },
            if platform.wall.is_some() { " +wall" } else { "" }
        );
        self.platforms.push(platform);
        id
    }

    /// Add a pickup of random kind at `pos`
    pub fn spawn_collectible_at(&mut self, pos: Vec3) -> EntityId {
        let kind = CollectibleKind::roll(&mut self.rng);
        self.spawn_collectible(kind, pos)
    }

    /// Add a pickup by kind name ("coin", "gem"/"diamond", "star")
    pub fn spawn_collectible_named(&mut self, name: &str, pos: Vec3) -> Result<EntityId, SpawnError> {
        let kind = CollectibleKind::parse(name)?;
        Ok(self.spawn_collectible(kind, pos))
    }

    pub fn spawn_collectible(&mut self, kind: CollectibleKind, pos: Vec3) -> EntityId {
        let id = self.next_entity_id();
        let (collectible, visual, body) = build_collectible(id, kind, pos);
        self.outbox.spawn(id, visual, body);
        log::debug!("Collectible {} ({}) at {:?}", id.0, kind.as_str(), pos);
        self.collectibles.push(collectible);
        id
    }

    // === Removal ===

    /// Remove the platform at `index`, releasing its wall and bound effects
    pub(crate) fn remove_platform_at(&mut self, index: usize, cause: RemovalCause) {
        let platform = self.platforms.remove(index);
        let now = self.time_ticks;

        self.effects.cancel_owned(platform.id, &mut self.outbox);
        self.outbox.despawn(platform.id);
        if let Some(wall) = &platform.wall {
            self.outbox.despawn(wall.id);
        }

        match cause {
            RemovalCause::Destroyed => {
                if platform.kind.crumbles() {
                    self.effects
                        .spawn_crumble(platform.pos, platform.extent(), platform.color, now);
                }
                self.effects.spawn_debris(platform.pos, now);
            }
            RemovalCause::Collapsed => {
                self.effects
                    .spawn_crumble(platform.pos, platform.extent(), platform.color, now);
            }
            RemovalCause::Distance | RemovalCause::Reset => {}
        }

        log::debug!("Platform {} removed ({:?})", platform.id.0, cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut w = World::with_seed(12345);
        w.initialize();
        w
    }

    #[test]
    fn test_initialize_places_seeds() {
        let w = world();
        assert!(!w.platforms().is_empty());
        assert!(w.platforms().len() <= SEED_PLATFORMS.len());
        assert_eq!(w.frontier(), 28.0);
        assert_eq!(w.score(), 0);
        // Pickups only ever float above seed platforms
        for c in w.collectibles() {
            assert!(w.platforms().iter().any(|p| (p.pos + Vec3::Y * 1.5).distance(c.pos) < 1e-4));
        }
    }

    #[test]
    fn test_initialize_twice_is_noop() {
        let mut w = world();
        let count = w.platforms().len();
        w.initialize();
        assert_eq!(w.platforms().len(), count);
    }

    #[test]
    fn test_ids_sorted_and_unique() {
        let w = world();
        let ids: Vec<_> = w.platforms().iter().map(|p| p.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids, sorted);
        for p in w.platforms() {
            if let Some(wall) = &p.wall {
                assert!(!ids.contains(&wall.id));
                assert!(w.collectibles().iter().all(|c| c.id != wall.id));
            }
        }
    }

    #[test]
    fn test_every_entity_announced_to_host() {
        let mut w = world();
        let commands = w.drain_commands();
        let added = |id: EntityId| {
            commands
                .iter()
                .any(|c| matches!(c, SceneCommand::AddNode { id: n, .. } if *n == id))
                && commands
                    .iter()
                    .any(|c| matches!(c, SceneCommand::AddBody { id: n, .. } if *n == id))
        };
        for p in w.platforms() {
            assert!(added(p.id));
            if let Some(wall) = &p.wall {
                assert!(added(wall.id));
            }
        }
        for c in w.collectibles() {
            assert!(added(c.id));
        }
    }

    #[test]
    fn test_spawn_collectible_named_rejects_unknown() {
        let mut w = World::with_seed(1);
        assert!(w.spawn_collectible_named("gem", Vec3::ZERO).is_ok());
        assert_eq!(
            w.spawn_collectible_named("ruby", Vec3::ZERO),
            Err(SpawnError::UnknownCollectible("ruby".to_string()))
        );
        assert_eq!(w.collectibles().len(), 1);
    }

    #[test]
    fn test_spawn_platform_dropped_when_blocked() {
        let mut w = World::with_seed(3);
        w.force_platform(ShapeKind::Box, Vec3::new(0.0, 2.0, -40.0), 30.0, false);
        let before = w.platforms().len();
        assert!(w.spawn_platform_at(Vec3::new(0.0, 2.0, -40.0)).is_none());
        assert_eq!(w.platforms().len(), before);
    }

    #[test]
    fn test_restart_releases_everything() {
        let mut w = world();
        w.score.collect();
        let live: Vec<_> = w.platforms().iter().map(|p| p.id).collect();
        w.drain_commands();

        w.restart();
        let commands = w.drain_commands();
        for id in live {
            assert!(commands.contains(&SceneCommand::RemoveNode(id)));
            assert!(commands.contains(&SceneCommand::RemoveBody(id)));
        }
        assert_eq!(w.score(), 0);
        assert_eq!(w.frontier(), 28.0);
        assert!(!w.platforms().is_empty());
    }
}
