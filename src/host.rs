//! Host collaborator boundary
//!
//! The simulation only emits [`SceneCommand`]s. A host owns the real scene
//! graph, physics world and HUD and applies those commands once per frame
//! through the traits below. [`HeadlessHost`] is an in-memory host used by the
//! native driver and by tests to check that nothing leaks.

use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::consts::*;
use crate::sim::scene::{BodyDesc, EntityId, SceneCommand, VisualDesc};
use crate::sim::{TickInput, World, tick};

/// Visual scene graph
pub trait SceneGraph {
    fn add(&mut self, id: EntityId, visual: &VisualDesc);
    fn remove(&mut self, id: EntityId);
    fn set_transform(&mut self, id: EntityId, position: Vec3, rotation: Quat, scale: f32);
    fn set_material(&mut self, id: EntityId, opacity: f32, transmission: f32);
}

/// Rigid-body physics world
pub trait PhysicsWorld {
    fn add_body(&mut self, id: EntityId, body: &BodyDesc);
    fn remove_body(&mut self, id: EntityId);
    fn set_body_position(&mut self, id: EntityId, position: Vec3);
}

/// Score readout
pub trait ScoreDisplay {
    fn show_score(&mut self, score: u32);
}

/// Apply queued commands to the host collaborators, in order
pub fn dispatch(
    commands: impl IntoIterator<Item = SceneCommand>,
    scene: &mut impl SceneGraph,
    physics: &mut impl PhysicsWorld,
    display: &mut impl ScoreDisplay,
) {
    for command in commands {
        match command {
            SceneCommand::AddNode { id, visual } => scene.add(id, &visual),
            SceneCommand::RemoveNode(id) => scene.remove(id),
            SceneCommand::SetTransform {
                id,
                position,
                rotation,
                scale,
            } => scene.set_transform(id, position, rotation, scale),
            SceneCommand::SetMaterial {
                id,
                opacity,
                transmission,
            } => scene.set_material(id, opacity, transmission),
            SceneCommand::AddBody { id, body } => physics.add_body(id, &body),
            SceneCommand::RemoveBody(id) => physics.remove_body(id),
            SceneCommand::SetBodyPosition { id, position } => {
                physics.set_body_position(id, position)
            }
            SceneCommand::ScoreChanged(score) => display.show_score(score),
        }
    }
}

/// Fixed-timestep driver: accumulates frame time and runs whole ticks
#[derive(Debug)]
pub struct Runner {
    pub world: World,
    accumulator: f32,
}

impl Runner {
    pub fn new(world: World) -> Self {
        Self {
            world,
            accumulator: 0.0,
        }
    }

    /// Run as many ticks as `frame_dt` covers (capped); returns ticks run
    pub fn update(&mut self, frame_dt: f32, input: &TickInput) -> u32 {
        let dt = frame_dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.world, input);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop time we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = 0.0;
        }
        substeps
    }
}

/// Live node in the headless scene
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessNode {
    pub position: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

/// In-memory scene, physics and HUD
#[derive(Debug, Default)]
pub struct HeadlessHost {
    pub nodes: HashMap<EntityId, HeadlessNode>,
    pub bodies: HashMap<EntityId, Vec3>,
    pub score: u32,
    /// Commands that referenced an id the host did not know
    pub dangling: u32,
}

impl HeadlessHost {
    /// Apply a batch of commands to this host
    pub fn apply(&mut self, commands: Vec<SceneCommand>) {
        let mut scene = HeadlessScene(&mut self.nodes, &mut self.dangling);
        let mut physics = HeadlessPhysics(&mut self.bodies);
        let mut display = HeadlessDisplay(&mut self.score);
        dispatch(commands, &mut scene, &mut physics, &mut display);
    }
}

struct HeadlessScene<'a>(&'a mut HashMap<EntityId, HeadlessNode>, &'a mut u32);
struct HeadlessPhysics<'a>(&'a mut HashMap<EntityId, Vec3>);
struct HeadlessDisplay<'a>(&'a mut u32);

impl SceneGraph for HeadlessScene<'_> {
    fn add(&mut self, id: EntityId, visual: &VisualDesc) {
        let node = HeadlessNode {
            position: visual.position,
            scale: 1.0,
            opacity: visual.material.opacity,
        };
        if self.0.insert(id, node).is_some() {
            log::warn!("Node {} added twice", id.0);
        }
    }

    fn remove(&mut self, id: EntityId) {
        if self.0.remove(&id).is_none() {
            log::warn!("Removing unknown node {}", id.0);
            *self.1 += 1;
        }
    }

    fn set_transform(&mut self, id: EntityId, position: Vec3, _rotation: Quat, scale: f32) {
        match self.0.get_mut(&id) {
            Some(node) => {
                node.position = position;
                node.scale = scale;
            }
            None => *self.1 += 1,
        }
    }

    fn set_material(&mut self, id: EntityId, opacity: f32, _transmission: f32) {
        match self.0.get_mut(&id) {
            Some(node) => node.opacity = opacity,
            None => *self.1 += 1,
        }
    }
}

impl PhysicsWorld for HeadlessPhysics<'_> {
    fn add_body(&mut self, id: EntityId, body: &BodyDesc) {
        self.0.insert(id, body.position);
    }

    fn remove_body(&mut self, id: EntityId) {
        self.0.remove(&id);
    }

    fn set_body_position(&mut self, id: EntityId, position: Vec3) {
        if let Some(pos) = self.0.get_mut(&id) {
            *pos = position;
        }
    }
}

impl ScoreDisplay for HeadlessDisplay<'_> {
    fn show_score(&mut self, score: u32) {
        *self.0 = score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::damage::DamageTarget;

    /// Every node and body the host holds belongs to a live entity (or a
    /// pickup still playing its collect animation)
    fn assert_in_sync(world: &World, host: &HeadlessHost) {
        let mut live = Vec::new();
        for p in world.platforms() {
            live.push(p.id);
            if let Some(wall) = &p.wall {
                live.push(wall.id);
            }
        }
        live.extend(world.collectibles().iter().map(|c| c.id));
        live.extend(world.hostiles().iter().map(|h| h.id));

        for id in &live {
            assert!(host.nodes.contains_key(id), "node {} missing", id.0);
            assert!(host.bodies.contains_key(id), "body {} missing", id.0);
        }
        assert_eq!(host.bodies.len(), live.len());
        let animating = world
            .effects()
            .iter()
            .filter(|e| e.releases.is_some())
            .count();
        assert_eq!(host.nodes.len(), live.len() + animating);
        assert_eq!(host.dangling, 0);
    }

    #[test]
    fn test_long_run_leaves_no_orphans() {
        let mut world = World::with_seed(2024);
        world.initialize();
        let mut runner = Runner::new(world);
        let mut host = HeadlessHost::default();

        let mut player = Vec3::new(0.0, 3.0, 0.0);
        for frame in 0..900 {
            player.z -= 0.15;
            runner.update(SIM_DT, &TickInput::at(player));
            if frame % 20 == 0 {
                let target = runner
                    .world
                    .platforms()
                    .iter()
                    .find_map(|p| p.wall.as_ref().map(|w| w.id));
                if let Some(wall) = target {
                    runner.world.hit(DamageTarget::Wall(wall));
                }
                if let Some(id) = runner.world.platforms().first().map(|p| p.id) {
                    runner.world.hit(DamageTarget::Platform(id));
                }
            }
            runner.world.check_collectible_proximity(player);
            runner.world.check_hostile_contact(player);
            host.apply(runner.world.drain_commands());
            assert_in_sync(&runner.world, &host);
        }
    }

    #[test]
    fn test_restart_empties_host_before_reseeding() {
        let mut world = World::with_seed(5);
        world.initialize();
        let mut host = HeadlessHost::default();
        for i in 0..120 {
            world.advance(Vec3::new(0.0, 3.0, -(i as f32) * 0.3));
        }
        host.apply(world.drain_commands());

        world.restart();
        host.apply(world.drain_commands());
        assert_in_sync(&world, &host);
        assert_eq!(host.score, 0);
    }

    #[test]
    fn test_runner_caps_substeps() {
        let mut runner = Runner::new(World::with_seed(1));
        let input = TickInput::at(Vec3::ZERO);
        assert_eq!(runner.update(1.0, &input), MAX_SUBSTEPS);
        assert_eq!(runner.update(SIM_DT / 2.0, &input), 0);
        assert_eq!(runner.update(SIM_DT / 2.0, &input), 1);
        assert_eq!(runner.world.time_ticks, MAX_SUBSTEPS as u64 + 1);
    }

    #[test]
    fn test_score_reaches_display() {
        let mut world = World::with_seed(5);
        let mut host = HeadlessHost::default();
        world.spawn_collectible(crate::sim::CollectibleKind::Gem, Vec3::ZERO);
        world.check_collectible_proximity(Vec3::ZERO);
        host.apply(world.drain_commands());
        assert_eq!(host.score, 1);
    }
}
