//! Fixed timestep simulation tick
//!
//! One call advances the world by [`SIM_DT`]: platform motion, row streaming
//! and retirement, pickup spin, trap countdowns, hostiles and effects.

use glam::{Quat, Vec3};
use rand::Rng;

use super::effects::secs_to_ticks;
use super::scene::SceneCommand;
use super::state::{RemovalCause, World};
use crate::consts::*;
use crate::{behind_by, depth_of, z_at_depth};

/// Player snapshot for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player body position
    pub player_pos: Vec3,
    /// Facing direction (used to aim hostile spawns)
    pub player_forward: Vec3,
}

impl TickInput {
    /// Player at `pos` looking down the run direction
    pub fn at(pos: Vec3) -> Self {
        Self {
            player_pos: pos,
            player_forward: Vec3::NEG_Z,
        }
    }
}

/// Advance the world by one fixed timestep
pub fn tick(world: &mut World, input: &TickInput) {
    world.time_ticks += 1;
    let player = input.player_pos;

    update_movement(world);
    generate_rows(world, player);
    retire_passed(world, player);
    spin_collectibles(world);
    update_traps(world, player);
    world.effects.tick(world.time_ticks, &mut world.outbox);
    world.update_hostiles(player, input.player_forward);
}

impl World {
    /// Advance one tick with the player at `player`
    pub fn advance(&mut self, player: Vec3) {
        tick(self, &TickInput::at(player));
    }
}

/// Re-derive moving platform positions and carry their walls along
fn update_movement(world: &mut World) {
    let now = world.time();
    for platform in &mut world.platforms {
        let Some(pattern) = platform.movement else {
            continue;
        };
        platform.pos = pattern.position_at(now);
        world
            .outbox
            .move_to(platform.id, platform.pos, platform.rotation());
        if let Some(wall) = &platform.wall {
            world
                .outbox
                .move_to(wall.id, platform.pos + wall.offset, Quat::IDENTITY);
        }
    }
}

/// Emit rows until the frontier is far enough ahead of the player
fn generate_rows(world: &mut World, player: Vec3) {
    let spacing = world.tuning.row_spacing;
    if spacing <= 0.0 {
        log::warn!("Row spacing {} cannot advance the frontier", spacing);
        return;
    }
    let target = depth_of(player) + world.tuning.generation_distance;
    while world.frontier < target {
        let depth = world.frontier + spacing;
        emit_row(world, depth);
        world.frontier = depth;
    }
}

/// Place one row of platforms at `depth`, with at most one pickup
pub fn emit_row(world: &mut World, depth: f32) {
    let row_min = world.tuning.row_min.max(1);
    let row_max = world.tuning.row_max.max(row_min);
    let count = world.rng.random_range(row_min..=row_max);
    let pickup_slot = world.rng.random_range(0..count);

    let mut placed = 0;
    for i in 0..count {
        let x = (world.rng.random::<f32>() - 0.5) * world.tuning.lateral_spread;
        let y = world.tuning.height_band.lerp(world.rng.random::<f32>());
        let Some(id) = world.spawn_platform_at(Vec3::new(x, y, z_at_depth(depth))) else {
            continue;
        };
        placed += 1;
        if i == pickup_slot && world.rng.random::<f32>() < world.tuning.collectible_chance {
            let lift = Vec3::Y * world.tuning.collectible_lift;
            if let Some(pos) = world.platform(id).map(|p| p.pos) {
                world.spawn_collectible_at(pos + lift);
            }
        }
    }
    log::debug!("Row at depth {}: {}/{} platforms placed", depth, placed, count);
}

/// Silently release platforms and pickups too far behind the player
fn retire_passed(world: &mut World, player: Vec3) {
    let limit = world.tuning.removal_distance;

    let mut i = 0;
    while i < world.platforms.len() {
        if behind_by(player, world.platforms[i].pos) > limit {
            world.remove_platform_at(i, RemovalCause::Distance);
        } else {
            i += 1;
        }
    }

    let outbox = &mut world.outbox;
    world.collectibles.retain(|c| {
        if behind_by(player, c.pos) > limit {
            outbox.despawn(c.id);
            false
        } else {
            true
        }
    });
}

fn spin_collectibles(world: &mut World) {
    for c in &mut world.collectibles {
        c.spin += COLLECTIBLE_SPIN;
        world.outbox.push(SceneCommand::SetTransform {
            id: c.id,
            position: c.pos,
            rotation: c.rotation(),
            scale: 1.0,
        });
    }
}

/// Fade armed traps, collapse expired ones, arm dormant ones in range
fn update_traps(world: &mut World, player: Vec3) {
    let now = world.time_ticks;
    let delay = secs_to_ticks(world.tuning.trap_break_delay);

    let mut i = 0;
    while i < world.platforms.len() {
        let platform = &world.platforms[i];
        if let Some(trap) = platform.trap
            && trap.armed_at.is_some()
        {
            if trap.expired(now, delay) {
                log::debug!("Trap {} collapsed", platform.id.0);
                world.remove_platform_at(i, RemovalCause::Collapsed);
                continue;
            }
            world.outbox.push(SceneCommand::SetMaterial {
                id: platform.id,
                opacity: 1.0 - trap.progress(now, delay),
                transmission: 0.0,
            });
        }
        i += 1;
    }

    let radius = world.tuning.trap_trigger_radius;
    for platform in &mut world.platforms {
        if let Some(trap) = platform.trap.as_mut()
            && platform.pos.distance(player) < radius
            && trap.arm(now)
        {
            world.effects.spawn_cracking(platform.id, platform.pos, now);
            log::debug!("Trap {} armed at tick {}", platform.id.0, now);
        }
    }
}
