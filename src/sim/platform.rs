//! Platform entities and the platform factory
//!
//! A platform is one record: node/body handle, health, footprint, and the
//! optional wall, movement pattern and trap state that belong to it.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::movement::MovementPattern;
use super::overlap::{Footprint, PlacedFootprint};
use super::scene::{
    BodyDesc, ColliderShape, EntityId, Geometry, MaterialDesc, VisualDesc, Weathering, hsl_to_rgb,
};
use crate::consts::*;
use crate::tuning::WorldTuning;

/// Platform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Weathered slab, may carry a glass wall
    Box,
    /// Four-sided pyramid (collider is a short four-sided cylinder)
    Cone,
    /// Disc
    Cylinder,
    /// Red slab that collapses shortly after the player gets close
    Trap,
}

impl ShapeKind {
    /// Slabs break into a chunk grid when destroyed
    pub fn crumbles(&self) -> bool {
        matches!(self, ShapeKind::Box | ShapeKind::Trap)
    }
}

/// Glass panel standing on a box platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestructibleWall {
    pub id: EntityId,
    pub health: i32,
    pub width: f32,
    pub height: f32,
    /// Wall center relative to the platform center
    pub offset: Vec3,
}

impl DestructibleWall {
    /// Glass tint fades with health: (opacity, transmission)
    pub fn glass_response(&self) -> (f32, f32) {
        let h = (self.health as f32 / MAX_HEALTH as f32).clamp(0.0, 1.0);
        (h * 0.3, h * 0.9)
    }
}

/// Trap countdown state
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TrapState {
    /// Tick the trap was armed (None = dormant)
    pub armed_at: Option<u64>,
}

impl TrapState {
    /// Arm the trap; returns false if it was already armed
    pub fn arm(&mut self, tick: u64) -> bool {
        if self.armed_at.is_some() {
            return false;
        }
        self.armed_at = Some(tick);
        true
    }

    /// Collapse progress in [0, 1] (0 while dormant)
    pub fn progress(&self, now_tick: u64, delay_ticks: u64) -> f32 {
        match self.armed_at {
            None => 0.0,
            Some(_) if delay_ticks == 0 => 1.0,
            Some(at) => (now_tick.saturating_sub(at) as f32 / delay_ticks as f32).min(1.0),
        }
    }

    /// Whether the collapse delay has fully elapsed
    pub fn expired(&self, now_tick: u64, delay_ticks: u64) -> bool {
        self.armed_at
            .is_some_and(|at| now_tick.saturating_sub(at) >= delay_ticks)
    }
}

/// A live platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: EntityId,
    pub kind: ShapeKind,
    pub health: i32,
    /// Position of record (latest derived position for moving platforms)
    pub pos: Vec3,
    pub footprint: Footprint,
    /// Base color 0xRRGGBB (reused by crumble chunks)
    pub color: u32,
    pub movement: Option<MovementPattern>,
    pub wall: Option<DestructibleWall>,
    pub trap: Option<TrapState>,
}

impl Platform {
    pub fn placed_footprint(&self) -> PlacedFootprint {
        PlacedFootprint {
            center: self.pos,
            footprint: self.footprint,
        }
    }

    /// Opacity shown for the current health
    pub fn health_opacity(&self) -> f32 {
        (self.health as f32 / MAX_HEALTH as f32).clamp(0.0, 1.0)
    }

    pub fn is_trap(&self) -> bool {
        self.trap.is_some()
    }

    /// Size of the visual body (X, Y, Z)
    pub fn extent(&self) -> Vec3 {
        match self.kind {
            ShapeKind::Box | ShapeKind::Trap => {
                Vec3::new(self.footprint.width, SLAB_THICKNESS, self.footprint.depth)
            }
            ShapeKind::Cone => Vec3::new(self.footprint.width, CONE_HEIGHT, self.footprint.depth),
            ShapeKind::Cylinder => {
                Vec3::new(self.footprint.width, DISC_HEIGHT, self.footprint.depth)
            }
        }
    }

    /// Visual rotation of the platform node
    pub fn rotation(&self) -> Quat {
        match self.kind {
            ShapeKind::Cone => Quat::from_rotation_y(std::f32::consts::FRAC_PI_4),
            _ => Quat::IDENTITY,
        }
    }
}

/// Everything needed to put a freshly built platform into the scene
#[derive(Debug, Clone)]
pub struct PlatformBuild {
    pub platform: Platform,
    pub visual: VisualDesc,
    pub body: BodyDesc,
    /// Wall node and body (box platforms with a wall only)
    pub wall: Option<(VisualDesc, BodyDesc)>,
}

/// Ids reserved for a platform and its possible wall
#[derive(Debug, Clone, Copy)]
pub struct PlatformIds {
    pub platform: EntityId,
    pub wall: EntityId,
}

/// Random pleasant platform color
pub fn random_platform_color(rng: &mut impl Rng) -> u32 {
    hsl_to_rgb(rng.random::<f32>(), 0.55, 0.55)
}

/// Roll shape, motion and wall for a platform at `pos`
///
/// `width` has already been rolled by the caller because placement needs it.
pub fn build_random(
    ids: PlatformIds,
    pos: Vec3,
    width: f32,
    now: f32,
    tuning: &WorldTuning,
    rng: &mut impl Rng,
) -> PlatformBuild {
    let moving = rng.random::<f32>() < tuning.moving_chance;
    let trap = rng.random::<f32>() < tuning.trap_chance;

    if trap {
        return build_trap(ids.platform, pos, width, tuning.slab_length);
    }

    let movement = moving.then(|| MovementPattern::random(pos, now, tuning, rng));
    let roll = rng.random::<f32>();
    if roll < 0.33 {
        let with_wall = rng.random::<f32>() < tuning.wall_chance;
        build_box(ids, pos, width, movement, with_wall, tuning, rng)
    } else if roll < 0.66 {
        build_cone(ids.platform, pos, width, movement, rng)
    } else {
        build_cylinder(ids.platform, pos, width, movement, rng)
    }
}

fn platform_record(
    id: EntityId,
    kind: ShapeKind,
    pos: Vec3,
    footprint: Footprint,
    color: u32,
    movement: Option<MovementPattern>,
) -> Platform {
    Platform {
        id,
        kind,
        health: MAX_HEALTH,
        pos,
        footprint,
        color,
        movement,
        wall: None,
        trap: None,
    }
}

/// Weathered slab, optionally with a glass wall at its far side
pub fn build_box(
    ids: PlatformIds,
    pos: Vec3,
    width: f32,
    movement: Option<MovementPattern>,
    with_wall: bool,
    tuning: &WorldTuning,
    rng: &mut impl Rng,
) -> PlatformBuild {
    let length = tuning.slab_length;
    let color = random_platform_color(rng);
    let mut platform = platform_record(
        ids.platform,
        ShapeKind::Box,
        pos,
        Footprint::new(width, length),
        color,
        movement,
    );

    let visual = VisualDesc {
        geometry: Geometry::Slab {
            size: Vec3::new(width, SLAB_THICKNESS, length),
            weathering: Some(Weathering {
                amplitude: 0.1,
                seed: rng.random(),
                axis_aligned_only: true,
            }),
        },
        material: MaterialDesc::solid(color, 1.0),
        position: pos,
        rotation: Quat::IDENTITY,
        cast_shadow: true,
    };
    let body = BodyDesc::fixed(
        ColliderShape::Cuboid {
            half_extents: Vec3::new(width / 2.0, SLAB_THICKNESS / 2.0, length / 2.0),
        },
        pos,
    );

    let wall = with_wall.then(|| {
        let height = tuning.wall_height;
        let record = DestructibleWall {
            id: ids.wall,
            health: MAX_HEALTH,
            width,
            height,
            offset: Vec3::new(0.0, height / 2.0, -length / 4.0),
        };
        let wall_pos = pos + record.offset;
        let wall_visual = VisualDesc {
            geometry: Geometry::Slab {
                size: Vec3::new(width, height, WALL_THICKNESS),
                weathering: Some(Weathering {
                    amplitude: 0.05,
                    seed: rng.random(),
                    axis_aligned_only: false,
                }),
            },
            material: MaterialDesc {
                color: 0x88ccff,
                opacity: 0.3,
                transmission: 0.9,
                roughness: 0.0,
                metalness: 0.0,
                emissive: 0,
                emissive_intensity: 0.0,
            },
            position: wall_pos,
            rotation: Quat::IDENTITY,
            cast_shadow: true,
        };
        let wall_body = BodyDesc::fixed(
            ColliderShape::Cuboid {
                half_extents: Vec3::new(width / 2.0, height / 2.0, WALL_THICKNESS / 2.0),
            },
            wall_pos,
        );
        platform.wall = Some(record);
        (wall_visual, wall_body)
    });

    PlatformBuild {
        platform,
        visual,
        body,
        wall,
    }
}

/// Four-sided pyramid; the collider is a four-sided cylinder of equal radius
pub fn build_cone(
    id: EntityId,
    pos: Vec3,
    width: f32,
    movement: Option<MovementPattern>,
    rng: &mut impl Rng,
) -> PlatformBuild {
    let radius = width / 2.0;
    let color = random_platform_color(rng);
    let platform = platform_record(
        id,
        ShapeKind::Cone,
        pos,
        Footprint::square(width),
        color,
        movement,
    );
    let visual = VisualDesc {
        geometry: Geometry::Pyramid {
            radius,
            height: CONE_HEIGHT,
            sides: CONE_SIDES,
        },
        material: MaterialDesc::solid(color, 1.0),
        position: pos,
        rotation: platform.rotation(),
        cast_shadow: true,
    };
    let body = BodyDesc::fixed(
        ColliderShape::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height: CONE_HEIGHT,
            segments: CONE_SIDES,
        },
        pos,
    );
    PlatformBuild {
        platform,
        visual,
        body,
        wall: None,
    }
}

/// Disc platform with a matching cylinder collider
pub fn build_cylinder(
    id: EntityId,
    pos: Vec3,
    width: f32,
    movement: Option<MovementPattern>,
    rng: &mut impl Rng,
) -> PlatformBuild {
    let radius = width / 2.0;
    let color = random_platform_color(rng);
    let platform = platform_record(
        id,
        ShapeKind::Cylinder,
        pos,
        Footprint::square(width),
        color,
        movement,
    );
    let visual = VisualDesc {
        geometry: Geometry::Disc {
            radius,
            height: DISC_HEIGHT,
            segments: DISC_SEGMENTS,
        },
        material: MaterialDesc::solid(color, 1.0),
        position: pos,
        rotation: Quat::IDENTITY,
        cast_shadow: true,
    };
    let body = BodyDesc::fixed(
        ColliderShape::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height: DISC_HEIGHT,
            segments: DISC_SEGMENTS,
        },
        pos,
    );
    PlatformBuild {
        platform,
        visual,
        body,
        wall: None,
    }
}

/// Warning-tinted slab; never moves, never has a wall
pub fn build_trap(id: EntityId, pos: Vec3, width: f32, length: f32) -> PlatformBuild {
    const TRAP_COLOR: u32 = 0xff4444;
    let mut platform = platform_record(
        id,
        ShapeKind::Trap,
        pos,
        Footprint::new(width, length),
        TRAP_COLOR,
        None,
    );
    platform.trap = Some(TrapState::default());
    let visual = VisualDesc {
        geometry: Geometry::Slab {
            size: Vec3::new(width, SLAB_THICKNESS, length),
            weathering: None,
        },
        material: MaterialDesc::solid(TRAP_COLOR, 0.8),
        position: pos,
        rotation: Quat::IDENTITY,
        cast_shadow: true,
    };
    let body = BodyDesc::fixed(
        ColliderShape::Cuboid {
            half_extents: Vec3::new(width / 2.0, SLAB_THICKNESS / 2.0, length / 2.0),
        },
        pos,
    );
    PlatformBuild {
        platform,
        visual,
        body,
        wall: None,
    }
}

/// Displace slab vertices along their face normals for a weathered look
///
/// With `axis_aligned_only`, only vertices whose normal is within ~25° of a
/// box axis move, and only along that axis. Purely cosmetic.
pub fn weather_vertices(
    positions: &mut [Vec3],
    normals: &[Vec3],
    weathering: Weathering,
    rng: &mut impl Rng,
) {
    const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];
    for (pos, normal) in positions.iter_mut().zip(normals) {
        let displacement = (rng.random::<f32>() - 0.5) * weathering.amplitude;
        if weathering.axis_aligned_only {
            for (i, axis) in AXES.iter().enumerate() {
                if normal.dot(*axis).abs() > 0.9 {
                    pos[i] += normal[i] * displacement;
                }
            }
        } else {
            *pos += *normal * displacement;
        }
    }
}
