//! Collectible pickups (coins, gems, stars)

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scene::{BodyDesc, ColliderShape, EntityId, Geometry, MaterialDesc, VisualDesc};

/// Errors raised while constructing world entities
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("unsupported collectible type: {0}")]
    UnknownCollectible(String),
}

/// Pickup variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    Gem,
    Star,
}

impl CollectibleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectibleKind::Coin => "coin",
            CollectibleKind::Gem => "gem",
            CollectibleKind::Star => "star",
        }
    }

    /// Parse a kind name; anything else is a caller bug and is rejected
    pub fn parse(name: &str) -> Result<Self, SpawnError> {
        match name {
            "coin" => Ok(CollectibleKind::Coin),
            "gem" | "diamond" => Ok(CollectibleKind::Gem),
            "star" => Ok(CollectibleKind::Star),
            other => Err(SpawnError::UnknownCollectible(other.to_string())),
        }
    }

    /// Weighted roll: coin 50%, gem 35%, star 15%
    pub fn roll(rng: &mut impl Rng) -> Self {
        if rng.random::<f32>() < 0.5 {
            CollectibleKind::Coin
        } else if rng.random::<f32>() < 0.7 {
            CollectibleKind::Gem
        } else {
            CollectibleKind::Star
        }
    }

    /// Resting orientation of the visual node
    ///
    /// Coins turn a quarter about X, gems also turn 45° about Z, stars keep
    /// the default plane.
    pub fn base_rotation(&self) -> Quat {
        use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
        match self {
            CollectibleKind::Coin => Quat::from_rotation_x(FRAC_PI_2),
            CollectibleKind::Gem => Quat::from_euler(glam::EulerRot::XYZ, FRAC_PI_2, 0.0, FRAC_PI_4),
            CollectibleKind::Star => Quat::IDENTITY,
        }
    }
}

/// A live pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: EntityId,
    pub kind: CollectibleKind,
    pub pos: Vec3,
    /// Accumulated spin about Y (radians)
    pub spin: f32,
    pub collected: bool,
}

impl Collectible {
    /// Current visual orientation (spin applied on top of the resting pose)
    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.spin) * self.kind.base_rotation()
    }
}

/// Build a pickup with its sensor body
pub fn build_collectible(
    id: EntityId,
    kind: CollectibleKind,
    pos: Vec3,
) -> (Collectible, VisualDesc, BodyDesc) {
    let (geometry, shape) = match kind {
        CollectibleKind::Coin => (
            Geometry::Coin {
                radius: 0.3,
                thickness: 0.05,
            },
            ColliderShape::Cylinder {
                radius_top: 0.3,
                radius_bottom: 0.3,
                height: 0.05,
                segments: 32,
            },
        ),
        CollectibleKind::Gem => (
            Geometry::Gem {
                radius: 0.25,
                height: 0.5,
            },
            ColliderShape::Cylinder {
                radius_top: 0.0,
                radius_bottom: 0.25,
                height: 0.5,
                segments: 4,
            },
        ),
        CollectibleKind::Star => (
            Geometry::Star {
                outer: 0.25,
                inner: 0.1,
                spikes: 5,
            },
            ColliderShape::Cuboid {
                half_extents: Vec3::new(0.25, 0.25, 0.05),
            },
        ),
    };

    let (color, emissive) = match kind {
        CollectibleKind::Gem => (0x99ccff, 0x4488ff),
        _ => (0xffd700, 0xaa8800),
    };
    let material = MaterialDesc {
        color,
        opacity: 1.0,
        transmission: 0.0,
        roughness: 0.3,
        metalness: 1.0,
        emissive,
        emissive_intensity: 0.3,
    };

    let collectible = Collectible {
        id,
        kind,
        pos,
        spin: 0.0,
        collected: false,
    };
    let visual = VisualDesc {
        geometry,
        material,
        position: pos,
        rotation: collectible.rotation(),
        cast_shadow: false,
    };
    let body_rotation = match kind {
        CollectibleKind::Star => Quat::IDENTITY,
        _ => Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
    };
    let body = BodyDesc {
        shape,
        position: pos,
        rotation: body_rotation,
        mass: 0.0,
        sensor: true,
    };
    (collectible, visual, body)
}
