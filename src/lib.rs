//! Void Runner - endless-runner world engine
//!
//! Core modules:
//! - `sim`: Deterministic world simulation (streaming, placement, damage, pickups)
//! - `host`: Scene graph / physics / HUD collaborator boundary
//! - `tuning`: Data-driven world balance
//! - `settings`: Presentation preferences (effect quality)

pub mod host;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{QualityPreset, Settings};
pub use tuning::WorldTuning;

use glam::Vec3;

/// Engine configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Starting (and maximum) health of platforms, walls and hostiles
    pub const MAX_HEALTH: i32 = 100;

    /// Vertical thickness of slab platforms (box and trap)
    pub const SLAB_THICKNESS: f32 = 0.5;
    /// Height of the pyramid used for cone platforms
    pub const CONE_HEIGHT: f32 = 1.0;
    /// Number of sides of a cone platform (four-sided pyramid)
    pub const CONE_SIDES: u32 = 4;
    /// Height of disc platforms
    pub const DISC_HEIGHT: f32 = 0.5;
    /// Radial segments of disc platforms
    pub const DISC_SEGMENTS: u32 = 32;
    /// Thickness of destructible glass walls
    pub const WALL_THICKNESS: f32 = 0.1;

    /// Collectible spin per tick while uncollected (radians)
    pub const COLLECTIBLE_SPIN: f32 = 0.02;
}

/// Forward depth of a world position (the player runs toward -Z)
#[inline]
pub fn depth_of(pos: Vec3) -> f32 {
    -pos.z
}

/// How far `entity` lies behind `player` along the run direction
///
/// Positive when the entity has been passed, negative when it is still ahead.
#[inline]
pub fn behind_by(player: Vec3, entity: Vec3) -> f32 {
    depth_of(player) - depth_of(entity)
}

/// Convert a depth back into a world Z coordinate
#[inline]
pub fn z_at_depth(depth: f32) -> f32 {
    -depth
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_behind_by_sign() {
        let player = Vec3::new(0.0, 2.0, -40.0);
        assert_eq!(behind_by(player, Vec3::new(3.0, 0.0, -5.0)), 35.0);
        assert_eq!(behind_by(player, Vec3::new(0.0, 0.0, -60.0)), -20.0);
        assert_eq!(z_at_depth(depth_of(player)), player.z);
    }
}
