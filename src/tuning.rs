//! Data-driven world balance
//!
//! Every numeric policy the world generator and damage model use lives in
//! [`WorldTuning`]. Defaults reproduce the shipped game feel; a JSON file can
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid tuning: {0}")]
    Invalid(String),
}

/// Inclusive numeric range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Linear interpolation across the span (`t` in [0, 1])
    #[inline]
    pub fn lerp(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }
}

/// World generation, damage and spawner balance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    // === Streaming ===
    /// Rows are emitted until the frontier is this far ahead of the player
    pub generation_distance: f32,
    /// Entities further than this behind the player are retired
    pub removal_distance: f32,
    /// Depth between consecutive rows
    pub row_spacing: f32,
    /// Fewest platforms in a streamed row
    pub row_min: u32,
    /// Most platforms in a streamed row
    pub row_max: u32,
    /// Lateral spread of a row (offsets are uniform in ±spread/2)
    pub lateral_spread: f32,
    /// Height band of streamed platforms
    pub height_band: Span,

    // === Placement ===
    /// Re-rolls allowed when a placement overlaps
    pub placement_retries: u32,
    /// Width of the lateral jitter used for re-rolls (±jitter/2)
    pub placement_jitter: f32,
    /// Safety margin added to every footprint edge
    pub overlap_buffer: f32,

    // === Platform shapes ===
    pub platform_width: Span,
    /// Depth of box and trap slabs
    pub slab_length: f32,
    pub wall_height: f32,
    pub moving_chance: f32,
    pub trap_chance: f32,
    /// Chance a non-trap box receives a glass wall
    pub wall_chance: f32,
    pub movement_speed: Span,
    pub movement_amplitude: Span,

    // === Traps ===
    pub trap_trigger_radius: f32,
    /// Seconds between arming and collapse
    pub trap_break_delay: f32,

    // === Collectibles ===
    pub collectible_chance: f32,
    /// Height above the platform at which pickups float
    pub collectible_lift: f32,
    pub collection_radius: f32,

    // === Damage ===
    pub platform_hit_damage: i32,
    pub wall_hit_damage: i32,
    pub hostile_hit_damage: i32,

    // === Hostiles ===
    pub max_hostiles: u32,
    /// Seconds between hostile spawns
    pub hostile_spawn_interval: f32,
    pub hostile_spawn_distance: f32,
    /// Total angular width of the spawn arc (radians)
    pub hostile_spawn_arc: f32,
    pub hostile_size: Span,
    pub hostile_speed: Span,
    /// Hostiles further than this from the player are retired
    pub hostile_leash: f32,
    pub hostile_contact_radius: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            generation_distance: 20.0,
            removal_distance: 30.0,
            row_spacing: 4.0,
            row_min: 2,
            row_max: 3,
            lateral_spread: 8.0,
            height_band: Span::new(2.0, 4.0),

            placement_retries: 10,
            placement_jitter: 4.0,
            overlap_buffer: 1.0,

            platform_width: Span::new(2.0, 4.0),
            slab_length: 8.0,
            wall_height: 3.0,
            moving_chance: 0.3,
            trap_chance: 0.2,
            wall_chance: 1.0,
            movement_speed: Span::new(0.5, 2.0),
            movement_amplitude: Span::new(2.0, 5.0),

            trap_trigger_radius: 2.0,
            trap_break_delay: 1.0,

            collectible_chance: 0.4,
            collectible_lift: 1.5,
            collection_radius: 1.5,

            platform_hit_damage: 34,
            wall_hit_damage: 100,
            hostile_hit_damage: 100,

            max_hostiles: 3,
            hostile_spawn_interval: 5.0,
            hostile_spawn_distance: 30.0,
            hostile_spawn_arc: std::f32::consts::FRAC_PI_3,
            hostile_size: Span::new(0.8, 1.2),
            hostile_speed: Span::new(12.0, 18.0),
            hostile_leash: 50.0,
            hostile_contact_radius: 2.0,
        }
    }
}

impl WorldTuning {
    /// Parse tuning from JSON (missing fields keep their defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall or break world generation
    pub fn validate(&self) -> Result<(), TuningError> {
        let invalid = |msg: &str| Err(TuningError::Invalid(msg.to_string()));

        if self.row_spacing <= 0.0 {
            return invalid("row_spacing must be positive");
        }
        if self.row_min == 0 || self.row_min > self.row_max {
            return invalid("row size must satisfy 1 <= row_min <= row_max");
        }
        if self.removal_distance <= 0.0 || self.generation_distance <= 0.0 {
            return invalid("streaming distances must be positive");
        }
        if self.platform_width.min <= 0.0 || self.platform_width.min > self.platform_width.max {
            return invalid("platform_width must be a positive, ordered span");
        }
        if self.slab_length <= 0.0 || self.wall_height <= 0.0 {
            return invalid("slab_length and wall_height must be positive");
        }
        if self.trap_break_delay < 0.0 {
            return invalid("trap_break_delay must not be negative");
        }
        let chances = [
            self.moving_chance,
            self.trap_chance,
            self.wall_chance,
            self.collectible_chance,
        ];
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return invalid("chances must lie in [0, 1]");
        }
        if self.platform_hit_damage <= 0 || self.wall_hit_damage <= 0 || self.hostile_hit_damage <= 0 {
            return invalid("hit damage must be positive");
        }
        Ok(())
    }
}
