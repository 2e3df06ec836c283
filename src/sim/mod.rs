//! Deterministic world simulation
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or physics dependencies (the host applies [`SceneCommand`]s)

pub mod collectible;
pub mod damage;
pub mod effects;
pub mod hostiles;
pub mod movement;
pub mod overlap;
pub mod platform;
pub mod scene;
pub mod score;
pub mod state;
pub mod tick;

pub use collectible::{Collectible, CollectibleKind, SpawnError};
pub use damage::{DamageOutcome, DamageTarget};
pub use effects::{Effect, EffectKind, Effects};
pub use hostiles::{Hostile, HostileShape};
pub use movement::{MovementPattern, PatternKind};
pub use overlap::{Footprint, PlacedFootprint, PlacementPolicy, footprints_intersect, resolve_placement};
pub use platform::{DestructibleWall, Platform, ShapeKind, TrapState};
pub use scene::{BodyDesc, ColliderShape, EntityId, Geometry, MaterialDesc, Outbox, SceneCommand, VisualDesc};
pub use score::ScoreLedger;
pub use state::{SEED_PLATFORMS, World};
pub use tick::{TickInput, emit_row, tick};
