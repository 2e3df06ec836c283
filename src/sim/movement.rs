//! Movement patterns for animated platforms
//!
//! A pattern is fixed at creation. The live position is always derived from
//! elapsed time, never integrated, so it cannot drift.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::WorldTuning;

/// Movement pattern families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternKind {
    /// Sways left/right along X
    Horizontal,
    /// Bobs up/down along Y
    Vertical,
    /// Orbits in the XY plane around the anchor
    Circular,
}

impl PatternKind {
    pub const ALL: [PatternKind; 3] = [
        PatternKind::Horizontal,
        PatternKind::Vertical,
        PatternKind::Circular,
    ];
}

/// Time-parameterised motion around an anchor point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementPattern {
    pub kind: PatternKind,
    /// Angular rate (radians per second)
    pub speed: f32,
    /// Peak displacement from the anchor
    pub amplitude: f32,
    pub anchor: Vec3,
    /// Simulation time (seconds) the pattern started
    pub start_time: f32,
}

impl MovementPattern {
    /// Roll a random pattern anchored at `anchor`
    pub fn random(anchor: Vec3, start_time: f32, tuning: &WorldTuning, rng: &mut impl Rng) -> Self {
        let kind = PatternKind::ALL[rng.random_range(0..PatternKind::ALL.len())];
        Self {
            kind,
            speed: tuning.movement_speed.lerp(rng.random::<f32>()),
            amplitude: tuning.movement_amplitude.lerp(rng.random::<f32>()),
            anchor,
            start_time,
        }
    }

    /// Position at simulation time `now`
    pub fn position_at(&self, now: f32) -> Vec3 {
        let phase = (now - self.start_time) * self.speed;
        let a = self.anchor;
        match self.kind {
            PatternKind::Horizontal => Vec3::new(a.x + phase.sin() * self.amplitude, a.y, a.z),
            PatternKind::Vertical => Vec3::new(a.x, a.y + phase.sin() * self.amplitude, a.z),
            PatternKind::Circular => Vec3::new(
                a.x + phase.cos() * self.amplitude,
                a.y + phase.sin() * self.amplitude,
                a.z,
            ),
        }
    }
}
