//! Horizontal footprint overlap and placement retries
//!
//! Footprints are axis-aligned rectangles in the XZ plane, each edge pushed
//! out by a safety buffer. Every footprint carries its own extent, stored at
//! creation time.

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Horizontal extent of a platform (X by Z)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Extent along X
    pub width: f32,
    /// Extent along Z
    pub depth: f32,
}

impl Footprint {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    /// Square footprint of a round platform
    pub fn square(diameter: f32) -> Self {
        Self::new(diameter, diameter)
    }
}

/// Footprint placed in the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedFootprint {
    pub center: Vec3,
    pub footprint: Footprint,
}

/// Inflated bounds (min_x, max_x, min_z, max_z)
fn bounds(center: Vec3, fp: Footprint, buffer: f32) -> (f32, f32, f32, f32) {
    (
        center.x - fp.width / 2.0 - buffer,
        center.x + fp.width / 2.0 + buffer,
        center.z - fp.depth / 2.0 - buffer,
        center.z + fp.depth / 2.0 + buffer,
    )
}

/// Whether two buffered footprints intersect (touching edges count)
pub fn footprints_intersect(a: PlacedFootprint, b: PlacedFootprint, buffer: f32) -> bool {
    let (a_min_x, a_max_x, a_min_z, a_max_z) = bounds(a.center, a.footprint, buffer);
    let (b_min_x, b_max_x, b_min_z, b_max_z) = bounds(b.center, b.footprint, buffer);
    !(a_max_x < b_min_x || a_min_x > b_max_x || a_max_z < b_min_z || a_min_z > b_max_z)
}

/// Whether `candidate` collides with any live footprint
pub fn overlaps(
    candidate: PlacedFootprint,
    live: impl IntoIterator<Item = PlacedFootprint>,
    buffer: f32,
) -> bool {
    live.into_iter()
        .any(|existing| footprints_intersect(candidate, existing, buffer))
}

/// Retry policy for placements
#[derive(Debug, Clone, Copy)]
pub struct PlacementPolicy {
    pub buffer: f32,
    /// Re-rolls allowed after the first attempt
    pub retries: u32,
    /// Total width of the lateral re-roll window
    pub jitter: f32,
}

/// Find a non-overlapping position near `requested`
///
/// Tries the requested position first, then re-rolls X (same height and
/// depth) within ±jitter/2 of the request up to `retries` times. Returns
/// `None` when every attempt overlaps.
pub fn resolve_placement(
    requested: Vec3,
    footprint: Footprint,
    live: &[PlacedFootprint],
    policy: PlacementPolicy,
    rng: &mut impl Rng,
) -> Option<Vec3> {
    let mut candidate = requested;
    let mut attempts = 0;
    loop {
        let placed = PlacedFootprint {
            center: candidate,
            footprint,
        };
        if !overlaps(placed, live.iter().copied(), policy.buffer) {
            return Some(candidate);
        }
        if attempts == policy.retries {
            return None;
        }
        candidate = Vec3::new(
            requested.x + (rng.random::<f32>() - 0.5) * policy.jitter,
            requested.y,
            requested.z,
        );
        attempts += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const POLICY: PlacementPolicy = PlacementPolicy {
        buffer: 1.0,
        retries: 10,
        jitter: 4.0,
    };

    fn placed(x: f32, z: f32, w: f32, d: f32) -> PlacedFootprint {
        PlacedFootprint {
            center: Vec3::new(x, 0.0, z),
            footprint: Footprint::new(w, d),
        }
    }

    #[test]
    fn test_buffer_inflates_both_sides() {
        // Edges 3 apart: each gets +1 buffer, leaving a gap of 1
        let a = placed(0.0, 0.0, 2.0, 2.0);
        let b = placed(5.0, 0.0, 2.0, 2.0);
        assert!(!footprints_intersect(a, b, 1.0));
        // Edges 1.5 apart: buffers overlap
        let c = placed(3.5, 0.0, 2.0, 2.0);
        assert!(footprints_intersect(a, c, 1.0));
    }

    #[test]
    fn test_height_is_ignored() {
        let a = placed(0.0, 0.0, 2.0, 8.0);
        let mut b = placed(0.0, 0.0, 2.0, 8.0);
        b.center.y = 50.0;
        assert!(footprints_intersect(a, b, 1.0));
    }

    #[test]
    fn test_depth_separation() {
        let a = placed(0.0, 0.0, 3.0, 8.0);
        let b = placed(0.0, -12.0, 3.0, 8.0);
        assert!(!footprints_intersect(a, b, 1.0));
        let c = placed(0.0, -9.0, 3.0, 8.0);
        assert!(footprints_intersect(a, c, 1.0));
    }

    #[test]
    fn test_free_space_accepts_request_unchanged() {
        let mut rng = Pcg32::seed_from_u64(1);
        let req = Vec3::new(1.0, 3.0, -40.0);
        let got = resolve_placement(req, Footprint::new(3.0, 8.0), &[], POLICY, &mut rng);
        assert_eq!(got, Some(req));
    }

    #[test]
    fn test_blocked_everywhere_is_dropped() {
        let mut rng = Pcg32::seed_from_u64(1);
        let wall = [placed(0.0, -40.0, 40.0, 40.0)];
        let got = resolve_placement(
            Vec3::new(0.0, 3.0, -40.0),
            Footprint::new(3.0, 8.0),
            &wall,
            POLICY,
            &mut rng,
        );
        assert_eq!(got, None);
    }

    #[test]
    fn test_retry_keeps_height_and_depth() {
        let mut rng = Pcg32::seed_from_u64(9);
        // Buffered blocker spans x in [-3.5, -0.5]; only re-rolls with x > 1 fit
        let blocker = [placed(-2.0, -40.0, 1.0, 1.0)];
        let req = Vec3::new(0.0, 2.5, -40.0);
        if let Some(pos) = resolve_placement(req, Footprint::new(1.0, 1.0), &blocker, POLICY, &mut rng) {
            assert_eq!(pos.y, req.y);
            assert_eq!(pos.z, req.z);
            assert!((pos.x - req.x).abs() <= 2.0);
            assert!(!overlaps(
                PlacedFootprint {
                    center: pos,
                    footprint: Footprint::new(1.0, 1.0)
                },
                blocker,
                1.0
            ));
        }
    }
}
