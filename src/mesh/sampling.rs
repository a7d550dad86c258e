//! Fibonacci-spiral sampling of the unit sphere
//!
//! Points are placed along the golden-angle spiral, which is near-uniform
//! in O(n), then perturbed tangentially by the configured jitter. Jitter 0
//! keeps the exact spiral; jitter 1 moves points by up to a full average
//! cell width, which is what breaks the visible spiral banding in the
//! Voronoi cells.
//!
//! The epsilon offset away from the poles follows the canonical-lattice
//! optimization and improves uniformity for small point counts.

use glam::DVec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Golden ratio φ = (1 + √5) / 2
const PHI: f64 = 1.618033988749895;

/// Pole offset for a given point count
fn lattice_epsilon(n: usize) -> f64 {
    match n {
        0..=23 => 0.33,
        24..=176 => 1.33,
        177..=889 => 3.33,
        890..=10999 => 10.0,
        _ => 27.5,
    }
}

/// Sample `count` points on the unit sphere
///
/// The spiral runs from `z ≈ −1` (north, in this crate's convention) to
/// `z ≈ +1` (south); neither pole is hit exactly, which the stereographic
/// projection depends on.
///
/// # Arguments
///
/// * `count` - Number of points
/// * `jitter` - Tangential perturbation in [0, 1] cell widths
/// * `rng` - Stage RNG; one (angle, magnitude) pair is drawn per point
pub fn fibonacci_sphere(count: usize, jitter: f64, rng: &mut ChaCha8Rng) -> Vec<DVec3> {
    if count == 0 {
        return Vec::new();
    }

    let epsilon = lattice_epsilon(count);
    let n = count as f64;

    // Mean angular spacing between neighboring samples
    let avg_spacing = (4.0 * PI / n).sqrt();
    let jitter_amount = avg_spacing * jitter;

    (0..count)
        .map(|i| {
            let i_f = i as f64;

            // Golden-angle longitude
            let theta = 2.0 * PI * i_f / PHI;

            // z runs from −1 (north) to +1 (south) with pole offset
            let z = -(1.0 - 2.0 * (i_f + epsilon) / (n - 1.0 + 2.0 * epsilon));
            let ring = (1.0 - z * z).max(0.0).sqrt();

            let base = DVec3::new(ring * theta.cos(), ring * theta.sin(), z);
            if jitter_amount == 0.0 {
                return base;
            }

            let jitter_theta: f64 = rng.gen_range(0.0..2.0 * PI);
            let jitter_mag: f64 = rng.gen_range(0.0..jitter_amount);

            // Orthonormal basis of the tangent plane at `base`
            let up = if base.z.abs() < 0.9 { DVec3::Z } else { DVec3::X };
            let tangent1 = base.cross(up).normalize();
            let tangent2 = base.cross(tangent1).normalize();

            (base + tangent1 * jitter_mag * jitter_theta.cos()
                + tangent2 * jitter_mag * jitter_theta.sin())
            .normalize()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{stage, stage_rng};

    fn sample(count: usize, jitter: f64, seed: u64) -> Vec<DVec3> {
        let mut rng = stage_rng(seed, stage::MESH);
        fibonacci_sphere(count, jitter, &mut rng)
    }

    #[test]
    fn test_point_count() {
        for count in [10, 100, 1000, 5000] {
            assert_eq!(sample(count, 0.5, 42).len(), count);
        }
    }

    #[test]
    fn test_points_on_unit_sphere() {
        for p in sample(500, 1.0, 42) {
            assert!((p.length() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_jitter_is_exact_spiral() {
        let a = sample(200, 0.0, 1);
        let b = sample(200, 0.0, 999);
        for (p, q) in a.iter().zip(b.iter()) {
            assert_eq!(p, q, "jitter 0 must not depend on the seed");
        }
    }

    #[test]
    fn test_jitter_is_deterministic() {
        let a = sample(200, 0.7, 42);
        let b = sample(200, 0.7, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = sample(200, 0.7, 42);
        let b = sample(200, 0.7, 43);
        assert!(a.iter().zip(b.iter()).any(|(p, q)| p != q));
    }

    #[test]
    fn test_poles_are_avoided() {
        // The spiral must never reach z = ±1 exactly or the stereographic
        // projection would blow up.
        for p in sample(2000, 0.0, 1) {
            assert!(p.z.abs() < 1.0);
        }
        let pts = sample(2000, 0.0, 1);
        assert!(pts[0].z < -0.99, "first point near the north pole");
        assert!(pts[1999].z > 0.99, "last point near the south pole");
    }
}
