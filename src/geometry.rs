//! Spherical geometry primitives
//!
//! All positions live on the unit sphere. Latitude is degrees in [−90, 90],
//! longitude degrees in [−180, 180], distances are radians of arc.
//!
//! Cartesian convention: `z = −sin(lat)`, so the south pole sits at
//! `(0, 0, 1)`. The stereographic projection `(x, y, z) → (x/(1−z),
//! y/(1−z))` then sends the south pole to infinity, which is where the
//! synthetic ghost region closes the triangulation.

use glam::{DVec2, DVec3};

/// Convert latitude/longitude in degrees to a unit-sphere position
pub fn latlon_to_cartesian(lat_deg: f64, lon_deg: f64) -> DVec3 {
    let lat = lat_deg.to_radians();
    let lon = lon_deg.to_radians();
    DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), -lat.sin())
}

/// Convert a unit-sphere position back to (latitude, longitude) in degrees
pub fn cartesian_to_latlon(p: DVec3) -> (f64, f64) {
    let lat = (-p.z).clamp(-1.0, 1.0).asin().to_degrees();
    let lon = p.y.atan2(p.x).to_degrees();
    (lat, lon)
}

/// Stereographic projection onto the plane tangent at the north pole
///
/// The south pole `(0, 0, 1)` maps to infinity; every sampled point stays
/// finite because sampling never hits the pole exactly.
pub fn stereographic(p: DVec3) -> DVec2 {
    DVec2::new(p.x / (1.0 - p.z), p.y / (1.0 - p.z))
}

/// Great-arc distance between two unit-sphere positions, in radians
///
/// Uses the chord-based form, which is numerically stable for nearby
/// points where `acos(dot)` loses precision.
pub fn great_arc(a: DVec3, b: DVec3) -> f64 {
    2.0 * ((a - b).length() * 0.5).clamp(-1.0, 1.0).asin()
}

/// Haversine distance between two (lat, lon) pairs in degrees, in radians
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi * 0.5).sin().powi(2)
        + phi1.cos() * phi2.cos() * (dlambda * 0.5).sin().powi(2);
    2.0 * a.sqrt().clamp(-1.0, 1.0).asin()
}

/// Area of the spherical triangle spanned by three unit-sphere positions
///
/// Heron's formula on the great-arc edge lengths; a close approximation
/// for the small triangles a dense sampling produces.
pub fn triangle_area(a: DVec3, b: DVec3, c: DVec3) -> f64 {
    let ab = great_arc(a, b);
    let bc = great_arc(b, c);
    let ca = great_arc(c, a);
    let s = (ab + bc + ca) * 0.5;
    let under = s * (s - ab) * (s - bc) * (s - ca);
    if under <= 0.0 {
        return 0.0; // degenerate
    }
    under.sqrt()
}

/// Shortest signed longitude difference `b − a` in degrees, wrapping ±180°
pub fn lon_difference(a: f64, b: f64) -> f64 {
    let mut d = b - a;
    while d > 180.0 {
        d -= 360.0;
    }
    while d < -180.0 {
        d += 360.0;
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_latlon_round_trip() {
        for &(lat, lon) in &[
            (0.0, 0.0),
            (45.0, 90.0),
            (-45.0, -90.0),
            (89.9, 179.9),
            (-89.9, -179.9),
            (12.34, -56.78),
        ] {
            let p = latlon_to_cartesian(lat, lon);
            let (lat2, lon2) = cartesian_to_latlon(p);
            assert!((lat - lat2).abs() < 1e-9, "lat {} -> {}", lat, lat2);
            assert!((lon - lon2).abs() < 1e-9, "lon {} -> {}", lon, lon2);
        }
    }

    #[test]
    fn test_south_pole_convention() {
        let south = latlon_to_cartesian(-90.0, 0.0);
        assert!((south - DVec3::new(0.0, 0.0, 1.0)).length() < EPS);
        let north = latlon_to_cartesian(90.0, 0.0);
        assert!((north - DVec3::new(0.0, 0.0, -1.0)).length() < EPS);
    }

    #[test]
    fn test_haversine_identity_and_symmetry() {
        assert!(haversine(12.0, 34.0, 12.0, 34.0).abs() < EPS);
        let ab = haversine(10.0, 20.0, -30.0, 120.0);
        let ba = haversine(-30.0, 120.0, 10.0, 20.0);
        assert!((ab - ba).abs() < EPS);
    }

    #[test]
    fn test_haversine_matches_great_arc() {
        let a = latlon_to_cartesian(10.0, 20.0);
        let b = latlon_to_cartesian(-35.0, 140.0);
        let arc = great_arc(a, b);
        let hav = haversine(10.0, 20.0, -35.0, 140.0);
        assert!((arc - hav).abs() < 1e-9);
    }

    #[test]
    fn test_quarter_arc() {
        let a = latlon_to_cartesian(0.0, 0.0);
        let b = latlon_to_cartesian(0.0, 90.0);
        assert!((great_arc(a, b) - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn test_triangle_area_positive() {
        let a = latlon_to_cartesian(0.0, 0.0);
        let b = latlon_to_cartesian(1.0, 0.0);
        let c = latlon_to_cartesian(0.0, 1.0);
        let area = triangle_area(a, b, c);
        // Roughly half of a 1°×1° patch
        let expected = 0.5 * 1.0f64.to_radians() * 1.0f64.to_radians();
        assert!(area > 0.0);
        assert!((area - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_lon_difference_wraps_seam() {
        assert!((lon_difference(179.0, -179.0) - 2.0).abs() < EPS);
        assert!((lon_difference(-179.0, 179.0) + 2.0).abs() < EPS);
        assert!((lon_difference(10.0, 30.0) - 20.0).abs() < EPS);
    }

    #[test]
    fn test_stereographic_equator() {
        // Equator points (z = 0) project onto the unit circle
        let p = latlon_to_cartesian(0.0, 37.0);
        let q = stereographic(p);
        assert!((q.length() - 1.0).abs() < 1e-9);
    }
}
