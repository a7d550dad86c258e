//! Seeded 3D gradient noise
//!
//! Elevation and resource placement add fractal noise sampled directly at
//! the unit-sphere positions, so the field has no seams. Uses Ken Perlin's
//! reference permutation table with a seed mixed into the lattice hash.

use glam::DVec3;

// Ken Perlin's standard 256-entry permutation table.
const PERM: [u32; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

#[inline]
fn hash(x: i64, y: i64, z: i64, seed: u64) -> u32 {
    let seed_hash = ((seed.wrapping_mul(1103515245).wrapping_add(12345)) >> 16) as u32;
    let ix = ((x as u32) ^ seed_hash) & 255;
    let iy = ((y as u32) ^ (seed_hash >> 8)) & 255;
    let iz = ((z as u32) ^ (seed_hash >> 16)) & 255;
    let a = PERM[ix as usize];
    let b = PERM[((a + iy) & 255) as usize];
    PERM[((b + iz) & 255) as usize]
}

// Gradient from the 12 cube-edge directions.
#[inline]
fn gradient(hash_value: u32, x: f64, y: f64, z: f64) -> f64 {
    let h = hash_value & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        z
    } else {
        x
    };
    let su = if (h & 1) == 0 { -u } else { u };
    let sv = if (h & 2) == 0 { -v } else { v };
    su + sv
}

// Quintic fade: 6t⁵ − 15t⁴ + 10t³, C2-continuous at the lattice.
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Raw 3D Perlin sample in roughly [−1, 1]
fn perlin_3d(pos: DVec3, seed: u64) -> f64 {
    let x0 = pos.x.floor() as i64;
    let y0 = pos.y.floor() as i64;
    let z0 = pos.z.floor() as i64;

    let xf = pos.x - pos.x.floor();
    let yf = pos.y - pos.y.floor();
    let zf = pos.z - pos.z.floor();

    let u = fade(xf);
    let v = fade(yf);
    let w = fade(zf);

    let g000 = gradient(hash(x0, y0, z0, seed), xf, yf, zf);
    let g100 = gradient(hash(x0 + 1, y0, z0, seed), xf - 1.0, yf, zf);
    let g010 = gradient(hash(x0, y0 + 1, z0, seed), xf, yf - 1.0, zf);
    let g110 = gradient(hash(x0 + 1, y0 + 1, z0, seed), xf - 1.0, yf - 1.0, zf);
    let g001 = gradient(hash(x0, y0, z0 + 1, seed), xf, yf, zf - 1.0);
    let g101 = gradient(hash(x0 + 1, y0, z0 + 1, seed), xf - 1.0, yf, zf - 1.0);
    let g011 = gradient(hash(x0, y0 + 1, z0 + 1, seed), xf, yf - 1.0, zf - 1.0);
    let g111 = gradient(hash(x0 + 1, y0 + 1, z0 + 1, seed), xf - 1.0, yf - 1.0, zf - 1.0);

    let x00 = lerp(g000, g100, u);
    let x10 = lerp(g010, g110, u);
    let x01 = lerp(g001, g101, u);
    let x11 = lerp(g011, g111, u);

    lerp(lerp(x00, x10, v), lerp(x01, x11, v), w)
}

/// Fractal noise sampler bound to a seed
///
/// The world uses five octaves with persistence 2/3, which gives terrain
/// its mid-frequency roughness without drowning the tectonic signal.
#[derive(Debug, Clone, Copy)]
pub struct FbmSampler {
    seed: u64,
    octaves: usize,
    persistence: f64,
    lacunarity: f64,
    base_frequency: f64,
}

impl FbmSampler {
    /// Sampler with the world defaults (5 octaves, persistence 2/3)
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            octaves: 5,
            persistence: 2.0 / 3.0,
            lacunarity: 2.0,
            base_frequency: 2.0,
        }
    }

    /// Sampler with explicit parameters
    pub fn with_params(seed: u64, octaves: usize, persistence: f64, lacunarity: f64, base_frequency: f64) -> Self {
        Self {
            seed,
            octaves,
            persistence,
            lacunarity,
            base_frequency,
        }
    }

    /// Sample fBm at a unit-sphere position, normalized to [−1, 1]
    pub fn sample(&self, pos: DVec3) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.base_frequency;
        let mut max_value = 0.0;
        for _ in 0..self.octaves {
            total += perlin_3d(pos * frequency, self.seed) * amplitude;
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }
        total / max_value
    }

    /// Sample fBm mapped to [0, 1]
    pub fn sample_unit(&self, pos: DVec3) -> f64 {
        (self.sample(pos) + 1.0) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let sampler = FbmSampler::new(42);
        let p = DVec3::new(0.5, 0.7, 0.3);
        assert_eq!(sampler.sample(p), sampler.sample(p));
    }

    #[test]
    fn test_seeds_differ() {
        let a = FbmSampler::new(42);
        let b = FbmSampler::new(999);
        let p = DVec3::new(0.5, 0.5, 0.5);
        assert_ne!(a.sample(p), b.sample(p));
    }

    #[test]
    fn test_range() {
        let sampler = FbmSampler::new(12345);
        for i in 0..200 {
            let t = i as f64 / 200.0;
            let p = DVec3::new((t * 7.0).sin(), (t * 13.0).cos(), t * 2.0 - 1.0).normalize();
            let v = sampler.sample(p);
            assert!((-1.0..=1.0).contains(&v), "fbm {} out of range at {:?}", v, p);
            let u = sampler.sample_unit(p);
            assert!((0.0..=1.0).contains(&u));
        }
    }

    #[test]
    fn test_varies_over_sphere() {
        let sampler = FbmSampler::new(7);
        let a = sampler.sample(DVec3::new(1.0, 0.0, 0.0));
        let b = sampler.sample(DVec3::new(0.0, 0.0, 1.0));
        assert_ne!(a, b);
    }
}
