//! Deterministic stand-in traffic numbers for locations with no data at all.
//!
//! The location is quantised to 4 decimal places and formatted as
//! `"{lat:.4},{lng:.4}"`. The first 8 bytes of that string's MD5 digest
//! (big endian) seed a `ChaCha8Rng`, and a single `u64` draw `d` yields
//! `vehicle = 50_000 + d % 50_000` and `foot = 10_000 + d % 20_000`.
//! The same location always produces the same numbers on every platform.

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::geo::GeoPoint;

/// Synthetic monthly traffic for a location. Never real signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderEstimate {
    pub seed_key: String,
    pub seed: u64,
    pub monthly_vehicle: u64,
    pub monthly_foot: u64,
}

pub fn seed_key(location: &GeoPoint) -> String {
    format!("{:.4},{:.4}", location.lat, location.lng)
}

pub fn seed_for(key: &str) -> u64 {
    let mut context = md5::Context::new();
    context.consume(key.as_bytes());
    let digest = context.finalize();

    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub fn estimate(location: &GeoPoint) -> PlaceholderEstimate {
    let seed_key = seed_key(location);
    let seed = seed_for(&seed_key);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let draw = rng.next_u64();

    PlaceholderEstimate {
        seed_key,
        seed,
        monthly_vehicle: 50_000 + draw % 50_000,
        monthly_foot: 10_000 + draw % 20_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_is_reproducible() {
        let p = GeoPoint::new(30.2672, -97.7431);
        assert_eq!(estimate(&p), estimate(&p));
    }

    #[test]
    fn test_nearby_points_share_a_quantised_key() {
        let a = GeoPoint::new(30.26721, -97.74312);
        let b = GeoPoint::new(30.26719, -97.74309);
        assert_eq!(seed_key(&a), seed_key(&b));
        assert_eq!(estimate(&a), estimate(&b));
    }

    #[test]
    fn test_estimate_ranges() {
        for i in 0..50 {
            let p = GeoPoint::new(25.0 + i as f64 * 0.37, -120.0 + i as f64 * 0.91);
            let e = estimate(&p);
            assert!((50_000..100_000).contains(&e.monthly_vehicle));
            assert!((10_000..30_000).contains(&e.monthly_foot));
        }
    }

    #[test]
    fn test_seed_from_md5_prefix() {
        // md5("") = d41d8cd98f00b204e9800998ecf8427e
        assert_eq!(seed_for(""), 0xd41d_8cd9_8f00_b204);
    }
}
