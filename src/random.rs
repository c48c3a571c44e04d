// Uniform samplers used by the burst generator. Both accept `min == max`.

use rand::Rng;

/// Inclusive integer in `[min, max]`. Swapped bounds are tolerated.
pub fn random_int<R: Rng>(rng: &mut R, min: u32, max: u32) -> u32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    rng.random_range(low..=high)
}

/// Float in `[min, max]`.
pub fn random_float<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    if low == high {
        return low;
    }
    if !(high - low).is_finite() {
        // Interpolate so the span itself is never formed.
        let t: f32 = rng.random();
        return low * (1.0 - t) + high * t;
    }
    rng.random_range(low..=high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn int_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let v = random_int(&mut rng, 3, 9);
            assert!((3..=9).contains(&v));
        }
    }

    #[test]
    fn degenerate_ranges() {
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(random_int(&mut rng, 5, 5), 5);
        assert_eq!(random_float(&mut rng, 1.5, 1.5), 1.5);
    }

    #[test]
    fn float_handles_spans_wider_than_f32() {
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            let v = random_float(&mut rng, -f32::MAX, f32::MAX);
            assert!(v.is_finite());
        }
    }

    #[test]
    fn float_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let v = random_float(&mut rng, 0.7, 1.15);
            assert!((0.7..=1.15).contains(&v));
        }
    }
}
