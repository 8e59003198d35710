//! Small shared helpers: RNG construction and weighted sampling

use rand::{Rng, SeedableRng, distr::StandardUniform, prelude::IndexedRandom, rngs::StdRng};

/// Seeded generator when `seed` is given, otherwise one drawn from the
/// thread-local entropy source.
pub fn build_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Derive a child seed so parallel workers get independent streams.
///
/// SplitMix64 finalizer over the combined inputs.
pub fn derive_seed(base: u64, iteration: usize, worker: usize) -> u64 {
    let mut z = base
        .wrapping_add((iteration as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((worker as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Sample an item proportionally to its weight.
///
/// Falls back to a uniform choice when every weight is zero. Returns `None`
/// only for an empty slice.
///
/// # Examples
///
/// ```
/// use rand::{SeedableRng, rngs::StdRng};
/// use kinarow::utils::weighted_sample;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let items = [("centre", 3.0), ("corner", 2.0), ("edge", 1.0)];
/// assert!(weighted_sample(&mut rng, &items).is_some());
/// ```
pub fn weighted_sample<R, T>(rng: &mut R, items: &[(T, f64)]) -> Option<T>
where
    R: Rng + ?Sized,
    T: Copy,
{
    let total: f64 = items.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return items.choose(rng).map(|(item, _)| *item);
    }

    let mut threshold = rng.sample::<f64, _>(StandardUniform) * total;
    for (item, weight) in items {
        let w = weight.max(0.0);
        if threshold < w {
            return Some(*item);
        }
        threshold -= w;
    }

    // Rounding can leave a sliver past the last bucket.
    items.last().map(|(item, _)| *item)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sample_empty() {
        let mut rng = build_rng(Some(42));
        let items: [(u8, f64); 0] = [];
        assert_eq!(weighted_sample(&mut rng, &items), None);
    }

    #[test]
    fn test_weighted_sample_skips_zero_weight() {
        let mut rng = build_rng(Some(7));
        let items = [(1, 0.0), (2, 1.0), (3, 0.0)];
        for _ in 0..100 {
            assert_eq!(weighted_sample(&mut rng, &items), Some(2));
        }
    }

    #[test]
    fn test_weighted_sample_all_zero_is_uniform() {
        let mut rng = build_rng(Some(3));
        let items = [(1, 0.0), (2, 0.0)];
        let mut seen = [false; 2];
        for _ in 0..200 {
            let item = weighted_sample(&mut rng, &items).unwrap();
            seen[item - 1] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_weighted_sample_prefers_heavy_items() {
        let mut rng = build_rng(Some(11));
        let items = [('a', 9.0), ('b', 1.0)];
        let heavy = (0..2000)
            .filter(|_| weighted_sample(&mut rng, &items) == Some('a'))
            .count();
        assert!(heavy > 1600, "heavy item drawn {heavy} times");
    }

    #[test]
    fn test_derive_seed_separates_workers() {
        let a = derive_seed(42, 1, 0);
        let b = derive_seed(42, 1, 1);
        let c = derive_seed(42, 2, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, derive_seed(42, 1, 0));
    }
}
