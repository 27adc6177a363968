//! Randomness for noise channels and measurement randomization.
//!
//! The engine RNG is a counter-based `ChaCha8Rng`: given a fixed seed and an
//! identical circuit, the sampled output is bit-exact across runs on hosts
//! with the same word size. Without a seed the generator is drawn from OS
//! entropy.

use bitplane::BitsMut;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The simulator's random number generator.
pub type SampleRng = ChaCha8Rng;

/// Builds the engine RNG from an optional 64-bit seed.
#[must_use]
pub fn seeded_rng(seed: Option<u64>) -> SampleRng {
    match seed {
        Some(seed) => SampleRng::seed_from_u64(seed),
        None => SampleRng::from_entropy(),
    }
}

/// Geometric skip lengths between Bernoulli(p) successes.
///
/// Iterating shot indices by `skip + 1` visits exactly the shots where an
/// event fires, which keeps low-probability channels O(hits) instead of
/// O(shots).
pub struct GeometricSkips {
    log_one_minus_p: f64,
}

impl GeometricSkips {
    /// # Panics
    ///
    /// Debug-asserts `probability` lies in (0, 1].
    #[must_use]
    pub fn new(probability: f64) -> Self {
        debug_assert!(
            probability > 0.0 && probability <= 1.0,
            "probability must be in (0, 1], got {probability}"
        );
        // p = 1 gives ln(0) = -inf and therefore skip 0 for every draw.
        GeometricSkips {
            log_one_minus_p: (1.0 - probability).ln(),
        }
    }

    /// Number of trials to skip before the next success.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn next_skip<R: Rng + ?Sized>(&mut self, rng: &mut R) -> usize {
        let uniform: f64 = rng.gen();
        let skip = (uniform.ln() / self.log_one_minus_p).floor();
        if skip >= usize::MAX as f64 {
            usize::MAX
        } else {
            skip as usize
        }
    }
}

/// Flips each of the first `row.bit_len()` bits independently with
/// probability `probability`, via geometric skips.
pub fn scatter_biased_bits<B: BitsMut, R: Rng + ?Sized>(row: &mut B, probability: f64, rng: &mut R) {
    if probability <= 0.0 {
        return;
    }
    let limit = row.bit_len();
    let mut skips = GeometricSkips::new(probability);
    let mut position = skips.next_skip(rng);
    while position < limit {
        row.negate_index(position);
        position = position.saturating_add(skips.next_skip(rng).saturating_add(1));
    }
}

/// Walker alias table: O(1) draws from an explicit discrete distribution.
pub struct AliasSampler {
    accept: Vec<f64>,
    alias: Vec<usize>,
}

impl AliasSampler {
    /// Builds the table from (not necessarily normalized) weights.
    ///
    /// # Panics
    ///
    /// Panics if `weights` is empty or sums to zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(weights: &[f64]) -> Self {
        assert!(!weights.is_empty(), "alias table needs at least one weight");
        let total: f64 = weights.iter().sum();
        assert!(total > 0.0, "alias table weights must sum to a positive value");

        let count = weights.len();
        let mut scaled: Vec<f64> = weights.iter().map(|weight| weight * count as f64 / total).collect();
        let mut accept = vec![1.0; count];
        let mut alias: Vec<usize> = (0..count).collect();

        let mut small: Vec<usize> = (0..count).filter(|&index| scaled[index] < 1.0).collect();
        let mut large: Vec<usize> = (0..count).filter(|&index| scaled[index] >= 1.0).collect();
        while let (Some(small_index), Some(large_index)) = (small.pop(), large.pop()) {
            accept[small_index] = scaled[small_index];
            alias[small_index] = large_index;
            scaled[large_index] -= 1.0 - scaled[small_index];
            if scaled[large_index] < 1.0 {
                small.push(large_index);
            } else {
                large.push(large_index);
            }
        }

        AliasSampler { accept, alias }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let index = rng.gen_range(0..self.accept.len());
        if rng.gen::<f64>() < self.accept[index] {
            index
        } else {
            self.alias[index]
        }
    }
}

/// Uniformly random non-identity Pauli bit pattern on `qubit_count` qubits:
/// a value in `[1, 4^qubit_count)` with two bits (x, z) per qubit, drawn by
/// rejection so the distribution is exactly uniform.
pub fn sample_non_identity_pauli_bits<R: Rng + ?Sized>(qubit_count: usize, rng: &mut R) -> u64 {
    debug_assert!(qubit_count > 0 && qubit_count <= 31);
    let pattern_count = (1u64 << (2 * qubit_count)) - 1;
    let limit = u64::MAX - (u64::MAX % pattern_count);
    loop {
        let sample = rng.gen::<u64>();
        if sample < limit {
            return sample % pattern_count + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitplane::{BitVec, Bits};
    use rand::rngs::SmallRng;

    fn assert_rate_close(observed: usize, total: usize, expected: f64, tolerance: f64, context: &str) {
        let rate = observed as f64 / total as f64;
        assert!(
            (rate - expected).abs() <= tolerance * expected,
            "{context}: rate {rate:.5} deviates from {expected:.5}"
        );
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut first = seeded_rng(Some(99));
        let mut second = seeded_rng(Some(99));
        for _ in 0..100 {
            assert_eq!(first.gen::<u64>(), second.gen::<u64>());
        }
    }

    #[test]
    fn geometric_skips_match_rate() {
        let mut rng = SmallRng::seed_from_u64(42);
        let probability = 0.1;
        let mut skips = GeometricSkips::new(probability);
        let trials = 200_000usize;
        let mut events = 0usize;
        let mut position = 0usize;
        loop {
            position += skips.next_skip(&mut rng) + 1;
            if position > trials {
                break;
            }
            events += 1;
        }
        assert_rate_close(events, trials, probability, 0.05, "geometric skips p=0.1");
    }

    #[test]
    fn probability_one_never_skips() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut skips = GeometricSkips::new(1.0);
        for _ in 0..1000 {
            assert_eq!(skips.next_skip(&mut rng), 0);
        }
    }

    #[test]
    fn scatter_matches_rate_and_padding() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut row = BitVec::zeros(100_000);
        scatter_biased_bits(&mut row, 0.25, &mut rng);
        assert_rate_close(row.count_ones(), 100_000, 0.25, 0.05, "scatter p=0.25");
    }

    #[test]
    fn alias_sampler_matches_weights() {
        let mut rng = SmallRng::seed_from_u64(5);
        let sampler = AliasSampler::new(&[0.6, 0.3, 0.1]);
        let trials = 300_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            counts[sampler.sample(&mut rng)] += 1;
        }
        assert_rate_close(counts[0], trials, 0.6, 0.05, "alias weight 0.6");
        assert_rate_close(counts[1], trials, 0.3, 0.05, "alias weight 0.3");
        assert_rate_close(counts[2], trials, 0.1, 0.05, "alias weight 0.1");
    }

    #[test]
    fn pauli_bits_are_uniform_and_nonzero() {
        let mut rng = SmallRng::seed_from_u64(3);
        let trials = 150_000;
        let mut counts = [0usize; 15];
        for _ in 0..trials {
            let bits = sample_non_identity_pauli_bits(2, &mut rng);
            assert!((1..=15).contains(&bits));
            counts[(bits - 1) as usize] += 1;
        }
        for (pattern, &count) in counts.iter().enumerate() {
            assert_rate_close(count, trials, 1.0 / 15.0, 0.1, &format!("pattern {}", pattern + 1));
        }
    }
}
