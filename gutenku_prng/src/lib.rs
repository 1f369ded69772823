// Deterministic, portable pseudo-random number generator.
//
// Implements mulberry32: a 32-bit state advanced by a fixed odd increment,
// passed through two xorshift-multiply rounds, with the output scaled to
// [0, 1). Hand-rolled with zero external RNG dependencies so the output is
// bit-identical across platforms and matches sequences produced by the
// daily-puzzle front end, which uses the same generator.
//
// This crate is the single PRNG used across GutenKu: `gutenku_engine`
// (population sampling, selection, crossover, mutation) and the date-seeded
// daily selection helpers at the bottom of this file.
//
// **Critical constraint: determinism.** Every method on `SeededRandom` must
// produce identical output given the same prior state. No wall-clock, OS
// entropy, or stdlib RNG may be consulted anywhere in this module.

use serde::{Deserialize, Serialize};

/// Odd increment added to the state before every draw.
const INCREMENT: u32 = 0x6D2B_79F5;

/// 2^32 as a float, the divisor that maps a `u32` into [0, 1).
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Mulberry32 PRNG, the engine's sole source of randomness.
///
/// Every GA run owns its own `SeededRandom`, so independent runs can execute
/// concurrently without sharing a stream.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeededRandom {
    state: u32,
    calls: u64,
}

impl SeededRandom {
    /// Create a new PRNG from a 32-bit seed. Two generators created with the
    /// same seed produce identical infinite sequences.
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed,
            calls: 0,
        }
    }

    /// Create a PRNG from a string label (e.g. a CLI `--seed abc`), hashing
    /// it with 32-bit FNV-1a.
    pub fn from_label(label: &str) -> Self {
        Self::new(seed_from_label(label))
    }

    /// Restart the stream from a new seed and zero the call counter.
    pub fn reset(&mut self, seed: u32) {
        self.state = seed;
        self.calls = 0;
    }

    /// Generate the next raw `u32` in the sequence.
    pub fn next_u32(&mut self) -> u32 {
        self.calls += 1;
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Generate a uniform `f64` in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / TWO_POW_32
    }

    /// Uniform integer in `[min, max)`, computed as
    /// `floor(next * (max - min)) + min`. Returns `min` when the range is
    /// empty.
    pub fn next_int(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        let span = (max - min) as f64;
        min + (self.next_f64() * span).floor() as usize
    }

    /// Return `true` with probability `p`. `p <= 0.0` is always false and
    /// `p >= 1.0` always true.
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Shuffle a slice in place (Fisher-Yates, walking down from the end).
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_int(0, i + 1);
            items.swap(i, j);
        }
    }

    /// Sample `k` items without replacement. Returns fewer than `k` items
    /// when the input is shorter.
    pub fn sample<T: Clone>(&mut self, items: &[T], k: usize) -> Vec<T> {
        let mut copy = items.to_vec();
        self.shuffle(&mut copy);
        copy.truncate(k);
        copy
    }

    /// Pick one element uniformly, or `None` for an empty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_int(0, items.len()))
    }

    /// Number of draws taken since construction or the last `reset`.
    pub fn call_count(&self) -> u64 {
        self.calls
    }
}

/// 32-bit FNV-1a hash used to turn textual seeds into numeric ones.
pub fn seed_from_label(label: &str) -> u32 {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in label.bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Convert a `YYYY-MM-DD` date to the daily seed `y*10000 + m*100 + d`.
///
/// Returns `None` for strings that are not three dash-separated numbers.
pub fn date_to_seed(date: &str) -> Option<u32> {
    let mut parts = date.trim().split('-');
    let year: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(year * 10_000 + month * 100 + day)
}

/// Return a shuffled copy of `items` using a fresh generator seeded with
/// `seed`. The input is left untouched.
pub fn shuffle_with_seed<T: Clone>(items: &[T], seed: u32) -> Vec<T> {
    let mut rng = SeededRandom::new(seed);
    let mut result = items.to_vec();
    rng.shuffle(&mut result);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = SeededRandom::new(42);
        let mut b = SeededRandom::new(43);
        assert_ne!(a.next_u32(), b.next_u32());
    }

    /// Reference values from the canonical mulberry32 implementation. If
    /// this ever breaks, daily puzzles and stored GA seeds stop reproducing.
    #[test]
    fn known_sequence_matches_mulberry32() {
        let mut rng = SeededRandom::new(0);
        assert_eq!(rng.next_u32(), 1_144_304_738);
        assert_eq!(rng.next_u32(), 1_416_247);
        assert_eq!(rng.next_u32(), 958_946_056);

        let mut rng = SeededRandom::new(42);
        assert!((rng.next_f64() - 0.601_103_751_920_163_6).abs() < 1e-15);
        assert!((rng.next_f64() - 0.448_290_558_997_541_67).abs() < 1e-15);
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = SeededRandom::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn next_int_within_bounds() {
        let mut rng = SeededRandom::new(999);
        for _ in 0..10_000 {
            let v = rng.next_int(10, 20);
            assert!((10..20).contains(&v), "next_int out of range: {v}");
        }
        assert_eq!(rng.next_int(5, 5), 5);
    }

    #[test]
    fn next_bool_extremes() {
        let mut rng = SeededRandom::new(7);
        for _ in 0..100 {
            assert!(!rng.next_bool(0.0));
            assert!(rng.next_bool(1.0));
        }
    }

    #[test]
    fn next_bool_distribution() {
        let mut rng = SeededRandom::new(42);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.next_bool(0.5)).count();
        let pct = hits as f64 / n as f64;
        assert!((0.45..0.55).contains(&pct), "got {:.1}%", pct * 100.0);
    }

    #[test]
    fn shuffle_is_permutation() {
        let mut rng = SeededRandom::new(3);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
        assert_ne!(items, sorted, "50 items should not stay in order");
    }

    #[test]
    fn sample_without_replacement() {
        let mut rng = SeededRandom::new(11);
        let items: Vec<u32> = (0..20).collect();
        let mut picked = rng.sample(&items, 5);
        assert_eq!(picked.len(), 5);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 5);
        assert_eq!(rng.sample(&items[..3], 10).len(), 3);
    }

    #[test]
    fn pick_empty_is_none() {
        let mut rng = SeededRandom::new(1);
        let empty: [u8; 0] = [];
        assert!(rng.pick(&empty).is_none());
        assert_eq!(rng.pick(&[9]), Some(&9));
    }

    #[test]
    fn call_count_tracks_draws_and_reset() {
        let mut rng = SeededRandom::new(5);
        rng.next_f64();
        rng.next_int(0, 10);
        rng.next_bool(0.5);
        assert_eq!(rng.call_count(), 3);
        rng.reset(5);
        assert_eq!(rng.call_count(), 0);
        assert_eq!(rng, SeededRandom::new(5));
    }

    #[test]
    fn date_to_seed_parses_iso_dates() {
        assert_eq!(date_to_seed("2026-01-06"), Some(20_260_106));
        assert_eq!(date_to_seed("1999-12-31"), Some(19_991_231));
        assert_eq!(date_to_seed(""), None);
        assert_eq!(date_to_seed("2026-01"), None);
        assert_eq!(date_to_seed("2026-01-06-01"), None);
        assert_eq!(date_to_seed("year-mo-dd"), None);
    }

    #[test]
    fn shuffle_with_seed_is_stable() {
        let items = ["a", "b", "c", "d", "e", "f"];
        let first = shuffle_with_seed(&items, 20_260_106);
        let second = shuffle_with_seed(&items, 20_260_106);
        assert_eq!(first, second);
        assert_eq!(items, ["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn label_seeds_use_fnv1a() {
        assert_eq!(seed_from_label(""), 0x811c_9dc5);
        assert_eq!(seed_from_label("gutenku"), 1_175_756_244);
        assert_eq!(
            SeededRandom::from_label("gutenku"),
            SeededRandom::new(1_175_756_244)
        );
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = SeededRandom::new(42);
        for _ in 0..100 {
            rng.next_u32();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: SeededRandom = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u32(), restored.next_u32());
        }
    }
}
