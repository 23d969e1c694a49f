//! Stateful wheel sieve producing primes in ascending order.
//!
//! Mirrors the process-wide `PRIME_GEN` worker of the original source: an
//! append-only list of primes that only ever grows, re-sieving new segments
//! with the primes already known. A single process-wide instance is exposed
//! through [`global`], guarded by a [`Mutex`] as required when the sieve is
//! shared across threads (the core itself never needs the guard since it is
//! single-threaded).
//!
//! The original's byte-packed wheel memory layout is an implementation
//! detail the governing spec explicitly treats as an external collaborator;
//! this crate keeps the wheel's 2-3-5 residue filtering (to skip obviously
//! composite candidates cheaply) but sieves each segment with a plain
//! boolean array rather than a bit-packed one, trading a constant-factor of
//! memory for a much smaller surface of off-by-one bugs.

use std::sync::{Mutex, OnceLock};

/// Default memory cap (in numbers covered) per partition of [`Sieve::sieve`].
pub const DEFAULT_PARTITION_SIZE: u64 = 1 << 22;

/// A stateful, monotonically growing wheel sieve.
#[derive(Debug)]
pub struct Sieve {
    primes: Vec<u64>,
    /// Every integer below `limit` has already been classified; `primes`
    /// contains exactly the primes below `limit`.
    limit: u64,
}

impl Default for Sieve {
    fn default() -> Self {
        Sieve::new()
    }
}

impl Sieve {
    pub fn new() -> Self {
        Sieve {
            primes: vec![2, 3, 5],
            limit: 6,
        }
    }

    /// Grow the cache, if needed, so that every prime below `upper` is known.
    pub fn extend_to(&mut self, upper: u64) {
        while self.limit < upper {
            let tail = *self.primes.last().unwrap();
            // Mirrors the original Worker.gen growth strategy: double the
            // covered range each time by squaring the tail prime, capped to
            // what's actually been requested, so `primes` always contains
            // every prime up to the sqrt of the new limit.
            let candidate = tail.saturating_mul(tail).saturating_sub(1);
            let new_limit = candidate.max(self.limit + 1).min(upper);
            let found = sieve_segment(self.limit, new_limit, &self.primes);
            self.primes.extend(found);
            self.limit = new_limit;
        }
    }

    /// Every prime in `[2, upper)`, in ascending order.
    pub fn primes(&mut self, upper: u64) -> Vec<u64> {
        self.extend_to(upper);
        let idx = match self.primes.binary_search(&upper) {
            Ok(i) | Err(i) => i,
        };
        self.primes[..idx].to_vec()
    }

    /// Every prime in `[a, b)`, sieved directly in one pass, partitioned by
    /// [`DEFAULT_PARTITION_SIZE`] so large ranges don't require the whole
    /// segment resident in memory at once.
    pub fn sieve(&mut self, a: u64, b: u64) -> Vec<u64> {
        self.sieve_partitioned(a, b, DEFAULT_PARTITION_SIZE)
    }

    pub fn sieve_partitioned(&mut self, a: u64, b: u64, partition: u64) -> Vec<u64> {
        if a >= b {
            return Vec::new();
        }
        let sqrt_b = isqrt(b.saturating_sub(1)) + 1;
        self.extend_to(sqrt_b);
        let base_primes = &self.primes;

        let mut result = Vec::new();
        let mut lo = a;
        while lo < b {
            let hi = (lo + partition).min(b);
            result.extend(sieve_segment(lo, hi, base_primes));
            lo = hi;
        }
        result
    }
}

/// Count of primes in `[a, b)`.
pub fn wheel_sieve_count(sieve: &mut Sieve, a: u64, b: u64) -> u64 {
    sieve.sieve(a, b).len() as u64
}

fn isqrt(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let mut x = (n as f64).sqrt() as u64 + 2;
    while x > 0 && x * x > n {
        x -= 1;
    }
    while (x + 1) * (x + 1) <= n {
        x += 1;
    }
    x
}

/// Sieve `[lo, hi)` using `base_primes` (must contain every prime `<= sqrt(hi)`),
/// returning every prime found in ascending order. Handles 2, 3, 5 directly
/// and uses a plain composite bitmap (skipping even/mult-of-3/mult-of-5
/// candidates on output) for the rest.
fn sieve_segment(lo: u64, hi: u64, base_primes: &[u64]) -> Vec<u64> {
    if lo >= hi {
        return Vec::new();
    }
    let mut out = Vec::new();
    for &p in &[2u64, 3, 5] {
        if lo <= p && p < hi {
            out.push(p);
        }
    }
    let start = lo.max(6);
    if start >= hi {
        out.sort_unstable();
        return out;
    }
    let size = (hi - start) as usize;
    let mut composite = vec![false; size];
    for &p in base_primes {
        if p < 7 {
            continue;
        }
        if p.saturating_mul(p) >= hi {
            break;
        }
        let p2 = p * p;
        let mut m = if p2 >= start {
            p2
        } else {
            let k = (start - p2 + p - 1) / p;
            p2 + k * p
        };
        while m < hi {
            composite[(m - start) as usize] = true;
            m += p;
        }
    }
    for (i, is_composite) in composite.iter().enumerate() {
        let candidate = start + i as u64;
        if !is_composite && candidate % 2 != 0 && candidate % 3 != 0 && candidate % 5 != 0 {
            out.push(candidate);
        }
    }
    out.sort_unstable();
    out
}

static GLOBAL_SIEVE: OnceLock<Mutex<Sieve>> = OnceLock::new();

/// Process-wide sieve cache, matching the original's `PRIME_GEN`. Never
/// truncated: repeated calls only grow the high-water mark.
pub fn global() -> &'static Mutex<Sieve> {
    GLOBAL_SIEVE.get_or_init(|| Mutex::new(Sieve::new()))
}

/// Primes in `[2, upper)` from the process-wide cache.
pub fn primes(upper: u64) -> Vec<u64> {
    global().lock().unwrap().primes(upper)
}

/// A boolean primality bitmap over `[0, upper)`, for callers that index
/// candidates directly rather than iterating a prime list (the ECM stage
/// loops, which probe `primes[i]` for each `i` in a range).
pub fn primality_bitmap(upper: u64) -> Vec<bool> {
    let mut bitmap = vec![false; upper as usize];
    for p in primes(upper) {
        bitmap[p as usize] = true;
    }
    bitmap
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wheel_sieve_counts_match_reference() {
        let mut s = Sieve::new();
        assert_eq!(wheel_sieve_count(&mut s, 1, 101), 25);
        assert_eq!(wheel_sieve_count(&mut s, 1, 102), 26);
    }

    #[test]
    fn wheel_sieve_range_matches_reference() {
        let mut s = Sieve::new();
        assert_eq!(s.sieve(11, 31), vec![11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn primes_are_ascending_and_correct_up_to_1000() {
        let mut s = Sieve::new();
        let ps = s.primes(1000);
        let mut prev = 1u64;
        for &p in &ps {
            assert!(p > prev);
            prev = p;
            assert!(is_prime_trial(p));
        }
        for n in 2..1000u64 {
            assert_eq!(ps.contains(&n), is_prime_trial(n));
        }
    }

    #[test]
    fn extend_to_is_monotonic_and_idempotent() {
        let mut s = Sieve::new();
        let first = s.primes(500);
        s.extend_to(200); // should be a no-op, already covered
        let second = s.primes(500);
        assert_eq!(first, second);
    }

    #[test]
    fn sieve_matches_primes_on_overlapping_ranges() {
        let mut s = Sieve::new();
        let direct = s.sieve(100, 200);
        let mut from_cache = Sieve::new();
        let below_200 = from_cache.primes(200);
        let expected: Vec<u64> = below_200.into_iter().filter(|&p| p >= 100).collect();
        assert_eq!(direct, expected);
    }

    fn is_prime_trial(n: u64) -> bool {
        if n < 2 {
            return false;
        }
        let mut d = 2;
        while d * d <= n {
            if n % d == 0 {
                return false;
            }
            d += 1;
        }
        true
    }
}
