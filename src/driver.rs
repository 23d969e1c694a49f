//! The top-level factoring driver: trial division, perfect-power detection,
//! then an escalating ECM schedule, absorbing factors off a worklist until
//! every cofactor is either proven prime or small enough to trust.
//!
//! Grounded on `original_source/wheel_sieve/factorize.py`.

use crate::arith::miller_rabin;
use crate::arith::misc::iroot;
use crate::arith::sieve;
use crate::ecm::{self, Stage2};
use crate::error::EcmError;
use rug::ops::Pow;
use rug::{rand::RandState, Integer};
use std::collections::HashMap;

/// Trial-divide `n` by every prime below `bound`, returning the stripped
/// factors and the cofactor left over (1 if `n` was bound-smooth).
pub fn factor_small_primes(n: &Integer, bound: u64) -> (HashMap<Integer, u32>, Integer) {
    let mut factors = HashMap::new();
    let mut rest = Integer::from(n);
    for p in sieve::primes(bound) {
        let p = Integer::from(p);
        let mut count = 0u32;
        loop {
            let (q, r) = rest.clone().div_rem(p.clone());
            if r != 0 {
                break;
            }
            rest = q;
            count += 1;
        }
        if count > 0 {
            factors.insert(p, count);
        }
        if rest == 1 {
            break;
        }
    }
    (factors, rest)
}

/// `(base, exponent)` if `n = base^exponent` for some `exponent >= 2`,
/// checked for every exponent up to `max_power`.
pub fn factor_power(n: &Integer, max_power: u32) -> Option<(Integer, u32)> {
    for d in (2..=max_power).rev() {
        if let Ok(Some(root)) = iroot(n, d) {
            return Some((root, d));
        }
    }
    None
}

/// `(rounds, b1, b2, wheel)` per stage, escalating in effort. Mirrors
/// `factorize.py`'s `factor_ecm` schedule.
pub const ECM_SCHEDULE: [(u64, u64, u64, u64); 4] = [
    (10, 2_000, 50_000, 210),
    (40, 11_000, 600_000, 2_310),
    (100, 50_000, 4_000_000, 2_310),
    (200, 250_000, 40_000_000, 2_310),
];

/// Run the escalating ECM schedule against `n`, stopping at the first
/// factor found. Each stage reseeds its RNG from a fixed seed, so repeated
/// runs against the same `n` are deterministic.
pub fn factor_ecm(n: &Integer) -> Result<Option<Integer>, EcmError> {
    for &(rounds, b1, b2, wheel) in ECM_SCHEDULE.iter() {
        let mut rand = RandState::new();
        rand.seed(&Integer::from(2));
        if let Some(factor) = ecm::ecm(n, rounds, b1, b2, wheel, Stage2::Polyeval, &mut rand)? {
            return Ok(Some(factor));
        }
    }
    Ok(None)
}

/// Default witness count for the Miller-Rabin primality checks used while
/// absorbing cofactors (distinct from the caller-supplied witnesses used on
/// the *final* reported factors).
const INTERNAL_WITNESS_COUNT: usize = 10;

/// Trial-divide, strip perfect powers, then escalate through ECM, absorbing
/// every factor found back onto a worklist until each remaining cofactor is
/// either proven prime (against `witnesses`) or equal to 1.
///
/// Returns `(prime_factors, unresolved)`: `prime_factors` maps confirmed
/// primes to their multiplicities; `unresolved` maps composites that
/// exhausted the ECM schedule without splitting to theirs. A caller sees the
/// composite in `unresolved` rather than mistaking it for a genuine prime
/// factor.
///
/// # Errors
/// Returns [`EcmError::InvalidModulus`] for `n < 2`. Otherwise propagates
/// [`EcmError`] from an invalid bound pair or a too-small modulus reached
/// mid-factorization (the latter should not occur for any `n >= 2`, since
/// stripped cofactors only shrink).
pub fn factorize(
    n: &Integer,
    witnesses: &[Integer],
) -> Result<(HashMap<Integer, u32>, HashMap<Integer, u32>), EcmError> {
    if *n < 2 {
        return Err(EcmError::InvalidModulus(n.clone()));
    }

    let mut confirmed: HashMap<Integer, u32> = HashMap::new();
    let mut unresolved: HashMap<Integer, u32> = HashMap::new();
    let internal_witnesses = miller_rabin::witness_primes(INTERNAL_WITNESS_COUNT);

    let (small_factors, rest) = factor_small_primes(n, 1033);
    for (p, e) in small_factors {
        *confirmed.entry(p).or_insert(0) += e;
    }

    let mut worklist: Vec<(Integer, u32)> = if rest > 1 { vec![(rest, 1)] } else { Vec::new() };

    while let Some((m, mult)) = worklist.pop() {
        if m == 1 {
            continue;
        }
        if miller_rabin::test(&m, &internal_witnesses) {
            let final_witnesses = if witnesses.is_empty() { &internal_witnesses } else { witnesses };
            let is_prime = witnesses.is_empty() || miller_rabin::test(&m, final_witnesses);
            if is_prime {
                *confirmed.entry(m).or_insert(0) += mult;
                continue;
            }
        }

        let bit_length = m.significant_bits();
        if let Some((base, exp)) = factor_power(&m, bit_length / 10 + 1) {
            worklist.push((base, mult * exp));
            continue;
        }

        match factor_ecm(&m)? {
            Some(factor) => {
                let cofactor = Integer::from(&m / &factor);
                worklist.push((factor, mult));
                worklist.push((cofactor, mult));
            }
            None => {
                // Exhausted the schedule without splitting m: this cofactor
                // is unresolved, not a confirmed prime, so it goes in the
                // unresolved map rather than being merged into `confirmed`.
                *unresolved.entry(m).or_insert(0) += mult;
            }
        }
    }

    Ok((confirmed, unresolved))
}
