pub mod arith;
pub mod brent_suyama;
pub mod driver;
pub mod ec;
pub mod ecm;
pub mod error;
pub mod poly;
pub mod polyeval;

use error::EcmError;
use rug::{rand::RandState, Integer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Lenstra's Elliptic Curve Method for Factorization (ECM), one curve at a
/// time, using the accumulated-XZ-product Stage 2 (Algorithm 7.4.4 from
/// Crandall and Pomerance's *Prime Numbers*).
///
/// Returns a nontrivial factor of `n` upon success.
///
/// `b1` and `b2` are the Stage 1 / Stage 2 smoothness bounds (`b2` usually
/// ~100x `b1`). `sigma`, if given, pins the single curve to try instead of
/// sampling randomly. `thread_no` seeds this call's RNG so concurrent
/// callers (see [`ecm_multithreaded`]) explore disjoint curves.
pub fn ecm_round(
    n: &Integer,
    max_curves: &Option<Integer>,
    b1: u64,
    b2: u64,
    sigma: &Option<Integer>,
    thread_no: usize,
    found_factor: &AtomicBool,
) -> Result<Option<Integer>, EcmError> {
    if found_factor.load(Ordering::Relaxed) {
        return Ok(None);
    }

    let result = if let Some(s) = sigma {
        ecm::ecm_with_sigma(n, s, b1, b2, 210, ecm::Stage2::XzAccum)?
    } else {
        let mut rand = RandState::new();
        rand.seed(&Integer::from(thread_no));
        let rounds = max_curves.as_ref().and_then(|l| l.to_u64()).unwrap_or(u64::MAX);
        ecm::ecm(n, rounds, b1, b2, 210, ecm::Stage2::XzAccum, &mut rand)?
    };
    if result.is_some() {
        found_factor.swap(true, Ordering::Relaxed);
    }
    Ok(result)
}

pub fn ecm_singlethreaded(
    n: &Integer,
    max_curves: &Option<Integer>,
    b1: u64,
    b2: u64,
    sigma: &Option<Integer>,
) -> Result<Option<Integer>, EcmError> {
    ecm_round(n, max_curves, b1, b2, sigma, 0, &AtomicBool::new(false))
}

/// Race `nthreads` single-threaded searches against each other, stopping
/// every other thread as soon as one finds a factor.
pub fn ecm_multithreaded(
    n: &Integer,
    max_curves: &Option<Integer>,
    b1: u64,
    b2: u64,
    sigma: &Option<Integer>,
    nthreads: usize,
) -> Option<Integer> {
    let found_factor = Arc::new(AtomicBool::new(false));
    let mut children = vec![];
    let n = Arc::new(Integer::from(n));
    for i in 0..nthreads {
        let n = n.clone();
        let curves = max_curves.clone();
        let sigma = sigma.clone();
        let found_factor = Arc::clone(&found_factor);
        children.push(thread::spawn(move || -> Option<Integer> {
            ecm_round(&n, &curves, b1, b2, &sigma, i, &found_factor).ok().flatten()
        }))
    }
    let mut found = None;
    for child in children {
        match child.join() {
            Ok(None) | Err(_) => (),
            Ok(f) => found = f,
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Find a factor of Fermat numbers F_n = 2^(2^n) + 1 for n = 5 up to 7.
    #[test]
    fn check_ecm_fermat() {
        let b1 = 10_000;
        let b2 = 100 * b1;
        for i in 5..8 {
            let fermat = Integer::from(Integer::u_pow_u(2, 2u32.pow(i))) + 1;
            if let Ok(Some(factor)) = ecm_singlethreaded(&fermat, &None, b1, b2, &None) {
                assert_eq!(Integer::from(&fermat % &factor), Integer::from(0));
            }
        }
    }
}
