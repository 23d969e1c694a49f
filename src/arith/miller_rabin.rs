//! Miller-Rabin compositeness test.

use crate::arith::modular_arithmetic::{multiply_mod, take_mod};
use crate::arith::sieve;
use rug::Integer;

/// `(x ** r) % n` by iterative squaring, ported from the original source's
/// `powmod`.
fn pow_mod_big(x: &Integer, r: &Integer, n: &Integer) -> Integer {
    let mut y = Integer::from(1);
    let mut x1 = take_mod(x, n);
    let mut rr = r.clone();
    while rr > 0 {
        if rr.is_odd() {
            y = multiply_mod(&y, &x1, n);
        }
        rr >>= 1;
        x1 = multiply_mod(&x1, &x1, n);
    }
    y
}

/// Miller-Rabin test on `n` with the given witnesses.
///
/// Returns `true` if `n` passes every witness (n is probably prime, or
/// certainly prime if the witnesses are deterministic for `n`'s size), and
/// `false` as soon as any witness proves `n` composite.
pub fn test(n: &Integer, witnesses: &[Integer]) -> bool {
    if *n == 2 || *n == 3 {
        return true;
    }
    if *n < 5 || n.is_even() {
        return false;
    }
    let n_minus_1 = Integer::from(n - 1);
    let n_minus_2 = Integer::from(n - 2);
    let mut r: u32 = 0;
    let mut d = n_minus_1.clone();
    while d.is_even() {
        d >>= 1;
        r += 1;
    }
    for a in witnesses {
        if *a < 2 || *a > n_minus_2 {
            continue;
        }
        let mut x = pow_mod_big(a, &d, n);
        if x == 1 || x == n_minus_1 {
            continue;
        }
        let mut composite = true;
        for _ in 0..r {
            x = multiply_mod(&x, &x, n);
            if x == n_minus_1 {
                composite = false;
                break;
            }
        }
        if composite {
            return false;
        }
    }
    true
}

/// The first `count` primes, used as the default Miller-Rabin witness list.
pub fn witness_primes(count: usize) -> Vec<Integer> {
    if count == 0 {
        return Vec::new();
    }
    let mut bound: u64 = (count as u64 * 15).max(128);
    loop {
        let ps = sieve::primes(bound);
        if ps.len() >= count {
            return ps[..count].iter().map(|&p| Integer::from(p)).collect();
        }
        bound *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn witness_primes_returns_first_n_primes() {
        let w = witness_primes(10);
        let expected: Vec<Integer> = vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]
            .into_iter()
            .map(Integer::from)
            .collect();
        assert_eq!(w, expected);
    }

    #[test]
    fn miller_rabin_exact_below_million() {
        let witnesses = witness_primes(10);
        for n in 2u64..1_000_000 {
            let expected = is_prime_trial(n);
            let got = test(&Integer::from(n), &witnesses);
            assert_eq!(got, expected, "mismatch at n={}", n);
        }
    }
}
