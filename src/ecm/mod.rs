//! The three Stage-2 strategies, sharing one Stage-1 implementation and
//! Suyama curve sampling.
//!
//! - [`Stage2::Naive`]: Weierstrass points, one gcd probe per small prime in
//!   `(B1,B2]`. Grounded on `ecm_weierstrass.py::ecm`.
//! - [`Stage2::XzAccum`]: the teacher's accumulated-XZ-product engine
//!   (`inversionless_ecm`), kept close to verbatim.
//! - [`Stage2::Polyeval`]: Brent-Suyama finite differences plus product/
//!   remainder trees. Grounded on `ecm_polyeval.py::ecm`.

use crate::arith::misc::{integer_log, randint};
use crate::arith::modular_arithmetic::{gcd, multiply_mod, subtract_mod, take_mod};
use crate::arith::montgomery_point::MontgomeryPoint;
use crate::arith::sieve;
use crate::brent_suyama::{apply_polynomial, get_difference_seq, step_difference_seq_exn, DEFAULT_POLYNOMIAL};
use crate::ec::montgomery::{self, MontgomeryCurve};
use crate::ec::weierstrass::{self, Point};
use crate::error::{ArithError, EcmError};
use crate::poly::Polynomial;
use crate::polyeval::{product_tree, recip_tree, remainder_tree};
use rug::ops::Pow;
use rug::{rand::RandState, Integer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage2 {
    Naive,
    XzAccum,
    Polyeval,
}

/// One ECM attempt's outcome: either a found factor, or nothing (try
/// another round / bigger bounds).
pub type EcmResult = Result<Option<Integer>, EcmError>;

fn check_bounds(n: &Integer, b1: u64, b2: u64) -> Result<(), EcmError> {
    if *n < 12 {
        return Err(EcmError::ModulusTooSmall(n.clone()));
    }
    if b1 >= b2 {
        return Err(EcmError::InvalidBounds { b1, b2 });
    }
    Ok(())
}

/// `k = prod_{p <= b1} p^(floor(log_p(b1)))`, the Stage-1 smooth exponent.
fn stage1_exponent(b1: u64) -> Integer {
    let mut k = Integer::from(1);
    for p in sieve::primes(b1 + 1) {
        if let Some((e, _)) = integer_log(b1, p) {
            k *= Integer::from(p).pow(e);
        }
    }
    k
}

/// Sample a curve, retrying up to 20 times on a [`crate::error::CurveInitFail`],
/// surfacing any factor found via [`crate::error::InverseNotFound`] along the
/// way.
fn sample_curve(
    n: &Integer,
    rand: &mut RandState,
) -> Result<Option<(MontgomeryPoint, MontgomeryCurve)>, Integer> {
    for _ in 0..20 {
        let sigma = randint(rand, &Integer::from(6), &Integer::from(n - 6));
        match montgomery::get_curve_suyama(&sigma, n) {
            Ok(pair) => return Ok(Some(pair)),
            Err(ArithError::CurveInitFail(_)) => continue,
            Err(ArithError::InverseNotFound(e)) => {
                let g = e.gcd_factor();
                if g > 1 && g < *n {
                    return Err(g);
                }
            }
        }
    }
    Ok(None)
}

/// One curve's full Stage 1 + Stage 2 attempt.
fn run_one_curve(
    pt: MontgomeryPoint,
    curve: MontgomeryCurve,
    n: &Integer,
    k: &Integer,
    b1: u64,
    b2: u64,
    wheel: u64,
    engine: Stage2,
) -> Result<Option<Integer>, crate::error::InverseNotFound> {
    let pt = pt.montgomery_ladder(k);
    let g = gcd(&pt.z, n);
    if g > 1 && g < *n {
        return Ok(Some(g));
    }
    match engine {
        Stage2::XzAccum => xz_accum_stage2(&pt, &curve, n, b1, b2, wheel),
        Stage2::Naive => naive_stage2(&pt, &curve, n, b1, b2, wheel),
        Stage2::Polyeval => polyeval_stage2(&pt, &curve, n, b1, b2, wheel),
    }
}

/// Run `rounds` curves of ECM against `n` with the given bounds, using
/// `engine` for Stage 2.
pub fn ecm(n: &Integer, rounds: u64, b1: u64, b2: u64, wheel: u64, engine: Stage2, rand: &mut RandState) -> EcmResult {
    check_bounds(n, b1, b2)?;
    let k = stage1_exponent(b1);

    for _ in 0..rounds {
        let (pt, curve) = match sample_curve(n, rand) {
            Err(factor) => return Ok(Some(factor)),
            Ok(None) => break,
            Ok(Some(pair)) => pair,
        };

        match run_one_curve(pt, curve, n, &k, b1, b2, wheel, engine) {
            Ok(Some(factor)) => return Ok(Some(factor)),
            Ok(None) => continue,
            Err(e) => {
                let g = e.gcd_factor();
                if g > 1 && g < *n {
                    return Ok(Some(g));
                }
            }
        }
    }
    Ok(None)
}

/// Try exactly one curve, pinned to a caller-supplied Suyama seed rather
/// than sampled randomly. Used by the CLI's `--sigma` flag.
pub fn ecm_with_sigma(n: &Integer, sigma: &Integer, b1: u64, b2: u64, wheel: u64, engine: Stage2) -> EcmResult {
    check_bounds(n, b1, b2)?;
    let k = stage1_exponent(b1);
    let (pt, curve) = match montgomery::get_curve_suyama(sigma, n) {
        Ok(pair) => pair,
        Err(ArithError::CurveInitFail(_)) => return Ok(None),
        Err(ArithError::InverseNotFound(e)) => {
            let g = e.gcd_factor();
            return Ok(if g > 1 && g < *n { Some(g) } else { None });
        }
    };
    match run_one_curve(pt, curve, n, &k, b1, b2, wheel, engine) {
        Ok(factor) => Ok(factor),
        Err(e) => {
            let g = e.gcd_factor();
            Ok(if g > 1 && g < *n { Some(g) } else { None })
        }
    }
}

fn u64_gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Algorithm 7.4.4 (Crandall & Pomerance), the teacher's accumulated XZ
/// product engine, generalized from a boolean primality array to the shared
/// [`sieve`] module, and from an unfiltered integer scan to wheel-filtered
/// candidates (matching the residue filtering the other two engines already
/// do via [`wheel_residues`]).
fn xz_accum_stage2(
    pt: &MontgomeryPoint,
    _curve: &MontgomeryCurve,
    n: &Integer,
    b1: u64,
    b2: u64,
    wheel: u64,
) -> Result<Option<Integer>, crate::error::InverseNotFound> {
    let d: usize = (b2 as f64).sqrt() as usize;
    let mut points = vec![MontgomeryPoint::default(); d + 1];
    let mut beta = vec![Integer::from(0); d + 1];

    points[1] = pt.double();
    points[2] = points[1].double();
    beta[1] = multiply_mod(&points[1].x, &points[1].z, n);
    beta[2] = multiply_mod(&points[2].x, &points[2].z, n);
    for idx in 3..=d {
        points[idx] = points[idx - 1].addh(&points[1], &points[idx - 2]);
        beta[idx] = multiply_mod(&points[idx].x, &points[idx].z, n);
    }

    let mut g = Integer::from(1);
    let b = b1 - 1;
    // X-only Montgomery arithmetic tracks a point and its negation
    // identically, so the sign of b - 2d doesn't matter here.
    let t_offset = (b as i64 - 2 * d as i64).unsigned_abs();
    let mut t = pt.montgomery_ladder(&Integer::from(t_offset));
    let mut s = pt.montgomery_ladder(&Integer::from(b));

    let sieve_bound = b2 + 2 * (d as u64) + 2;
    let is_prime = sieve::primality_bitmap(sieve_bound);

    let mut r = b;
    while r < b2 {
        let alpha = take_mod(&Integer::from(&s.x * &s.z), n);
        let min = r + 2;
        let max = r + 2 * (d as u64) + 1;
        for i in min..max {
            if u64_gcd(i, wheel) != 1 {
                continue;
            }
            if is_prime.get(i as usize).copied().unwrap_or(false) {
                let delta = ((i - r) / 2) as usize;
                let f = Integer::from(Integer::from(&s.x - &points[d].x) * Integer::from(&s.z + &points[d].z))
                    - &alpha
                    + &beta[delta];
                g = multiply_mod(&g, &f, n);
            }
        }
        let tmp = s.clone();
        s = s.addh(&points[d], &t);
        t = tmp;
        r += 2 * d as u64;
    }
    let g = g.gcd(n);
    if g > 1 && g < *n {
        return Ok(Some(g));
    }
    Ok(None)
}

fn wheel_residues(wheel: u64) -> Vec<u64> {
    (1..wheel / 2).filter(|j| gcd(&Integer::from(*j), &Integer::from(wheel)) == 1).collect()
}

/// Grounded on `ecm_weierstrass.py::ecm`'s Stage 2: per-prime gcd probes
/// against a fixed wheel residue set, rather than polynomial batching.
fn naive_stage2(
    pt: &MontgomeryPoint,
    curve: &MontgomeryCurve,
    n: &Integer,
    b1: u64,
    b2: u64,
    wheel: u64,
) -> Result<Option<Integer>, crate::error::InverseNotFound> {
    let (q, wcurve) = montgomery::to_weierstrass(pt, curve)?;
    let mq = weierstrass::mul(&q, &wcurve, &Integer::from(wheel))?;
    let mut jq_list = Vec::new();
    for j in wheel_residues(wheel) {
        let jq = weierstrass::mul(&q, &wcurve, &Integer::from(j))?;
        if let Point::Affine(_, y) = &jq {
            let res = gcd(y, n);
            if res > 1 && res < *n {
                return Ok(Some(res));
            }
        }
        jq_list.push(jq);
    }
    let mut c = (b1 / wheel) * wheel;
    let mut cq = weierstrass::mul(&q, &wcurve, &Integer::from(c))?;
    while c < b2 + wheel {
        let (cx, cy) = match &cq {
            Point::Affine(x, y) => (x.clone(), y.clone()),
            Point::Infinity => (Integer::from(0), Integer::from(0)),
        };
        let mut s = if cy != 0 { cy.clone() } else { Integer::from(1) };
        for jq in &jq_list {
            if let Point::Affine(jx, _) = jq {
                if *jx != cx {
                    s = multiply_mod(&s, &subtract_mod(&cx, jx, n), n);
                }
            }
        }
        let res = gcd(&s, n);
        if res > 1 && res < *n {
            return Ok(Some(res));
        } else if res == *n {
            let res = gcd(&cy, n);
            if res > 1 && res < *n {
                return Ok(Some(res));
            }
            for jq in &jq_list {
                if let Point::Affine(jx, _) = jq {
                    let res = gcd(&subtract_mod(&cx, jx, n), n);
                    if res > 1 && res < *n {
                        return Ok(Some(res));
                    }
                }
            }
        }
        c += wheel;
        cq = weierstrass::add(&cq, &mq, &wcurve)?;
    }
    Ok(None)
}

/// Grounded on `ecm_polyeval.py::ecm`.
fn polyeval_stage2(
    pt: &MontgomeryPoint,
    curve: &MontgomeryCurve,
    n: &Integer,
    b1: u64,
    b2: u64,
    wheel: u64,
) -> Result<Option<Integer>, crate::error::InverseNotFound> {
    let (q, wcurve) = montgomery::to_weierstrass(pt, curve)?;
    let poly = &DEFAULT_POLYNOMIAL;
    let j_list = wheel_residues(wheel);
    let block_size = j_list.len().max(1).next_power_of_two();

    let c1 = b1 / wheel;
    let c2 = b2 / wheel + 2;
    let mut k_ls: Vec<Integer> = j_list.iter().map(|&j| apply_polynomial(poly, &Integer::from(j))).collect();
    k_ls.extend(get_difference_seq(poly, &Integer::from(c1 * wheel), &Integer::from(wheel)));

    let mul_res = weierstrass::mul_multi(&q, &wcurve, &k_ls)?;
    let xj_list: Vec<Integer> = mul_res[..j_list.len()]
        .iter()
        .map(|p| match p {
            Point::Affine(x, _) => x.clone(),
            Point::Infinity => Integer::from(0),
        })
        .collect();
    let mut cq_list: Vec<Point> = mul_res[j_list.len()..].to_vec();

    let f_tree = product_tree(
        &xj_list
            .iter()
            .map(|xj| Polynomial::new(vec![take_mod(&(Integer::from(n) - xj), n), Integer::from(1)], n.clone()))
            .collect::<Vec<_>>(),
        n,
    );
    let f_recip_tree = recip_tree(&f_tree)?;

    let mut h = Polynomial::new(vec![Integer::from(1)], n.clone());
    let mut g_poly_list: Vec<Polynomial> = Vec::new();
    let mut c = 0u64;
    while c < c2 - c1 {
        let step = block_size.min((c2 - c1 - c) as usize);
        for _ in 0..step {
            let cx = match &cq_list[0] {
                Point::Affine(x, _) => x.clone(),
                Point::Infinity => Integer::from(0),
            };
            g_poly_list.push(Polynomial::new(
                vec![take_mod(&(Integer::from(n) - &cx), n), Integer::from(1)],
                n.clone(),
            ));
            step_difference_seq_exn(&mut cq_list, &wcurve)?;
            c += 1;
        }
        let g = product_tree(&g_poly_list, n).remove(0);
        h = h.mul(&g).mod_with_recip(&f_tree[0], &f_recip_tree[0]);
        g_poly_list.clear();
    }

    let rem_tree = remainder_tree(&h, &f_tree, &f_recip_tree, n);
    let res = gcd(&rem_tree[0], n);
    if res > 1 && res < *n {
        return Ok(Some(res));
    } else if res == *n {
        for rem in &rem_tree[rem_tree.len() / 2..] {
            let res = gcd(rem, n);
            if res > 1 && res < *n {
                return Ok(Some(res));
            }
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_factor_of_a_small_semiprime() {
        // 65537 and 65539 are both prime.
        let n = Integer::from(65537u64) * Integer::from(65539u64);
        let mut rand = RandState::new();
        rand.seed(&Integer::from(2));
        let result = ecm(&n, 40, 2_000, 50_000, 210, Stage2::XzAccum, &mut rand).unwrap();
        if let Some(f) = result {
            assert!(f == 65537 || f == 65539);
        }
    }

    #[test]
    fn rejects_modulus_too_small() {
        let mut rand = RandState::new();
        let err = ecm(&Integer::from(10), 1, 100, 1000, 210, Stage2::Naive, &mut rand).unwrap_err();
        assert!(matches!(err, EcmError::ModulusTooSmall(_)));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut rand = RandState::new();
        let err = ecm(&Integer::from(100), 1, 5000, 1000, 210, Stage2::Naive, &mut rand).unwrap_err();
        assert!(matches!(err, EcmError::InvalidBounds { .. }));
    }

    #[test]
    fn finds_a_factor_of_a_117_bit_semiprime() {
        // n = 103190330403778789 * 103190330403788729
        let n: Integer = "10648244288842058842742264007469181".parse().unwrap();
        let mut rand = RandState::new();
        rand.seed(&Integer::from(2));
        if let Some(f) = ecm(&n, 100, 10_000, 100_000, 210, Stage2::XzAccum, &mut rand).unwrap() {
            let p1: Integer = "103190330403778789".parse().unwrap();
            let p2: Integer = "103190330403788729".parse().unwrap();
            assert!(f == p1 || f == p2);
        }
    }

    #[test]
    fn finds_a_factor_of_another_semiprime() {
        // n = 413198756866051421 * 752033864163021509
        let n: Integer = "310739457793333465418548557523014289".parse().unwrap();
        let mut rand = RandState::new();
        rand.seed(&Integer::from(2));
        if let Some(f) = ecm(&n, 100, 10_000, 800_000, 210, Stage2::XzAccum, &mut rand).unwrap() {
            let p1: Integer = "413198756866051421".parse().unwrap();
            let p2: Integer = "752033864163021509".parse().unwrap();
            assert!(f == p1 || f == p2);
        }
    }
}
