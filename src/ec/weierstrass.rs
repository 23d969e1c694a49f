//! Short Weierstrass elliptic curve `y^2 = x^3 + a*x + b (mod n)`, in affine
//! coordinates.
//!
//! Grounded on `original_source/wheel_sieve/ecm/ecm_weierstrass.py`. Point
//! addition needs exactly one modular inversion, except when one operand is
//! the point at infinity. [`AddState`] factors that inversion out of the
//! addition itself so [`mul_multi`] can batch the inversions of many
//! concurrent scalar multiplications through [`inv_multi`].

use crate::arith::modular_arithmetic::{gcd, inv, inv_multi, multiply_mod, pow_mod, subtract_mod, take_mod};
use crate::error::InverseNotFound;
use rug::Integer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Point {
    Infinity,
    Affine(Integer, Integer),
}

#[derive(Clone, Debug)]
pub struct Curve {
    pub a: Integer,
    pub b: Integer,
    pub n: Integer,
}

impl Curve {
    /// The curve through `(x0, y0)` with the given `a`, i.e. `b` solved for.
    pub fn through(x0: &Integer, y0: &Integer, a: &Integer, n: &Integer) -> Curve {
        let b = take_mod(&(Integer::from(y0 * y0) - pow_mod(x0, 3, n) - a * x0), n);
        Curve { a: a.clone(), b, n: n.clone() }
    }

    /// `gcd(4a^3 + 27b^2, n)`: 0 means the curve is singular (discriminant
    /// vanishes mod n), a value strictly between 1 and n is a factor of n.
    pub fn delta(&self) -> Integer {
        let disc = take_mod(
            &(Integer::from(4) * pow_mod(&self.a, 3, &self.n) + Integer::from(27) * pow_mod(&self.b, 2, &self.n)),
            &self.n,
        );
        take_mod(&gcd(&disc, &self.n), &self.n)
    }
}

pub fn neg(pt: &Point, curve: &Curve) -> Point {
    match pt {
        Point::Infinity => Point::Infinity,
        Point::Affine(x, y) => Point::Affine(x.clone(), take_mod(&(Integer::from(&curve.n) - y), &curve.n)),
    }
}

/// The state an addition is suspended in while waiting for a modular
/// inverse of `denom`, or its immediate outcome when no inversion is
/// required (one operand is the point at infinity).
pub enum AddState {
    Done(Point),
    AwaitingInverse { denom: Integer, is_double: bool },
}

fn add_start(p1: &Point, p2: &Point, curve: &Curve) -> AddState {
    match (p1, p2) {
        (Point::Infinity, _) => AddState::Done(p2.clone()),
        (_, Point::Infinity) => AddState::Done(p1.clone()),
        (Point::Affine(x1, y1), Point::Affine(x2, y2)) => {
            if x1 == x2 && y1 == y2 {
                AddState::AwaitingInverse {
                    denom: take_mod(&Integer::from(2 * y1), &curve.n),
                    is_double: true,
                }
            } else if x1 == x2 {
                // x1 == x2, y1 != y2: P + (-P) = O.
                AddState::Done(Point::Infinity)
            } else {
                AddState::AwaitingInverse {
                    denom: take_mod(&(x2 - x1), &curve.n),
                    is_double: false,
                }
            }
        }
    }
}

fn add_finish(p1: &Point, p2: &Point, curve: &Curve, inv_val: &Integer, is_double: bool) -> Point {
    let (x1, y1) = match p1 {
        Point::Affine(x, y) => (x, y),
        Point::Infinity => unreachable!(),
    };
    let (x2, y2) = match p2 {
        Point::Affine(x, y) => (x, y),
        Point::Infinity => unreachable!(),
    };
    let s = if is_double {
        let numer = take_mod(&(Integer::from(3) * Integer::from(x1 * x1) + &curve.a), &curve.n);
        multiply_mod(&numer, inv_val, &curve.n)
    } else {
        multiply_mod(&subtract_mod(y2, y1, &curve.n), inv_val, &curve.n)
    };
    let xr = take_mod(&(Integer::from(&s * &s) - x1 - x2), &curve.n);
    let yr = take_mod(&(Integer::from(&s * &(x1 - &xr)) - y1), &curve.n);
    Point::Affine(xr, yr)
}

/// `p1 + p2` on `curve`, performing the inversion immediately.
pub fn add(p1: &Point, p2: &Point, curve: &Curve) -> Result<Point, InverseNotFound> {
    match add_start(p1, p2, curve) {
        AddState::Done(p) => Ok(p),
        AddState::AwaitingInverse { denom, is_double } => {
            let iv = inv(&denom, &curve.n)?;
            Ok(add_finish(p1, p2, curve, &iv, is_double))
        }
    }
}

/// `k * point` on `curve` via double-and-add, performing each inversion
/// immediately (`mul_pt_exn`-equivalent).
pub fn mul(point: &Point, curve: &Curve, k: &Integer) -> Result<Point, InverseNotFound> {
    if *k < 0 {
        return mul(&neg(point, curve), curve, &Integer::from(-k));
    }
    let mut res = Point::Infinity;
    let mut kk = k.clone();
    let mut p = point.clone();
    while kk >= 1 {
        if kk.is_odd() {
            res = add(&res, &p, curve)?;
        }
        kk >>= 1;
        if kk >= 1 {
            p = add(&p, &p, curve)?;
        }
    }
    Ok(res)
}

/// One concurrently-running `mul` job, suspendable at each point it needs a
/// modular inverse, so many jobs can share a single [`inv_multi`] call.
struct MulJob {
    k: Integer,
    res: Point,
    point: Point,
    pending: Pending,
}

enum Pending {
    Idle,
    Add { denom: Integer, is_double: bool },
    Double { denom: Integer },
}

enum Finished {
    No,
    Yes(Point),
}

impl MulJob {
    fn new(point: Point, k: &Integer, curve: &Curve) -> MulJob {
        if *k < 0 {
            return MulJob::new(neg(&point, curve), &Integer::from(-k), curve);
        }
        MulJob { k: k.clone(), res: Point::Infinity, point, pending: Pending::Idle }
    }

    /// Run as far as possible without external input. Returns the
    /// denominator this job is now blocked on, or `None` if it finished.
    fn advance(&mut self, curve: &Curve) -> (Finished, Option<Integer>) {
        loop {
            match &self.pending {
                Pending::Add { .. } | Pending::Double { .. } => unreachable!("advance called while suspended"),
                Pending::Idle => {
                    if self.k < 1 {
                        return (Finished::Yes(self.res.clone()), None);
                    }
                    if self.k.is_odd() {
                        match add_start(&self.res, &self.point, curve) {
                            AddState::Done(p) => {
                                self.res = p;
                                // fall through to the unconditional doubling below
                            }
                            AddState::AwaitingInverse { denom, is_double } => {
                                self.pending = Pending::Add { denom: denom.clone(), is_double };
                                return (Finished::No, Some(denom));
                            }
                        }
                    }
                    self.k >>= 1;
                    if self.k < 1 {
                        return (Finished::Yes(self.res.clone()), None);
                    }
                    match add_start(&self.point, &self.point, curve) {
                        AddState::Done(p) => {
                            self.point = p;
                        }
                        AddState::AwaitingInverse { denom, is_double } => {
                            self.pending = Pending::Double { denom: denom.clone() };
                            return (Finished::No, Some(denom));
                        }
                    }
                }
            }
        }
    }

    fn resume(&mut self, inv_val: &Integer, curve: &Curve) {
        match std::mem::replace(&mut self.pending, Pending::Idle) {
            Pending::Add { is_double, .. } => {
                self.res = add_finish(&self.res, &self.point, curve, inv_val, is_double);
            }
            Pending::Double { .. } => {
                self.point = add_finish(&self.point, &self.point, curve, inv_val, true);
            }
            Pending::Idle => unreachable!("resume called while not suspended"),
        }
    }
}

/// `[k * point for k in ks]`, batching every modular inversion needed across
/// all of the scalar multiplications through [`inv_multi`] (`mul_pt_multi`-
/// equivalent).
pub fn mul_multi(point: &Point, curve: &Curve, ks: &[Integer]) -> Result<Vec<Point>, InverseNotFound> {
    let mut jobs: Vec<MulJob> = ks.iter().map(|k| MulJob::new(point.clone(), k, curve)).collect();
    let mut pending: Vec<Option<Integer>> = jobs
        .iter_mut()
        .map(|j| match j.advance(curve) {
            (Finished::Yes(p), _) => {
                j.res = p;
                None
            }
            (Finished::No, denom) => denom,
        })
        .collect();

    loop {
        let working: Vec<usize> = pending
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|_| i))
            .collect();
        if working.is_empty() {
            break;
        }
        let denoms: Vec<Integer> = working.iter().map(|&i| pending[i].clone().unwrap()).collect();
        let inverses = inv_multi(&denoms, &curve.n)?;
        for (slot, &i) in working.iter().enumerate() {
            jobs[i].resume(&inverses[slot], curve);
            pending[i] = match jobs[i].advance(curve) {
                (Finished::Yes(p), _) => {
                    jobs[i].res = p;
                    None
                }
                (Finished::No, denom) => denom,
            };
        }
    }

    Ok(jobs
        .into_iter()
        .map(|j| match j.pending {
            Pending::Idle => j.res,
            _ => unreachable!("mul_multi terminated with a job still suspended"),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    // y^2 = x^3 + 2x + 3 (mod 97); (3, 6) is on the curve.
    fn small_curve() -> Curve {
        Curve { a: Integer::from(2), b: Integer::from(3), n: Integer::from(97) }
    }

    #[test]
    fn double_matches_triple_add() {
        let curve = small_curve();
        let p = Point::Affine(Integer::from(3), Integer::from(6));
        let doubled = add(&p, &p, &curve).unwrap();
        let via_mul = mul(&p, &curve, &Integer::from(2)).unwrap();
        assert_eq!(doubled, via_mul);
    }

    #[test]
    fn mul_multi_matches_individual_mul() {
        let curve = small_curve();
        let p = Point::Affine(Integer::from(3), Integer::from(6));
        let ks: Vec<Integer> = (1..12).map(Integer::from).collect();
        let batched = mul_multi(&p, &curve, &ks).unwrap();
        for (k, bp) in ks.iter().zip(batched.iter()) {
            assert_eq!(mul(&p, &curve, k).unwrap(), *bp);
        }
    }

    #[test]
    fn add_identity_and_inverse() {
        let curve = small_curve();
        let p = Point::Affine(Integer::from(3), Integer::from(6));
        assert_eq!(add(&p, &Point::Infinity, &curve).unwrap(), p);
        let neg_p = neg(&p, &curve);
        assert_eq!(add(&p, &neg_p, &curve).unwrap(), Point::Infinity);
    }

    #[test]
    fn mul_multi_matches_individual_mul_over_a_wide_range_on_a_large_modulus() {
        let n = Integer::from(65537) * Integer::from(65539);
        let curve = Curve::through(&Integer::from(3), &Integer::from(6), &Integer::from(2), &n);
        let p = Point::Affine(Integer::from(3), Integer::from(6));
        let ks: Vec<Integer> = (-1000..=1000).map(Integer::from).collect();
        let batched = mul_multi(&p, &curve, &ks).unwrap();
        for (k, bp) in ks.iter().zip(batched.iter()) {
            assert_eq!(mul(&p, &curve, k).unwrap(), *bp);
        }
    }

    #[test]
    fn mul_multi_surfaces_inverse_not_found_as_a_factor() {
        // n = 65537 * 65539; a curve whose group order shares a factor with
        // n will hit a non-invertible denominator somewhere in the ladder.
        let n = Integer::from(65537) * Integer::from(65539);
        let curve = Curve { a: Integer::from(1), b: Integer::from(1), n: n.clone() };
        let p = Point::Affine(Integer::from(0), Integer::from(1));
        // k large enough to likely wrap the group order of one prime factor.
        let ks: Vec<Integer> = vec![Integer::from(65537), Integer::from(65539), Integer::from(131076)];
        if let Err(e) = mul_multi(&p, &curve, &ks) {
            assert!(gcd(&e.x, &n) > 1);
        }
    }
}
