//! Evaluation of a fixed low-degree polynomial along an arithmetic
//! progression by finite differences, used to generate the scalar
//! multipliers (and later, to advance the corresponding curve points) for
//! the polyeval stage-2 engine.
//!
//! Grounded on `test/ecm/ecm_brent_suyama_test.py`, the only surviving
//! fragment of the original `ecm_brent_suyama.py` (its own source file was
//! dropped upstream; this reconstructs the module from its observed
//! contract plus `ecm_polyeval.py`'s call sites).

use crate::ec::weierstrass::{add, Curve, Point};
use crate::error::InverseNotFound;
use rug::Integer;

/// Brent-Suyama's extension polynomial `P(x) = x^6 + 6x^4 + 9x^2 + 2`,
/// stored as the coefficient list `[a0, a1, ..., a6]` exactly as
/// `ecm_polyeval.py` hardcodes it.
pub const DEFAULT_POLYNOMIAL: [i64; 7] = [2, 0, 9, 0, 6, 0, 1];

/// `P(x)` evaluated by Horner's method over exact integers (not reduced mod
/// any modulus: the result is used as an EC scalar multiplier).
pub fn apply_polynomial(poly: &[i64], x: &Integer) -> Integer {
    let mut acc = Integer::from(0);
    for &c in poly.iter().rev() {
        acc = acc * x + c;
    }
    acc
}

/// The forward-difference stack `[Δ^0 P(a0), Δ^1 P(a0), ..., Δ^deg P(a0)]`
/// for a progression with step `d`, such that repeatedly calling
/// [`step_difference_seq`] walks `seq[0]` through `P(a0), P(a0+d), P(a0+2d), ...`.
pub fn get_difference_seq(poly: &[i64], a0: &Integer, d: &Integer) -> Vec<Integer> {
    let deg = poly.len() - 1;
    let mut ys: Vec<Integer> = (0..=deg)
        .map(|i| apply_polynomial(poly, &(a0 + Integer::from(i) * d)))
        .collect();
    let mut seq = vec![Integer::from(0); deg + 1];
    seq[0] = ys[0].clone();
    for k in 1..=deg {
        for i in 0..(deg + 1 - k) {
            ys[i] = Integer::from(&ys[i + 1] - &ys[i]);
        }
        seq[k] = ys[0].clone();
    }
    seq
}

/// Advance an integer difference stack by one step in place.
pub fn step_difference_seq(seq: &mut [Integer]) {
    for i in 0..seq.len() - 1 {
        let next = seq[i + 1].clone();
        seq[i] += next;
    }
}

/// Advance a stack of curve points by one step in place, each entry being
/// `(Δ^i P)(current) · Q` for some fixed base point `Q`. Mirrors
/// [`step_difference_seq`] with elliptic-curve addition standing in for
/// integer addition.
///
/// # Errors
/// [`InverseNotFound`] when any of the `len - 1` additions needs to invert a
/// non-coprime denominator; the caller recovers a factor via
/// `InverseNotFound::gcd_factor`.
pub fn step_difference_seq_exn(points: &mut [Point], curve: &Curve) -> Result<(), InverseNotFound> {
    for i in 0..points.len() - 1 {
        points[i] = add(&points[i], &points[i + 1], curve)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_seq_matches_direct_evaluation() {
        let poly: [i64; 6] = [0, 1, 0, 2, 0, 3];
        let a0 = Integer::from(5);
        let an = 100;
        let d = Integer::from(7);
        let mut diff_seq = get_difference_seq(&poly, &a0, &d);
        let mut i = Integer::from(&a0);
        while i < an {
            let target = apply_polynomial(&poly, &i);
            assert_eq!(diff_seq[0], target);
            step_difference_seq(&mut diff_seq);
            i += &d;
        }
    }

    #[test]
    fn default_polynomial_matches_its_named_form() {
        // f(x) = x^6 + 6x^4 + 9x^2 + 2
        let x = Integer::from(3);
        let expected = Integer::from(3i64.pow(6) + 6 * 3i64.pow(4) + 9 * 3i64.pow(2) + 2);
        assert_eq!(apply_polynomial(&DEFAULT_POLYNOMIAL, &x), expected);
    }
}
