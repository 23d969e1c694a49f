//! Suyama curve sampling and Montgomery-to-Weierstrass conversion.
//!
//! Grounded on the teacher's `arith::montgomery_point` (kept for the XZ point
//! arithmetic itself) and `original_source/ecm_montgomery.py`'s
//! `get_curve_suyama`/`to_weierstrass`/`check`.

use crate::arith::modular_arithmetic::{gcd, inv, multiply_mod, pow_mod, subtract_mod, take_mod};
use crate::arith::montgomery_point::MontgomeryPoint;
use crate::ec::weierstrass::{Curve as WeierstrassCurve, Point};
use crate::error::{ArithError, CurveInitFail, InverseNotFound};
use rug::Integer;

/// A Montgomery curve `B*y^2 = x^3 + A*x^2 + x (mod n)`, `B` and `y` elided
/// since every operation needed for ECM ignores them.
#[derive(Clone, Debug)]
pub struct MontgomeryCurve {
    pub a: Integer,
    pub n: Integer,
}

/// Sample a curve and starting point from Suyama's parametrization. The
/// resulting group order is guaranteed divisible by 12.
///
/// # Errors
/// [`ArithError::CurveInitFail`] when `sigma` lands on the bad-parameter
/// list, or `A ≡ ±2 (mod n)`. [`ArithError::InverseNotFound`] when
/// `4*u^3*v` fails to invert mod `n` (a `gcd` with `n` then exposes a
/// factor).
pub fn get_curve_suyama(
    sigma: &Integer,
    n: &Integer,
) -> Result<(MontgomeryPoint, MontgomeryCurve), ArithError> {
    let sigma_mod = take_mod(sigma, n);
    let n_minus = |k: i64| take_mod(&(Integer::from(n) - k), n);
    let bad = [n_minus(5), n_minus(3), n_minus(1), Integer::from(0), Integer::from(1), Integer::from(3), Integer::from(5)];
    let triple_bad = [n_minus(5), Integer::from(5)];
    let triple = take_mod(&(Integer::from(3) * &sigma_mod), n);
    if bad.contains(&sigma_mod) || triple_bad.contains(&triple) {
        return Err(CurveInitFail.into());
    }

    let u = subtract_mod(&pow_mod(&sigma_mod, 2, n), &Integer::from(5), n);
    let v = take_mod(&(Integer::from(4) * &sigma_mod), n);
    let x0 = pow_mod(&u, 3, n);
    let z0 = pow_mod(&v, 3, n);

    let numer = take_mod(
        &(pow_mod(&subtract_mod(&v, &u, n), 3, n) * take_mod(&(Integer::from(3) * &u + &v), n)),
        n,
    );
    let denom = take_mod(&(Integer::from(4) * pow_mod(&u, 3, n) * &v), n);
    let inv_denom = inv(&denom, n)?;
    let a = take_mod(&(multiply_mod(&numer, &inv_denom, n) - 2), n);
    if a == n_minus(2) || a == 2 {
        return Err(CurveInitFail.into());
    }

    let point = MontgomeryPoint::new2(x0, z0, a.clone(), n.clone());
    Ok((point, MontgomeryCurve { a, n: n.clone() }))
}

/// `gcd(Z, n) = 1` gate: ECM's success signal. Returns the point unchanged
/// when it passes, or the witnessing [`InverseNotFound`] otherwise.
pub fn check(point: MontgomeryPoint, z: &Integer, n: &Integer) -> Result<MontgomeryPoint, InverseNotFound> {
    if gcd(z, n) > 1 {
        return Err(InverseNotFound::new(z.clone(), n.clone()));
    }
    Ok(point)
}

/// Normalize a Montgomery point/curve to short Weierstrass form, fixing
/// `y_norm = 1`. Different starting points on the same Montgomery curve
/// produce different Weierstrass curves (the `B` coefficient is solved for,
/// not preserved).
pub fn to_weierstrass(
    point: &MontgomeryPoint,
    curve: &MontgomeryCurve,
) -> Result<(Point, WeierstrassCurve), InverseNotFound> {
    let n = &curve.n;
    let a = &curve.a;
    let z_inv = inv(&point.z, n)?;
    let x_norm = multiply_mod(&point.x, &z_inv, n);
    let b = take_mod(
        &(pow_mod(&x_norm, 3, n) + multiply_mod(a, &pow_mod(&x_norm, 2, n), n) + &x_norm),
        n,
    );
    let b_inv = inv(&b, n)?;
    let three_inv = inv(&Integer::from(3), n)?;
    let t = take_mod(
        &(multiply_mod(&x_norm, &b_inv, n) + multiply_mod(&multiply_mod(a, &three_inv, n), &b_inv, n)),
        n,
    );
    let v = b_inv.clone();
    let three_inv_b_inv = multiply_mod(&three_inv, &b_inv, n);
    let wa = multiply_mod(
        &subtract_mod(&Integer::from(3), &pow_mod(a, 2, n), n),
        &multiply_mod(&three_inv_b_inv, &b_inv, n),
        n,
    );
    let a_cubed = pow_mod(a, 3, n);
    let numer_b = take_mod(&(Integer::from(2) * &a_cubed - Integer::from(9) * a), n);
    let wb = multiply_mod(&numer_b, &pow_mod(&three_inv_b_inv, 3, n), n);
    Ok((Point::Affine(t, v), WeierstrassCurve { a: wa, b: wb, n: n.clone() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::modular_arithmetic::take_mod as tm;

    #[test]
    fn rejects_bad_sigma() {
        let n = Integer::from(1_000_003u64);
        assert!(get_curve_suyama(&Integer::from(5), &n).is_err());
        assert!(get_curve_suyama(&Integer::from(1), &n).is_err());
    }

    #[test]
    fn suyama_point_lands_on_the_curve_in_xz_form() {
        let n = Integer::from(1_000_003u64); // prime, so inversions always succeed
        let (pt, curve) = get_curve_suyama(&Integer::from(17), &n).unwrap();
        // B*y^2 == x^3 + A*x^2 + x with y fixed to 1 after to_weierstrass;
        // here just sanity check the point survives the gcd(z,n)=1 gate.
        let checked = check(pt.clone(), &tm(&pt.z, &n), &n);
        assert!(checked.is_ok());
        let _ = curve;
    }

    #[test]
    fn to_weierstrass_produces_a_point_on_its_curve() {
        let n = Integer::from(1_000_003u64);
        let (pt, curve) = get_curve_suyama(&Integer::from(17), &n).unwrap();
        let (point, wcurve) = to_weierstrass(&pt, &curve).unwrap();
        if let Point::Affine(x, y) = point {
            let lhs = pow_mod(&y, 2, &n);
            let rhs = tm(&(pow_mod(&x, 3, &n) + &wcurve.a * &x + &wcurve.b), &n);
            assert_eq!(lhs, rhs);
        } else {
            panic!("expected affine point");
        }
    }
}
