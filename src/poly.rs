//! Dense univariate polynomials over `Z/nZ`, used by the Brent-Suyama
//! polynomial-evaluation engine for stage 2.
//!
//! Multiplication uses Kronecker substitution: pack each operand's
//! coefficients into a single big integer (one fixed-width slot per
//! coefficient, wide enough that no product term can carry into its
//! neighbour), multiply the two packed integers once, then unpack.

use crate::arith::misc::bits_amount;
use crate::arith::modular_arithmetic::{inv, multiply_mod, take_mod};
use crate::error::InverseNotFound;
use rug::ops::Pow;
use rug::Integer;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polynomial {
    /// `coeff[i]` is the coefficient of `x^i`. Never empty; trailing zeros
    /// beyond the constant term are trimmed.
    pub coeff: Vec<Integer>,
    pub n: Integer,
}

fn trim(mut coeff: Vec<Integer>) -> Vec<Integer> {
    while coeff.len() > 1 && *coeff.last().unwrap() == 0 {
        coeff.pop();
    }
    coeff
}

impl Polynomial {
    pub fn new(coeff: Vec<Integer>, n: Integer) -> Self {
        let coeff = if coeff.is_empty() {
            vec![Integer::from(0)]
        } else {
            coeff
        };
        Polynomial { coeff: trim(coeff), n }
    }

    pub fn degree(&self) -> usize {
        self.coeff.len() - 1
    }

    /// Slice `coeff[range]` into a fresh polynomial (no modulus trimming of
    /// leading zeros needed since trailing-zero trimming only affects the
    /// top end).
    pub fn slice_from(&self, start: usize) -> Polynomial {
        if start >= self.coeff.len() {
            return Polynomial::new(vec![Integer::from(0)], self.n.clone());
        }
        Polynomial::new(self.coeff[start..].to_vec(), self.n.clone())
    }

    pub fn add(&self, other: &Polynomial) -> Polynomial {
        debug_assert_eq!(self.n, other.n);
        let len = self.coeff.len().max(other.coeff.len());
        let mut res = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.coeff.get(i);
            let b = other.coeff.get(i);
            let v = match (a, b) {
                (Some(a), Some(b)) => take_mod(&Integer::from(a + b), &self.n),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => unreachable!(),
            };
            res.push(v);
        }
        Polynomial::new(res, self.n.clone())
    }

    pub fn sub(&self, other: &Polynomial) -> Polynomial {
        debug_assert_eq!(self.n, other.n);
        let len = self.coeff.len().max(other.coeff.len());
        let mut res = Vec::with_capacity(len);
        for i in 0..len {
            let a = self.coeff.get(i);
            let b = other.coeff.get(i);
            let v = match (a, b) {
                (Some(a), Some(b)) => take_mod(&Integer::from(a - b), &self.n),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => take_mod(&Integer::from(&self.n - b), &self.n),
                (None, None) => unreachable!(),
            };
            res.push(v);
        }
        Polynomial::new(res, self.n.clone())
    }

    /// `self * other` via Kronecker substitution.
    pub fn mul(&self, other: &Polynomial) -> Polynomial {
        debug_assert_eq!(self.n, other.n);
        let d = self.coeff.len().max(other.coeff.len());
        let bound = Integer::from(d) * Integer::from(self.n.clone()).pow(2) + 1;
        let k = bits_amount(&bound).max(1) as u32;

        let pack = |coeff: &[Integer]| -> Integer {
            let mut acc = Integer::from(0);
            for (i, c) in coeff.iter().enumerate() {
                acc += Integer::from(c << (i as u32 * k));
            }
            acc
        };

        let packed_self = pack(&self.coeff);
        let packed_other = if self.coeff == other.coeff {
            packed_self.clone()
        } else {
            pack(&other.coeff)
        };
        let packed_res = Integer::from(&packed_self * &packed_other);

        let slots = self.coeff.len() + other.coeff.len() - 1;
        let mask = (Integer::from(1) << k) - 1;
        let mut res = Vec::with_capacity(slots);
        let mut rem = packed_res;
        for _ in 0..slots {
            let slot = Integer::from(&rem & &mask);
            res.push(take_mod(&slot, &self.n));
            rem >>= k;
        }
        Polynomial::new(res, self.n.clone())
    }

    /// `(quotient, remainder)` of `self / other`.
    pub fn div_rem(&self, other: &Polynomial) -> Result<(Polynomial, Polynomial), InverseNotFound> {
        let other_recip = other.recip()?;
        let (q, r) = self.div_rem_with_recip(other, &other_recip);
        Ok((q, r))
    }

    fn div_rem_with_recip(
        &self,
        other: &Polynomial,
        other_recip: &Polynomial,
    ) -> (Polynomial, Polynomial) {
        if self.coeff.len() < other.coeff.len() {
            return (
                Polynomial::new(vec![Integer::from(0)], self.n.clone()),
                self.clone(),
            );
        }
        let d = other.coeff.len() - 1;
        let mut quo = Polynomial::new(vec![Integer::from(0)], self.n.clone());
        let mut dividend = self.clone();
        loop {
            let quo_step = dividend.slice_from(d).mul(other_recip).slice_from(d);
            quo = quo.add(&quo_step);
            let rem = dividend.sub(&quo_step.mul(other));
            if rem.coeff.len() < other.coeff.len() || (rem.coeff.len() == 1 && rem.coeff[0] == 0) {
                return (quo, rem);
            }
            dividend = rem;
        }
    }

    /// `self % other`, given `other`'s precomputed reciprocal.
    pub fn mod_with_recip(&self, other: &Polynomial, other_recip: &Polynomial) -> Polynomial {
        self.div_rem_with_recip(other, other_recip).1
    }

    /// Montgomery's RECIP algorithm: for `f` of degree `d`, returns
    /// `floor(x^(2d) / f(x))`, used to turn polynomial division into
    /// multiplications.
    pub fn recip(&self) -> Result<Polynomial, InverseNotFound> {
        let d = self.degree();
        let inv_lead = inv(&self.coeff[d], &self.n)?;
        let mut r_curr = Polynomial::new(vec![inv_lead.clone()], self.n.clone());
        if d == 0 {
            // Degree-0 "polynomials" have no reciprocal expansion to run;
            // the constant term's inverse is the whole answer.
            return Ok(r_curr);
        }
        let mut e_curr = take_mod(
            &Integer::from(-Integer::from(&self.coeff[d - 1] * &inv_lead)),
            &self.n,
        );
        let mut k: usize = 2;
        while k < d * 2 {
            let r_prev = r_curr.clone();
            let slice: Vec<Integer> = (0..k)
                .map(|j| self.coeff.get(d - k + j + 1).cloned().unwrap_or_else(|| Integer::from(0)))
                .collect();
            let h = r_prev.mul(&r_prev).mul(&Polynomial::new(slice, self.n.clone()));

            let mut r_curr_coeff = vec![Integer::from(0); k / 2];
            for ai in &r_prev.coeff {
                r_curr_coeff.push(Integer::from(2 * ai.clone()));
            }
            for j in 0..k {
                let h_j = h.coeff.get(j + k - 2).cloned().unwrap_or_else(|| Integer::from(0));
                if j < r_curr_coeff.len() {
                    r_curr_coeff[j] = take_mod(&Integer::from(&r_curr_coeff[j] - &h_j), &self.n);
                }
            }
            r_curr = Polynomial::new(r_curr_coeff, self.n.clone());

            let e_prev = e_curr.clone();
            if k == 2 {
                e_curr = take_mod(
                    &Integer::from(
                        Integer::from(&e_prev * &e_prev)
                            - Integer::from(&self.coeff[d - k] * &inv_lead),
                    ),
                    &self.n,
                );
            } else if k <= d {
                let h_term = h.coeff.get(k - 3).cloned().unwrap_or_else(|| Integer::from(0));
                e_curr = take_mod(
                    &Integer::from(
                        Integer::from(&e_prev * &e_prev)
                            - multiply_mod(&h_term, &self.coeff[d], &self.n)
                            - Integer::from(&self.coeff[d - k] * &inv_lead),
                    ),
                    &self.n,
                );
            }
            k *= 2;
        }
        let mut res = r_curr;
        if k == d * 2 {
            res.coeff.insert(0, multiply_mod(&e_curr, &inv_lead, &self.n));
        }
        let keep_from = res.coeff.len().saturating_sub(d + 1);
        res.coeff.drain(0..keep_from);
        Ok(res)
    }

    /// Evaluate at `x` by Horner's method.
    pub fn eval(&self, x: &Integer) -> Integer {
        let mut acc = Integer::from(0);
        for c in self.coeff.iter().rev() {
            acc = multiply_mod(&acc, x, &self.n);
            acc = take_mod(&Integer::from(&acc + c), &self.n);
        }
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(coeff: &[i64], n: i64) -> Polynomial {
        Polynomial::new(coeff.iter().map(|&c| Integer::from(c)).collect(), Integer::from(n))
    }

    #[test]
    fn add_sub_trim_trailing_zeros() {
        let a = p(&[1, 2, 3], 101);
        let b = p(&[1, 2, 3], 101);
        let diff = a.sub(&b);
        assert_eq!(diff.coeff, vec![Integer::from(0)]);
    }

    #[test]
    fn mul_matches_schoolbook() {
        let n = Integer::from(10_007);
        let a = p(&[1, 1], 10_007); // 1 + x
        let b = p(&[1, -1], 10_007); // 1 - x, reduced mod n below
        let b = Polynomial::new(
            b.coeff.iter().map(|c| take_mod(c, &n)).collect(),
            n.clone(),
        );
        let prod = a.mul(&b); // (1+x)(1-x) = 1 - x^2
        assert_eq!(prod.coeff[0], Integer::from(1));
        assert_eq!(prod.coeff[1], Integer::from(0));
        assert_eq!(prod.coeff[2], take_mod(&Integer::from(-1), &n));
    }

    #[test]
    fn div_rem_reconstructs_dividend() {
        let n = Integer::from(10_007);
        let divisor = p(&[1, 0, 1], 10_007); // x^2 + 1, monic
        let dividend = p(&[5, 4, 3, 2, 1], 10_007); // x^4+2x^3+3x^2+4x+5
        let (quo, rem) = dividend.div_rem(&divisor).unwrap();
        let reconstructed = quo.mul(&divisor).add(&rem);
        let normalize = |p: &Polynomial| -> Vec<Integer> {
            p.coeff.iter().map(|c| take_mod(c, &n)).collect()
        };
        assert_eq!(normalize(&reconstructed), normalize(&dividend));
    }

    #[test]
    fn eval_matches_horner_by_hand() {
        let f = p(&[3, 2, 1], 10_007); // 1*x^2 + 2x + 3
        assert_eq!(f.eval(&Integer::from(5)), Integer::from(1 * 25 + 2 * 5 + 3));
    }
}
