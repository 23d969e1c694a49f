//! Product tree, reciprocal tree and remainder tree over lists of
//! polynomials, letting the polyeval stage-2 engine evaluate `H(x)` at many
//! points in `O(M(d) log d)` instead of one division per point.
//!
//! Every tree is a complete binary tree stored flat: node `i`'s children are
//! at `2*i+1` and `2*i+2`, root at `0`. Grounded on
//! `original_source/wheel_sieve/ecm/ecm_polyeval.py`.

use crate::arith::modular_arithmetic::multiply_mod;
use crate::error::InverseNotFound;
use crate::poly::Polynomial;
use rug::Integer;

/// Multiply `poly_list` into a product tree, padding unused leaves (when
/// `poly_list.len()` isn't a power of two) with the constant polynomial `1`.
pub fn product_tree(poly_list: &[Polynomial], n: &Integer) -> Vec<Polynomial> {
    let leaves = poly_list.len().max(1).next_power_of_two();
    let one = Polynomial::new(vec![Integer::from(1)], n.clone());
    let mut tree = vec![one; 2 * leaves - 1];
    for (i, p) in poly_list.iter().enumerate() {
        tree[leaves - 1 + i] = p.clone();
    }
    let mut k = leaves;
    while k > 1 {
        for i in (k / 2 - 1)..(k - 1) {
            tree[i] = tree[2 * i + 1].mul(&tree[2 * i + 2]);
        }
        k /= 2;
    }
    tree
}

/// The reciprocal of every node of a product tree, computed top-down: a
/// child's reciprocal is derived from its parent's via one polynomial
/// multiply and slice, rather than a fresh [`Polynomial::recip`] call.
pub fn recip_tree(prod_tree: &[Polynomial]) -> Result<Vec<Polynomial>, InverseNotFound> {
    let mut r_tree = vec![prod_tree[0].recip()?];
    for i in 0..prod_tree.len() / 2 {
        let gi_recip = r_tree[i].clone();
        let g1 = &prod_tree[2 * i + 1];
        let g2 = &prod_tree[2 * i + 2];
        let d1 = g1.degree();
        let d2 = g2.degree();
        r_tree.push(gi_recip.slice_from(d2).mul(g2).slice_from(d2));
        r_tree.push(gi_recip.slice_from(d1).mul(g1).slice_from(d1));
    }
    Ok(r_tree)
}

/// Given `f` and a product tree of degree-1 polynomials `g_i(x) = x - x_i`,
/// compute `prod_i f(x_i) mod n` while avoiding an exact-zero product term
/// (substituting `1` for any `f(x_i) == 0`, so a factor found downstream can
/// still be traced to the offending `x_i`).
pub fn remainder_tree(
    f: &Polynomial,
    g_tree: &[Polynomial],
    g_recip_tree: &[Polynomial],
    n: &Integer,
) -> Vec<Integer> {
    let mut f_mod_g_tree: Vec<Polynomial> = Vec::with_capacity(g_tree.len());
    for i in 0..g_tree.len() {
        let parent_rem = if i == 0 {
            f.clone()
        } else {
            f_mod_g_tree[(i - 1) / 2].clone()
        };
        f_mod_g_tree.push(parent_rem.mod_with_recip(&g_tree[i], &g_recip_tree[i]));
    }

    let leaves = (f_mod_g_tree.len() + 1) / 2;
    let mut ints = vec![Integer::from(0); f_mod_g_tree.len()];
    for i in (leaves - 1)..(2 * leaves - 1) {
        let c = f_mod_g_tree[i].coeff[0].clone();
        ints[i] = if c == 0 { Integer::from(1) } else { c };
    }
    let mut k = leaves;
    while k > 1 {
        for i in (k / 2 - 1)..(k - 1) {
            ints[i] = multiply_mod(&ints[2 * i + 1], &ints[2 * i + 2], n);
        }
        k /= 2;
    }
    ints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::modular_arithmetic::take_mod;

    fn p(coeff: &[i64], n: &Integer) -> Polynomial {
        Polynomial::new(coeff.iter().map(|&c| Integer::from(c)).collect(), n.clone())
    }

    fn leaf_for(x: i64, n: &Integer) -> Polynomial {
        // g(t) = t - x
        Polynomial::new(vec![take_mod(&Integer::from(-x), n), Integer::from(1)], n.clone())
    }

    fn leaves_start(count: usize) -> usize {
        count.max(1).next_power_of_two() - 1
    }

    #[test]
    fn remainder_tree_matches_direct_evaluation() {
        let n = Integer::from(10_007);
        // f(x) = x^3 + 2x + 1
        let f = p(&[1, 2, 0, 1], &n);
        let xs = [2i64, 5, 11, 101];
        let leaves: Vec<Polynomial> = xs.iter().map(|&x| leaf_for(x, &n)).collect();
        let g_tree = product_tree(&leaves, &n);
        let g_recip_tree = recip_tree(&g_tree).unwrap();
        let rem_tree = remainder_tree(&f, &g_tree, &g_recip_tree, &n);

        for (i, &x) in xs.iter().enumerate() {
            let expected = f.eval(&Integer::from(x));
            assert_eq!(rem_tree[leaves_start(xs.len()) + i], expected);
        }
    }

    #[test]
    fn product_of_remainders_matches_root() {
        let n = Integer::from(10_007);
        let f = p(&[7, 1], &n); // f(x) = x + 7
        let xs = [1i64, 2, 3];
        let leaves: Vec<Polynomial> = xs.iter().map(|&x| leaf_for(x, &n)).collect();
        let g_tree = product_tree(&leaves, &n);
        let g_recip_tree = recip_tree(&g_tree).unwrap();
        let rem_tree = remainder_tree(&f, &g_tree, &g_recip_tree, &n);
        let expected = take_mod(
            &(f.eval(&Integer::from(1)) * f.eval(&Integer::from(2)) * f.eval(&Integer::from(3))),
            &n,
        );
        assert_eq!(rem_tree[0], expected);
    }
}
