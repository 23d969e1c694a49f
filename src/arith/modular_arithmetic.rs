use crate::error::InverseNotFound;
use rug::ops::Pow;
use rug::Integer;

pub fn div_mod(a: &Integer, modulo: &Integer) -> (Integer, Integer) {
    <(Integer, Integer)>::from(a.div_rem_ref(modulo))
}

pub fn take_mod(a: &Integer, modulo: &Integer) -> Integer {
    // The second element of the tuple is the remainder of the division of a by n
    let rem = div_mod(&a, &modulo).1;
    // Return positive remainder
    if rem < 0 {
        rem + modulo
    } else {
        rem
    }
}

pub fn multiply_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a * b), modulo)
}

pub fn add_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a + b), modulo)
}

pub fn subtract_mod(a: &Integer, b: &Integer, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a - b), modulo)
}

/// Kept for the engine code ported close to verbatim from the teacher crate;
/// prefer [`inv`] in new code, which surfaces the failing residue.
pub fn invert_mod(a: &Integer, modulo: &Integer) -> Option<Integer> {
    a.invert_ref(modulo).and_then(|b| Some(Integer::from(b)))
}

pub fn pow_mod(a: &Integer, n: u32, modulo: &Integer) -> Integer {
    take_mod(&Integer::from(a).pow(n), modulo)
}

/// `gcd(a, b)`, always non-negative.
pub fn gcd(a: &Integer, b: &Integer) -> Integer {
    Integer::from(a.clone()).gcd(b)
}

/// Extended-Euclidean modular inverse. Returns the unique `y in [0, n)` with
/// `x * y == 1 (mod n)`.
///
/// # Errors
/// Returns [`InverseNotFound`] when `gcd(x, n) > 1`; the caller can recover a
/// factor of `n` via [`InverseNotFound::gcd_factor`].
pub fn inv(x: &Integer, n: &Integer) -> Result<Integer, InverseNotFound> {
    let reduced = take_mod(x, n);
    match reduced.invert(n) {
        Ok(y) => {
            debug_assert_eq!(multiply_mod(&y, &take_mod(x, n), n), Integer::from(1));
            Ok(y)
        }
        Err(orig) => Err(InverseNotFound::new(orig, n.clone())),
    }
}

/// Montgomery's batch-inversion trick: invert every element of `xs` modulo
/// `n` using a single modular inversion and `O(len(xs))` modular
/// multiplications, instead of `len(xs)` modular inversions.
///
/// The result is positionally aligned with `xs` (`result[i] == inv(xs[i], n)`).
///
/// # Errors
/// If any element of `xs` is not invertible mod `n`, returns the
/// [`InverseNotFound`] for one such element (any one is a valid witness: its
/// `x` satisfies `gcd(x, n) > 1`).
pub fn inv_multi(xs: &[Integer], n: &Integer) -> Result<Vec<Integer>, InverseNotFound> {
    let d = xs.len();
    if d == 0 {
        return Ok(Vec::new());
    }
    if d == 1 {
        return Ok(vec![inv(&xs[0], n)?]);
    }

    // Build a complete binary tree over the (power-of-two padded) leaves,
    // where each internal node holds the product of its children mod n.
    let k = d.next_power_of_two();
    let mut tree: Vec<Integer> = vec![Integer::from(1); 2 * k - 1];
    for (i, x) in xs.iter().enumerate() {
        tree[k - 1 + i] = take_mod(x, n);
    }
    let mut level = k;
    while level > 1 {
        for i in (level / 2 - 1)..(level - 1) {
            tree[i] = multiply_mod(&tree[2 * i + 1], &tree[2 * i + 2], n);
        }
        level /= 2;
    }

    // Invert the root once, then fan the inverse back down the tree,
    // multiplying by the sibling product at each step.
    let root_inv = inv(&tree[0], n)?;
    tree[0] = root_inv;
    let mut level = 2;
    while level < d {
        for i in (level / 2 - 1)..(level - 1) {
            let parent_inv = tree[i].clone();
            let left = tree[2 * i + 1].clone();
            let right = tree[2 * i + 2].clone();
            tree[2 * i + 1] = multiply_mod(&parent_inv, &right, n);
            tree[2 * i + 2] = multiply_mod(&parent_inv, &left, n);
        }
        level *= 2;
    }

    let mut result = Vec::with_capacity(d);
    for i in 0..d {
        let node = k - 1 + i;
        let inv_x = if node % 2 == 1 {
            multiply_mod(&tree[(node - 1) / 2], &tree[node + 1], n)
        } else {
            multiply_mod(&tree[(node - 1) / 2], &tree[node - 1], n)
        };
        result.push(inv_x);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inv_matches_definition() {
        let n = Integer::from(101);
        for x in 1..101 {
            let x = Integer::from(x);
            if gcd(&x, &n) == 1 {
                let y = inv(&x, &n).unwrap();
                assert_eq!(multiply_mod(&x, &y, &n), Integer::from(1));
            } else {
                assert!(inv(&x, &n).is_err());
            }
        }
    }

    #[test]
    fn inv_multi_matches_inv_elementwise() {
        let n = Integer::from(101);
        let xs: Vec<Integer> = (1..30).map(Integer::from).collect();
        let batched = inv_multi(&xs, &n).unwrap();
        for (x, inv_x) in xs.iter().zip(batched.iter()) {
            assert_eq!(inv(x, &n).unwrap(), *inv_x);
        }
    }

    #[test]
    fn inv_multi_surfaces_noninvertible_element() {
        let n = Integer::from(91); // 7 * 13
        let xs = vec![Integer::from(3), Integer::from(14), Integer::from(5)];
        let err = inv_multi(&xs, &n).unwrap_err();
        assert!(gcd(&err.x, &n) > 1);
    }

    #[test]
    fn gcd_is_commutative_and_nonnegative() {
        let a = Integer::from(-54);
        let b = Integer::from(24);
        assert_eq!(gcd(&a, &b), gcd(&b, &a));
        assert!(gcd(&a, &b) >= 0);
    }
}
