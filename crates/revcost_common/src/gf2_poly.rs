//! Arithmetic on binary polynomials and the canonical moduli of GF(2^m).
//!
//! A polynomial over GF(2) is encoded as a `u128` mask where bit `i` holds the
//! coefficient of `x^i`. Field elements of GF(2^m) are polynomials of degree
//! below `m`, reduced modulo an irreducible polynomial of degree `m`.

/// Largest supported field degree.
pub const MAX_FIELD_DEGREE: u32 = 64;

/// Returns the degree of a non-zero polynomial.
pub fn degree(poly: u128) -> Option<u32> {
    (poly != 0).then(|| 127 - poly.leading_zeros())
}

/// Reduces `a` modulo a non-zero `modulus`.
pub fn poly_mod(mut a: u128, modulus: u128) -> u128 {
    let Some(dm) = degree(modulus) else {
        return a;
    };
    while let Some(da) = degree(a) {
        if da < dm {
            break;
        }
        a ^= modulus << (da - dm);
    }
    a
}

/// Multiplies `a` and `b` modulo `modulus` (degree at most 64).
pub fn mul_mod(a: u128, mut b: u128, modulus: u128) -> u128 {
    let Some(m) = degree(modulus) else {
        return 0;
    };
    let mut a = poly_mod(a, modulus);
    let mut result = 0;
    while b != 0 {
        if b & 1 == 1 {
            result ^= a;
        }
        b >>= 1;
        a <<= 1;
        if (a >> m) & 1 == 1 {
            a ^= modulus;
        }
    }
    result
}

/// Greatest common divisor of two binary polynomials.
pub fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = poly_mod(a, b);
        a = b;
        b = r;
    }
    a
}

/// Ben-Or irreducibility test for a polynomial of degree at most 64.
pub fn is_irreducible(poly: u128) -> bool {
    let Some(m) = degree(poly) else {
        return false;
    };
    if m == 0 || m > MAX_FIELD_DEGREE {
        return false;
    }
    const X: u128 = 0b10;
    let mut h = X;
    for _ in 1..=m / 2 {
        h = mul_mod(h, h, poly);
        if gcd(poly, h ^ X) != 1 {
            return false;
        }
    }
    true
}

/// Returns the canonical irreducible polynomial of degree `m`.
///
/// The canonical choice is the irreducible polynomial of lowest weight; among
/// those, the one with the smallest integer encoding. This yields `x + 1`,
/// `x^4 + x + 1` and `x^8 + x^4 + x^3 + x + 1` for degrees 1, 4 and 8.
/// Returns `None` for `m == 0` or `m > MAX_FIELD_DEGREE`.
pub fn canonical_polynomial(m: u32) -> Option<u128> {
    if m == 0 || m > MAX_FIELD_DEGREE {
        return None;
    }
    let top = 1u128 << m;
    if m == 1 {
        return Some(top | 1);
    }
    if let Some(p) = (1..m)
        .map(|k| top | (1 << k) | 1)
        .find(|&p| is_irreducible(p))
    {
        return Some(p);
    }
    for k3 in 3..m {
        for k2 in 2..k3 {
            for k1 in 1..k2 {
                let p = top | (1 << k3) | (1 << k2) | (1 << k1) | 1;
                if is_irreducible(p) {
                    return Some(p);
                }
            }
        }
    }
    None
}

/// Formats a polynomial in descending powers, e.g. `x^4 + x + 1`.
pub fn format_polynomial(poly: u128) -> String {
    if poly == 0 {
        return "0".to_string();
    }
    (0..128u32)
        .rev()
        .filter(|&i| (poly >> i) & 1 == 1)
        .map(|i| match i {
            0 => "1".to_string(),
            1 => "x".to_string(),
            _ => format!("x^{i}"),
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees() {
        assert_eq!(degree(0), None);
        assert_eq!(degree(1), Some(0));
        assert_eq!(degree(0b10011), Some(4));
    }

    #[test]
    fn small_canonical_polynomials() {
        assert_eq!(canonical_polynomial(1), Some(0b11));
        assert_eq!(canonical_polynomial(2), Some(0b111));
        assert_eq!(canonical_polynomial(3), Some(0b1011));
        assert_eq!(canonical_polynomial(4), Some(0b10011));
        assert_eq!(canonical_polynomial(8), Some(0x11b));
        assert_eq!(canonical_polynomial(64), Some((1u128 << 64) | 0x1b));
    }

    #[test]
    fn out_of_range_degrees() {
        assert_eq!(canonical_polynomial(0), None);
        assert_eq!(canonical_polynomial(65), None);
    }

    #[test]
    fn every_canonical_polynomial_is_irreducible() {
        for m in 1..=MAX_FIELD_DEGREE {
            let p = canonical_polynomial(m).unwrap();
            assert_eq!(degree(p), Some(m));
            assert!(is_irreducible(p), "degree {m}");
        }
    }

    #[test]
    fn reducible_polynomials_rejected() {
        // x^2 + 1 = (x + 1)^2
        assert!(!is_irreducible(0b101));
        // x^4 + x^2 + 1 = (x^2 + x + 1)^2
        assert!(!is_irreducible(0b10101));
        assert!(!is_irreducible(0));
        assert!(!is_irreducible(1));
    }

    #[test]
    fn gf16_multiplication() {
        let p = 0b10011;
        // x * x^3 = x^4 = x + 1
        assert_eq!(mul_mod(0b0010, 0b1000, p), 0b0011);
        // every non-zero element has an inverse
        for a in 1..16u128 {
            assert!((1..16u128).any(|b| mul_mod(a, b, p) == 1), "no inverse for {a}");
        }
    }

    #[test]
    fn gcd_of_shared_factor() {
        // (x + 1)(x^2 + x + 1) = x^3 + 1
        assert_eq!(gcd(0b1001, 0b111), 0b111);
        assert_eq!(gcd(0b1001, 0b10011), 1);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_polynomial(0b10011), "x^4 + x + 1");
        assert_eq!(format_polynomial(0), "0");
        assert_eq!(format_polynomial(0b10), "x");
    }
}
