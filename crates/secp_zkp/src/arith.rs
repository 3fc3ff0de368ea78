//! 256-bit limb arithmetic shared by the field and scalar types.
//!
//! Values are four little-endian `u64` limbs. Every routine runs a fixed
//! number of limb operations regardless of the operand values.

use subtle::{Choice, ConditionallySelectable};

pub(crate) type Limbs = [u64; 4];

/// `a + b + carry`, returning `(sum, carry)`.
#[inline(always)]
pub(crate) const fn adc(a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (a as u128) + (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

/// `a - b - borrow`, returning `(difference, borrow)` with borrow in {0, 1}.
#[inline(always)]
pub(crate) const fn sbb(a: u64, b: u64, borrow: u64) -> (u64, u64) {
    let t = (a as u128).wrapping_sub((b as u128) + (borrow as u128));
    (t as u64, (t >> 127) as u64)
}

/// `acc + a * b + carry`, returning `(low, high)`.
#[inline(always)]
pub(crate) const fn mac(acc: u64, a: u64, b: u64, carry: u64) -> (u64, u64) {
    let t = (acc as u128) + (a as u128) * (b as u128) + (carry as u128);
    (t as u64, (t >> 64) as u64)
}

pub(crate) fn add(a: &Limbs, b: &Limbs) -> (Limbs, u64) {
    let mut out = [0u64; 4];
    let mut carry = 0;
    for i in 0..4 {
        let (s, c) = adc(a[i], b[i], carry);
        out[i] = s;
        carry = c;
    }
    (out, carry)
}

pub(crate) fn sub(a: &Limbs, b: &Limbs) -> (Limbs, u64) {
    let mut out = [0u64; 4];
    let mut borrow = 0;
    for i in 0..4 {
        let (d, br) = sbb(a[i], b[i], borrow);
        out[i] = d;
        borrow = br;
    }
    (out, borrow)
}

pub(crate) fn select(a: &Limbs, b: &Limbs, choice: Choice) -> Limbs {
    let mut out = [0u64; 4];
    for i in 0..4 {
        out[i] = u64::conditional_select(&a[i], &b[i], choice);
    }
    out
}

/// `a < b` without branching.
pub(crate) fn ct_lt(a: &Limbs, b: &Limbs) -> Choice {
    let (_, borrow) = sub(a, b);
    Choice::from(borrow as u8)
}

pub(crate) fn is_zero(a: &Limbs) -> Choice {
    let folded = a[0] | a[1] | a[2] | a[3];
    // (x | -x) has its top bit set exactly when x != 0
    let nonzero = (folded | folded.wrapping_neg()) >> 63;
    Choice::from((nonzero ^ 1) as u8)
}

/// `(a + b) mod m` for `a, b < m`.
pub(crate) fn add_mod(a: &Limbs, b: &Limbs, m: &Limbs) -> Limbs {
    let (sum, carry) = add(a, b);
    let (reduced, borrow) = sub(&sum, m);
    let use_reduced = Choice::from((carry | (borrow ^ 1)) as u8);
    select(&sum, &reduced, use_reduced)
}

/// `(a - b) mod m` for `a, b < m`.
pub(crate) fn sub_mod(a: &Limbs, b: &Limbs, m: &Limbs) -> Limbs {
    let (diff, borrow) = sub(a, b);
    let (wrapped, _) = add(&diff, m);
    select(&diff, &wrapped, Choice::from(borrow as u8))
}

/// Reduces a value below `2^256` into `[0, m)` given `m > 2^255`.
pub(crate) fn reduce_once(a: &Limbs, m: &Limbs) -> Limbs {
    let (reduced, borrow) = sub(a, m);
    select(&reduced, a, Choice::from(borrow as u8))
}

/// Schoolbook 256x256 -> 512-bit product.
pub(crate) fn mul_wide(a: &Limbs, b: &Limbs) -> [u64; 8] {
    let mut w = [0u64; 8];
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..4 {
            let (lo, hi) = mac(w[i + j], a[i], b[j], carry);
            w[i + j] = lo;
            carry = hi;
        }
        w[i + 4] = carry;
    }
    w
}

/// One folding step: `lo + hi * c` where `2^256 ≡ c (mod m)`.
fn fold(w: &[u64; 8], c: &[u64; 3]) -> [u64; 8] {
    let mut out = [0u64; 8];
    out[..4].copy_from_slice(&w[..4]);
    for i in 0..4 {
        let mut carry = 0;
        for j in 0..3 {
            let (lo, hi) = mac(out[i + j], w[4 + i], c[j], carry);
            out[i + j] = lo;
            carry = hi;
        }
        for limb in out.iter_mut().skip(i + 3) {
            let (s, c2) = adc(*limb, carry, 0);
            *limb = s;
            carry = c2;
        }
    }
    out
}

/// Reduces a 512-bit value modulo `m = 2^256 - c`, where `c < 2^130`.
///
/// Four folds always bring the value below `2^256`; a final conditional
/// subtraction makes it canonical.
pub(crate) fn reduce_wide(w: &[u64; 8], m: &Limbs, c: &[u64; 3]) -> Limbs {
    let mut acc = *w;
    for _ in 0..4 {
        acc = fold(&acc, c);
    }
    debug_assert!(acc[4..].iter().all(|&limb| limb == 0));
    let lo = [acc[0], acc[1], acc[2], acc[3]];
    reduce_once(&lo, m)
}

pub(crate) fn from_be_bytes(bytes: &[u8; 32]) -> Limbs {
    let mut out = [0u64; 4];
    for (i, limb) in out.iter_mut().enumerate() {
        let start = 24 - i * 8;
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&bytes[start..start + 8]);
        *limb = u64::from_be_bytes(chunk);
    }
    out
}

pub(crate) fn to_be_bytes(limbs: &Limbs) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (i, limb) in limbs.iter().enumerate() {
        let start = 24 - i * 8;
        out[start..start + 8].copy_from_slice(&limb.to_be_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: Limbs = [
        0xFFFF_FFFE_FFFF_FC2F,
        0xFFFF_FFFF_FFFF_FFFF,
        0xFFFF_FFFF_FFFF_FFFF,
        0xFFFF_FFFF_FFFF_FFFF,
    ];
    const C_P: [u64; 3] = [0x1_0000_03D1, 0, 0];

    #[test]
    fn test_byte_round_trip() {
        let mut bytes = [0u8; 32];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        let limbs = from_be_bytes(&bytes);
        assert_eq!(limbs[3] >> 56, 0x00);
        assert_eq!(limbs[0] & 0xff, 31);
        assert_eq!(to_be_bytes(&limbs), bytes);
    }

    #[test]
    fn test_add_mod_wraps() {
        let p_minus_one = [P[0] - 1, P[1], P[2], P[3]];
        let one = [1, 0, 0, 0];
        assert_eq!(add_mod(&p_minus_one, &one, &P), [0, 0, 0, 0]);
        assert_eq!(sub_mod(&[0, 0, 0, 0], &one, &P), p_minus_one);
    }

    #[test]
    fn test_reduce_wide_of_modulus_squared_is_zero() {
        let w = mul_wide(&P, &[2, 0, 0, 0]);
        assert_eq!(reduce_wide(&w, &P, &C_P), [0, 0, 0, 0]);
    }

    #[test]
    fn test_reduce_wide_max_input() {
        // (2^256 - 1)^2 mod p, checked against (c - 1)^2 where 2^256 - 1 ≡ c - 1
        let max = [u64::MAX; 4];
        let w = mul_wide(&max, &max);
        let c_minus_one = [C_P[0] - 1, 0, 0, 0];
        let expected = reduce_wide(&mul_wide(&c_minus_one, &c_minus_one), &P, &C_P);
        assert_eq!(reduce_wide(&w, &P, &C_P), expected);
    }

    #[test]
    fn test_is_zero_and_lt() {
        assert!(bool::from(is_zero(&[0, 0, 0, 0])));
        assert!(!bool::from(is_zero(&[0, 0, 1, 0])));
        assert!(bool::from(ct_lt(&[5, 0, 0, 0], &P)));
        assert!(!bool::from(ct_lt(&P, &P)));
    }
}
