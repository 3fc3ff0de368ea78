//! Arithmetic in the secp256k1 base field, `p = 2^256 - 2^32 - 977`.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};

use crate::arith::{self, Limbs};
use crate::error::{Result, ZkpError};

/// The field prime p.
const MODULUS: Limbs = [
    0xFFFF_FFFE_FFFF_FC2F,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `2^256 - p`
const COMPLEMENT: [u64; 3] = [0x1_0000_03D1, 0, 0];

/// `p - 2`, the inversion exponent.
const P_MINUS_TWO: Limbs = [
    0xFFFF_FFFE_FFFF_FC2D,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `(p + 1) / 4`, the square-root exponent (p ≡ 3 mod 4).
const SQRT_EXPONENT: Limbs = [
    0xFFFF_FFFF_BFFF_FF0C,
    0xFFFF_FFFF_FFFF_FFFF,
    0xFFFF_FFFF_FFFF_FFFF,
    0x3FFF_FFFF_FFFF_FFFF,
];

/// An element of GF(p), always held in canonical form `[0, p)`.
#[derive(Clone, Copy, Default)]
pub struct FieldElement(Limbs);

impl FieldElement {
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    pub const ONE: Self = Self([1, 0, 0, 0]);

    /// Builds an element from a small constant.
    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    /// Builds an element from little-endian limbs known to be below p.
    pub(crate) const fn from_limbs_unchecked(limbs: Limbs) -> Self {
        Self(limbs)
    }

    /// Decodes a 32-byte big-endian value, rejecting values `>= p`.
    pub fn from_bytes(bytes: &[u8; 32]) -> CtOption<Self> {
        let limbs = arith::from_be_bytes(bytes);
        CtOption::new(Self(limbs), arith::ct_lt(&limbs, &MODULUS))
    }

    /// Big-endian encoding of the canonical value.
    pub fn to_bytes(&self) -> [u8; 32] {
        arith::to_be_bytes(&self.0)
    }

    pub fn is_zero(&self) -> Choice {
        arith::is_zero(&self.0)
    }

    pub fn is_odd(&self) -> Choice {
        Choice::from((self.0[0] & 1) as u8)
    }

    pub fn square(&self) -> Self {
        *self * *self
    }

    /// `self * 2`
    pub fn double(&self) -> Self {
        *self + *self
    }

    /// Raises to a public exponent. Branches only on exponent bits.
    fn pow_vartime(&self, exp: &Limbs) -> Self {
        let mut acc = Self::ONE;
        for limb in exp.iter().rev() {
            for bit in (0..64).rev() {
                acc = acc.square();
                if (limb >> bit) & 1 == 1 {
                    acc = acc * *self;
                }
            }
        }
        acc
    }

    /// Multiplicative inverse via Fermat's little theorem.
    pub fn invert(&self) -> Result<Self> {
        let inv = self.pow_vartime(&P_MINUS_TWO);
        if bool::from(self.is_zero()) {
            return Err(ZkpError::ArithmeticError(
                "inversion of zero field element".into(),
            ));
        }
        Ok(inv)
    }

    /// Square root, when one exists. The returned root has unspecified parity.
    pub fn sqrt(&self) -> CtOption<Self> {
        let root = self.pow_vartime(&SQRT_EXPONENT);
        CtOption::new(root, root.square().ct_eq(self))
    }
}

impl Add for FieldElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(arith::add_mod(&self.0, &rhs.0, &MODULUS))
    }
}

impl Sub for FieldElement {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(arith::sub_mod(&self.0, &rhs.0, &MODULUS))
    }
}

impl Mul for FieldElement {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let wide = arith::mul_wide(&self.0, &rhs.0);
        Self(arith::reduce_wide(&wide, &MODULUS, &COMPLEMENT))
    }
}

impl Neg for FieldElement {
    type Output = Self;

    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl ConstantTimeEq for FieldElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for FieldElement {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for FieldElement {}

impl ConditionallySelectable for FieldElement {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(arith::select(&a.0, &b.0, choice))
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", hex::encode(self.to_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(hex_str: &str) -> FieldElement {
        let bytes: [u8; 32] = hex::decode(hex_str).unwrap().try_into().unwrap();
        FieldElement::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn test_modulus_is_rejected() {
        let p = arith::to_be_bytes(&MODULUS);
        assert!(bool::from(FieldElement::from_bytes(&p).is_none()));
    }

    #[test]
    fn test_add_sub_neg() {
        let p_minus_one = fe("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2e");
        assert_eq!(p_minus_one + FieldElement::ONE, FieldElement::ZERO);
        assert_eq!(-FieldElement::ONE, p_minus_one);
        assert_eq!(-FieldElement::ZERO, FieldElement::ZERO);
        assert_eq!(FieldElement::ZERO - FieldElement::ONE, p_minus_one);
    }

    #[test]
    fn test_mul_and_invert() {
        let two = FieldElement::from_u64(2);
        let half = two.invert().unwrap();
        assert_eq!(half * two, FieldElement::ONE);

        // (p - 1)^2 = 1
        let minus_one = -FieldElement::ONE;
        assert_eq!(minus_one * minus_one, FieldElement::ONE);
    }

    #[test]
    fn test_invert_zero_fails() {
        assert!(matches!(
            FieldElement::ZERO.invert(),
            Err(ZkpError::ArithmeticError(_))
        ));
    }

    #[test]
    fn test_sqrt() {
        let four = FieldElement::from_u64(4);
        let root = four.sqrt().unwrap();
        assert_eq!(root.square(), four);

        // -1 is a non-residue because p ≡ 3 (mod 4)
        assert!(bool::from((-FieldElement::ONE).sqrt().is_none()));
    }

    #[test]
    fn test_byte_round_trip() {
        let x = fe("79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        assert_eq!(
            hex::encode(x.to_bytes()),
            "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert!(!bool::from(x.is_odd()));
    }
}
