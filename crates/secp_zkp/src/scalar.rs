//! Arithmetic modulo the secp256k1 group order n.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};

use crate::arith::{self, Limbs};
use crate::error::{Result, ZkpError};

/// The group order n.
const ORDER: Limbs = [
    0xBFD2_5E8C_D036_4141,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// `2^256 - n`
const COMPLEMENT: [u64; 3] = [0x402D_A173_2FC9_BEBF, 0x4551_2319_50B7_5FC4, 0x1];

/// `n - 2`, the inversion exponent.
const N_MINUS_TWO: Limbs = [
    0xBFD2_5E8C_D036_413F,
    0xBAAE_DCE6_AF48_A03B,
    0xFFFF_FFFF_FFFF_FFFE,
    0xFFFF_FFFF_FFFF_FFFF,
];

/// An integer modulo n, always in canonical form `[0, n)`.
#[derive(Clone, Copy, Default)]
pub struct Scalar(Limbs);

impl Scalar {
    pub const ZERO: Self = Self([0, 0, 0, 0]);
    pub const ONE: Self = Self([1, 0, 0, 0]);

    pub const fn from_u64(v: u64) -> Self {
        Self([v, 0, 0, 0])
    }

    /// Decodes a 32-byte big-endian value; `None` when it is `>= n`.
    pub fn from_bytes(bytes: &[u8; 32]) -> CtOption<Self> {
        let limbs = arith::from_be_bytes(bytes);
        CtOption::new(Self(limbs), arith::ct_lt(&limbs, &ORDER))
    }

    /// Like [`Scalar::from_bytes`] but reports overflow as `InvalidScalar`.
    pub fn from_bytes_checked(bytes: &[u8; 32], what: &str) -> Result<Self> {
        Option::<Self>::from(Self::from_bytes(bytes))
            .ok_or_else(|| ZkpError::InvalidScalar(format!("{what} is not below the group order")))
    }

    /// Decodes 32 bytes and reduces modulo n. Used for hash outputs.
    pub fn from_bytes_reduced(bytes: &[u8; 32]) -> Self {
        Self(arith::reduce_once(&arith::from_be_bytes(bytes), &ORDER))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        arith::to_be_bytes(&self.0)
    }

    pub fn is_zero(&self) -> Choice {
        arith::is_zero(&self.0)
    }

    /// 4-bit window `index`, counting from the least significant nibble.
    pub(crate) fn nibble(&self, index: usize) -> u8 {
        let limb = self.0[index / 16];
        ((limb >> ((index % 16) * 4)) & 0x0f) as u8
    }

    fn pow_vartime(&self, exp: &Limbs) -> Self {
        let mut acc = Self::ONE;
        for limb in exp.iter().rev() {
            for bit in (0..64).rev() {
                acc = acc * acc;
                if (limb >> bit) & 1 == 1 {
                    acc = acc * *self;
                }
            }
        }
        acc
    }

    /// Multiplicative inverse; inverting zero is an `ArithmeticError`.
    pub fn invert(&self) -> Result<Self> {
        let inv = self.pow_vartime(&N_MINUS_TWO);
        if bool::from(self.is_zero()) {
            return Err(ZkpError::ArithmeticError("inversion of zero scalar".into()));
        }
        Ok(inv)
    }
}

impl Add for Scalar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(arith::add_mod(&self.0, &rhs.0, &ORDER))
    }
}

impl Sub for Scalar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(arith::sub_mod(&self.0, &rhs.0, &ORDER))
    }
}

impl Mul for Scalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        let wide = arith::mul_wide(&self.0, &rhs.0);
        Self(arith::reduce_wide(&wide, &ORDER, &COMPLEMENT))
    }
}

impl Neg for Scalar {
    type Output = Self;

    fn neg(self) -> Self {
        Self::ZERO - self
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0[..].ct_eq(&other.0[..])
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Scalar {}

impl ConditionallySelectable for Scalar {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self(arith::select(&a.0, &b.0, choice))
    }
}

// Scalars are frequently secret, so Debug never prints the value.
impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Scalar(..)")
    }
}
