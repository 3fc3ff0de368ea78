//! Group operations on secp256k1, `y^2 = x^3 + 7`.
//!
//! Points are kept in homogeneous projective coordinates `(X : Y : Z)` and
//! combined with the complete addition and doubling formulas of
//! Renes, Costello and Batina ("Complete addition formulas for prime order
//! elliptic curves", 2016, algorithms 7 and 9 for `a = 0`). The formulas have
//! no exceptional cases, so adding the identity, a point to itself or a point
//! to its negation takes the same code path as any other addition.

use std::ops::{Add, Mul, Neg, Sub};

use subtle::{Choice, ConditionallySelectable, ConstantTimeEq, CtOption};

use crate::error::{Result, ZkpError};
use crate::field::FieldElement;
use crate::scalar::Scalar;

/// Curve constant b.
const CURVE_B: FieldElement = FieldElement::from_u64(7);

/// `3 * b`, used by the complete formulas.
const CURVE_B3: FieldElement = FieldElement::from_u64(21);

/// Size of a compressed point encoding.
pub const COMPRESSED_SIZE: usize = 33;

/// Size of an uncompressed point encoding.
pub const UNCOMPRESSED_SIZE: usize = 65;

/// The standard secp256k1 base point G.
pub const GENERATOR_G: AffinePoint = AffinePoint {
    x: FieldElement::from_limbs_unchecked([
        0x59F2_815B_16F8_1798,
        0x029B_FCDB_2DCE_28D9,
        0x55A0_6295_CE87_0B07,
        0x79BE_667E_F9DC_BBAC,
    ]),
    y: FieldElement::from_limbs_unchecked([
        0x9C47_D08F_FB10_D4B8,
        0xFD17_B448_A685_5419,
        0x5DA4_FBFC_0E11_08A8,
        0x483A_DA77_26A3_C465,
    ]),
};

/// The Pedersen blinding base H.
///
/// Its x-coordinate is SHA-256 of the uncompressed encoding of G, so nobody
/// knows `log_G(H)`. This is the same point Elements and secp256k1-zkp use
/// for value commitments.
pub const GENERATOR_H: AffinePoint = AffinePoint {
    x: FieldElement::from_limbs_unchecked([
        0x47BF_EE9A_CE80_3AC0,
        0x078A_5A0F_28EC_96D5,
        0xB78B_4B60_35E9_7A5E,
        0x5092_9B74_C1A0_4954,
    ]),
    y: FieldElement::from_limbs_unchecked([
        0xC30C_2313_F3A3_8904,
        0x36DA_C28A_F176_6968,
        0x049E_637C_B1B5_F40A,
        0x31D3_C686_3973_926E,
    ]),
};

/// A non-identity point in affine coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    x: FieldElement,
    y: FieldElement,
}

impl AffinePoint {
    pub fn x(&self) -> FieldElement {
        self.x
    }

    pub fn y(&self) -> FieldElement {
        self.y
    }

    fn is_on_curve(x: &FieldElement, y: &FieldElement) -> Choice {
        let rhs = x.square() * *x + CURVE_B;
        y.square().ct_eq(&rhs)
    }

    /// Recovers the point with the given x-coordinate and y parity.
    pub fn decompress(x: &FieldElement, y_is_odd: Choice) -> CtOption<Self> {
        let rhs = x.square() * *x + CURVE_B;
        rhs.sqrt().map(|y| {
            let flip = y.is_odd() ^ y_is_odd;
            let y = FieldElement::conditional_select(&y, &-y, flip);
            Self { x: *x, y }
        })
    }

    /// Parses a 33-byte compressed or 65-byte uncompressed encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let coordinate = |slice: &[u8]| -> Result<FieldElement> {
            let arr: [u8; 32] = slice
                .try_into()
                .map_err(|_| ZkpError::InvalidEncoding("coordinate must be 32 bytes".into()))?;
            Option::from(FieldElement::from_bytes(&arr))
                .ok_or_else(|| ZkpError::InvalidEncoding("coordinate is not below p".into()))
        };

        match (bytes.len(), bytes.first()) {
            (COMPRESSED_SIZE, Some(&prefix @ (0x02 | 0x03))) => {
                let x = coordinate(&bytes[1..])?;
                Option::from(Self::decompress(&x, Choice::from(prefix & 1)))
                    .ok_or_else(|| ZkpError::InvalidEncoding("x is not on the curve".into()))
            }
            (UNCOMPRESSED_SIZE, Some(0x04)) => {
                let x = coordinate(&bytes[1..33])?;
                let y = coordinate(&bytes[33..])?;
                if !bool::from(Self::is_on_curve(&x, &y)) {
                    return Err(ZkpError::InvalidEncoding("point is not on the curve".into()));
                }
                Ok(Self { x, y })
            }
            (COMPRESSED_SIZE | UNCOMPRESSED_SIZE, Some(prefix)) => Err(ZkpError::InvalidEncoding(
                format!("invalid point prefix 0x{prefix:02x}"),
            )),
            (len, _) => Err(ZkpError::InvalidEncoding(format!(
                "point encoding must be 33 or 65 bytes, got {len}"
            ))),
        }
    }

    /// `0x02 | 0x03` (y parity) followed by the x-coordinate.
    pub fn to_compressed(&self) -> [u8; COMPRESSED_SIZE] {
        let mut out = [0u8; COMPRESSED_SIZE];
        out[0] = 0x02 | self.y.is_odd().unwrap_u8();
        out[1..].copy_from_slice(&self.x.to_bytes());
        out
    }

    /// `0x04` followed by both coordinates.
    pub fn to_uncompressed(&self) -> [u8; UNCOMPRESSED_SIZE] {
        let mut out = [0u8; UNCOMPRESSED_SIZE];
        out[0] = 0x04;
        out[1..33].copy_from_slice(&self.x.to_bytes());
        out[33..].copy_from_slice(&self.y.to_bytes());
        out
    }

    pub fn to_point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: FieldElement::ONE,
        }
    }
}

/// A curve point in projective coordinates, possibly the identity.
#[derive(Clone, Copy, Debug)]
pub struct Point {
    x: FieldElement,
    y: FieldElement,
    z: FieldElement,
}

impl Point {
    /// The point at infinity.
    pub const IDENTITY: Self = Self {
        x: FieldElement::ZERO,
        y: FieldElement::ONE,
        z: FieldElement::ZERO,
    };

    /// G as a projective point.
    pub fn generator() -> Self {
        GENERATOR_G.to_point()
    }

    /// H as a projective point.
    pub fn blinding_generator() -> Self {
        GENERATOR_H.to_point()
    }

    pub fn is_identity(&self) -> Choice {
        self.z.is_zero()
    }

    /// Complete addition (RCB algorithm 7).
    pub fn add_point(&self, other: &Self) -> Self {
        let (x1, y1, z1) = (self.x, self.y, self.z);
        let (x2, y2, z2) = (other.x, other.y, other.z);

        let t0 = x1 * x2;
        let t1 = y1 * y2;
        let t2 = z1 * z2;
        let t3 = (x1 + y1) * (x2 + y2) - (t0 + t1);
        let t4 = (y1 + z1) * (y2 + z2) - (t1 + t2);
        let y3 = (x1 + z1) * (x2 + z2) - (t0 + t2);
        let t0 = t0.double() + t0;
        let t2 = CURVE_B3 * t2;
        let z3 = t1 + t2;
        let t1 = t1 - t2;
        let y3 = CURVE_B3 * y3;
        let x3 = t3 * t1 - t4 * y3;
        let y3 = y3 * t0 + t1 * z3;
        let z3 = z3 * t4 + t0 * t3;

        Self { x: x3, y: y3, z: z3 }
    }

    /// Complete doubling (RCB algorithm 9).
    pub fn double(&self) -> Self {
        let (x, y, z) = (self.x, self.y, self.z);

        let t0 = y.square();
        let z3 = t0.double().double().double();
        let t1 = y * z;
        let t2 = CURVE_B3 * z.square();
        let x3 = t2 * z3;
        let y3 = t0 + t2;
        let z3 = t1 * z3;
        let t2 = t2.double() + t2;
        let t0 = t0 - t2;
        let y3 = t0 * y3 + x3;
        let x3 = (t0 * (x * y)).double();

        Self { x: x3, y: y3, z: z3 }
    }

    pub fn negate(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: self.z,
        }
    }

    /// Constant-time selection of `table[index]`; every entry is touched.
    pub(crate) fn lookup(table: &[Self; 16], index: u8) -> Self {
        let mut out = Self::IDENTITY;
        for (i, candidate) in table.iter().enumerate() {
            out.conditional_assign(candidate, (i as u8).ct_eq(&index));
        }
        out
    }

    /// Constant-time variable-base multiplication with a fixed 4-bit window.
    pub fn mul_scalar(&self, k: &Scalar) -> Self {
        let mut table = [Self::IDENTITY; 16];
        for i in 1..16 {
            table[i] = table[i - 1].add_point(self);
        }

        let mut acc = Self::IDENTITY;
        for window in (0..64).rev() {
            acc = acc.double().double().double().double();
            acc = acc.add_point(&Self::lookup(&table, k.nibble(window)));
        }
        acc
    }

    /// Normalizes to affine form; `None` for the identity.
    pub fn to_affine(&self) -> Option<AffinePoint> {
        let z_inv = self.z.invert().ok()?;
        Some(AffinePoint {
            x: self.x * z_inv,
            y: self.y * z_inv,
        })
    }

    /// Compressed encoding. The identity has no encoding.
    pub fn to_compressed(&self) -> Result<[u8; COMPRESSED_SIZE]> {
        self.to_affine()
            .map(|affine| affine.to_compressed())
            .ok_or_else(|| ZkpError::ArithmeticError("point at infinity has no encoding".into()))
    }

    /// Parses a compressed or uncompressed encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        AffinePoint::from_bytes(bytes).map(|affine| affine.to_point())
    }
}

impl From<AffinePoint> for Point {
    fn from(affine: AffinePoint) -> Self {
        affine.to_point()
    }
}

impl ConditionallySelectable for Point {
    fn conditional_select(a: &Self, b: &Self, choice: Choice) -> Self {
        Self {
            x: FieldElement::conditional_select(&a.x, &b.x, choice),
            y: FieldElement::conditional_select(&a.y, &b.y, choice),
            z: FieldElement::conditional_select(&a.z, &b.z, choice),
        }
    }
}

impl ConstantTimeEq for Point {
    // Cross-multiplied so that differing Z representations compare equal.
    fn ct_eq(&self, other: &Self) -> Choice {
        (self.x * other.z).ct_eq(&(other.x * self.z))
            & (self.y * other.z).ct_eq(&(other.y * self.z))
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.ct_eq(other).into()
    }
}

impl Eq for Point {}

impl Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        self.add_point(&rhs)
    }
}

impl Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.add_point(&rhs.negate())
    }
}

impl Neg for Point {
    type Output = Self;

    fn neg(self) -> Self {
        self.negate()
    }
}

impl Mul<Scalar> for Point {
    type Output = Self;

    fn mul(self, rhs: Scalar) -> Self {
        self.mul_scalar(&rhs)
    }
}
