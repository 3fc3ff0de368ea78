//! Asset tags and Pedersen asset generators.
//!
//! Every asset type is identified by a 32-byte [`FixedAssetTag`]. Hashing the
//! tag onto the curve yields the asset's *unblinded* generator `A`. Blinding
//! it with a factor `r` gives `A + r·H`, where H is the NUMS base from
//! [`crate::point::GENERATOR_H`]. Two blinded generators of the same asset
//! therefore differ by a known multiple of H, which is exactly what a
//! surjection proof demonstrates without revealing the multiple.

use std::fmt;
use std::str::FromStr;

use log::trace;
use sha2::{Digest, Sha256};
use subtle::Choice;

use crate::context::Context;
use crate::error::{Result, ZkpError};
use crate::field::FieldElement;
use crate::hex_serde::impl_hex_serde;
use crate::point::{AffinePoint, Point, COMPRESSED_SIZE};
use crate::scalar::Scalar;

/// Domain tag for asset hash-to-curve.
const GENERATOR_DOMAIN: &[u8] = b"secp_zkp/generator";

/// Size of a fixed asset tag.
pub const ASSET_TAG_SIZE: usize = 32;

/// Size of a serialized generator.
pub const GENERATOR_SIZE: usize = COMPRESSED_SIZE;

/// Public 32-byte identifier of an asset type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedAssetTag([u8; ASSET_TAG_SIZE]);

impl FixedAssetTag {
    pub fn from_bytes(bytes: [u8; ASSET_TAG_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses a raw 32-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; ASSET_TAG_SIZE] = bytes.try_into().map_err(|_| {
            ZkpError::InvalidEncoding(format!(
                "asset tag must be {ASSET_TAG_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ASSET_TAG_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for FixedAssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for FixedAssetTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedAssetTag({})", self.to_hex())
    }
}

impl FromStr for FixedAssetTag {
    type Err = ZkpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_slice(&hex::decode(s)?)
    }
}

impl From<[u8; ASSET_TAG_SIZE]> for FixedAssetTag {
    fn from(bytes: [u8; ASSET_TAG_SIZE]) -> Self {
        Self(bytes)
    }
}

impl_hex_serde!(FixedAssetTag);

/// A (possibly blinded) asset generator. Never the point at infinity.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Generator(AffinePoint);

impl Generator {
    /// Deterministic hash-to-curve of an asset tag (try-and-increment).
    ///
    /// `x = SHA-256(domain || tag || counter)` for counter `0..=255`; the
    /// first `x` below p whose `x^3 + 7` is a square wins, with the even
    /// root as `y`. Each counter succeeds with probability about 1/2.
    pub fn generate(tag: &FixedAssetTag) -> Result<Self> {
        for counter in 0..=u8::MAX {
            let mut hasher = Sha256::new();
            hasher.update(GENERATOR_DOMAIN);
            hasher.update(tag.as_bytes());
            hasher.update([counter]);
            let digest: [u8; 32] = hasher.finalize().into();

            let Some(x) = Option::<FieldElement>::from(FieldElement::from_bytes(&digest)) else {
                continue;
            };
            let even = AffinePoint::decompress(&x, Choice::from(0));
            if let Some(point) = Option::<AffinePoint>::from(even) {
                trace!("Asset generator found after {} retries", counter);
                return Ok(Self(point));
            }
        }
        Err(ZkpError::ArithmeticError(
            "hash-to-curve exhausted its retry counter".into(),
        ))
    }

    /// `generate(tag) + blinding_factor · H`.
    ///
    /// Fails with `InvalidScalar` when the blinding factor is `>= n`. A zero
    /// factor yields the unblinded generator. Needs a sign-capable context.
    pub fn generate_blinded(
        ctx: &Context,
        tag: &FixedAssetTag,
        blinding_factor: &[u8; 32],
    ) -> Result<Self> {
        let blind = Scalar::from_bytes_checked(blinding_factor, "blinding factor")?;
        let unblinded = Self::generate(tag)?;
        let blinded = unblinded.to_point().add_point(&ctx.mul_h(&blind)?);
        Self::from_point(&blinded)
    }

    /// Wraps a group element; the identity is rejected.
    pub fn from_point(point: &Point) -> Result<Self> {
        point
            .to_affine()
            .map(Self)
            .ok_or_else(|| ZkpError::ArithmeticError("generator is the point at infinity".into()))
    }

    pub fn to_point(&self) -> Point {
        self.0.to_point()
    }

    /// Parses the 33-byte compressed form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != GENERATOR_SIZE {
            return Err(ZkpError::InvalidEncoding(format!(
                "generator must be {GENERATOR_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        AffinePoint::from_bytes(bytes).map(Self)
    }

    /// 33-byte compressed form: parity byte followed by x.
    pub fn to_bytes(&self) -> [u8; GENERATOR_SIZE] {
        self.0.to_compressed()
    }
}

impl fmt::Display for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Generator({self})")
    }
}

impl FromStr for Generator {
    type Err = ZkpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

impl_hex_serde!(Generator);
