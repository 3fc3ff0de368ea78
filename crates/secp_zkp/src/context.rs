//! Precomputation context for secret and public scalar multiplication.
//!
//! A [`Context`] owns every table the crate multiplies with. Nothing is
//! global: independent contexts can coexist, be cloned, re-randomized and
//! destroyed without affecting each other.
//!
//! # Capabilities
//!
//! | Flags             | Tables built                                  | Enables                          |
//! |-------------------|-----------------------------------------------|----------------------------------|
//! | [`ContextFlags::NONE`]   | none                                   | anonymity-set selection, unblinded generators |
//! | [`ContextFlags::SIGN`]   | 64 x 16 fixed-base tables for G and H  | tweaks, blinded generators, proof generation  |
//! | [`ContextFlags::VERIFY`] | 16-entry window table for H            | proof verification               |
//!
//! # Blinding
//!
//! Secret multiplications compute `(k + b)·B + (-b)·B` where `b` is a context
//! blinding scalar set by [`Context::randomize`]. The intermediate values then
//! no longer correlate with `k` across calls made with different seeds.

use std::fmt;

use log::{debug, trace};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, ZkpError};
use crate::point::Point;
use crate::scalar::Scalar;

/// Domain tag for deriving the context blinding scalar from a seed.
const BLIND_DOMAIN: &[u8] = b"secp_zkp/context-blind";

/// Number of 4-bit windows in a 256-bit scalar.
const WINDOWS: usize = 64;

/// Capabilities requested when creating a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextFlags(u8);

impl ContextFlags {
    /// No precomputation.
    pub const NONE: Self = Self(0);
    /// Secret-scalar multiplication tables.
    pub const SIGN: Self = Self(1);
    /// Verification tables.
    pub const VERIFY: Self = Self(1 << 1);
    /// Both sign and verify tables.
    pub const BOTH: Self = Self(1 | (1 << 1));

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self::BOTH
    }
}

/// `rows[w][v] = v · 16^w · B` for every window `w` and nibble value `v`.
#[derive(Clone)]
struct FixedBaseTable {
    rows: Vec<[Point; 16]>,
}

impl FixedBaseTable {
    fn new(base: &Point) -> Self {
        let mut rows = Vec::with_capacity(WINDOWS);
        let mut window_base = *base;
        for _ in 0..WINDOWS {
            let mut row = [Point::IDENTITY; 16];
            for v in 1..16 {
                row[v] = row[v - 1].add_point(&window_base);
            }
            window_base = row[15].add_point(&window_base);
            rows.push(row);
        }
        Self { rows }
    }

    /// Constant-time `k · B`: one lookup and one addition per window.
    fn mul(&self, k: &Scalar) -> Point {
        self.rows
            .iter()
            .enumerate()
            .fold(Point::IDENTITY, |acc, (window, row)| {
                acc.add_point(&Point::lookup(row, k.nibble(window)))
            })
    }
}

/// Fixed-base tables plus blinding state for one base point.
#[derive(Clone)]
struct BlindedBase {
    table: FixedBaseTable,
    /// `-b · B`
    unblind: Point,
}

impl BlindedBase {
    fn new(base: &Point) -> Self {
        Self {
            table: FixedBaseTable::new(base),
            unblind: Point::IDENTITY,
        }
    }

    fn mul(&self, k: &Scalar, blind: &Scalar) -> Point {
        self.table.mul(&(*k + *blind)).add_point(&self.unblind)
    }
}

#[derive(Clone)]
struct SignTables {
    g: BlindedBase,
    h: BlindedBase,
    blind: Scalar,
}

/// Small multiples of H for variable-time multiplication by public scalars.
#[derive(Clone)]
struct VerifyTable {
    h_multiples: [Point; 16],
}

impl VerifyTable {
    fn new() -> Self {
        let h = Point::blinding_generator();
        let mut h_multiples = [Point::IDENTITY; 16];
        for v in 1..16 {
            h_multiples[v] = h_multiples[v - 1].add_point(&h);
        }
        Self { h_multiples }
    }

    /// `s · H` for a public `s`. Skips zero windows, so it is not constant time.
    fn mul_vartime(&self, s: &Scalar) -> Point {
        let mut acc = Point::IDENTITY;
        for window in (0..WINDOWS).rev() {
            acc = acc.double().double().double().double();
            let nibble = s.nibble(window);
            if nibble != 0 {
                acc = acc.add_point(&self.h_multiples[usize::from(nibble)]);
            }
        }
        acc
    }
}

/// Owned precomputation for the operations in this crate.
///
/// `Context` is `Send + Sync`; read-only operations may share it across
/// threads. [`Context::randomize`] needs `&mut self`, so it cannot race with
/// concurrent users of the same context.
#[derive(Clone)]
pub struct Context {
    flags: ContextFlags,
    sign: Option<SignTables>,
    verify: Option<VerifyTable>,
}

impl Context {
    /// Builds the tables required by `flags`.
    pub fn new(flags: ContextFlags) -> Self {
        let sign = flags.contains(ContextFlags::SIGN).then(|| SignTables {
            g: BlindedBase::new(&Point::generator()),
            h: BlindedBase::new(&Point::blinding_generator()),
            blind: Scalar::ZERO,
        });
        let verify = flags
            .contains(ContextFlags::VERIFY)
            .then(VerifyTable::new);

        debug!(
            "Created context (sign: {}, verify: {})",
            sign.is_some(),
            verify.is_some()
        );

        Self { flags, sign, verify }
    }

    /// Builds the tables and blinds them with a seed from the operating
    /// system RNG.
    pub fn new_randomized(flags: ContextFlags) -> Result<Self> {
        let mut ctx = Self::new(flags);
        ctx.randomize_with(&mut OsRng)?;
        Ok(ctx)
    }

    pub fn flags(&self) -> ContextFlags {
        self.flags
    }

    pub fn can_sign(&self) -> bool {
        self.sign.is_some()
    }

    pub fn can_verify(&self) -> bool {
        self.verify.is_some()
    }

    /// Mixes a fresh 32-byte seed into the blinding used for secret
    /// multiplication.
    ///
    /// Fails with `InvalidEncoding` when the seed is not 32 bytes. A context
    /// without sign tables has nothing to blind, so this is a no-op there.
    pub fn randomize(&mut self, seed: &[u8]) -> Result<()> {
        if seed.len() != 32 {
            return Err(ZkpError::InvalidEncoding(format!(
                "randomization seed must be 32 bytes, got {}",
                seed.len()
            )));
        }

        let Some(tables) = self.sign.as_mut() else {
            trace!("Randomize on a context without sign tables is a no-op");
            return Ok(());
        };

        let mut hasher = Sha256::new();
        hasher.update(BLIND_DOMAIN);
        hasher.update(seed);
        let digest: [u8; 32] = hasher.finalize().into();
        let blind = Scalar::from_bytes_reduced(&digest);

        tables.g.unblind = tables.g.table.mul(&blind).negate();
        tables.h.unblind = tables.h.table.mul(&blind).negate();
        tables.blind = blind;

        debug!("Context re-randomized");
        Ok(())
    }

    /// [`Context::randomize`] with a seed drawn from `rng`.
    pub fn randomize_with<R: RngCore + CryptoRng>(&mut self, rng: &mut R) -> Result<()> {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        self.randomize(&seed)
    }

    /// Releases all tables. Equivalent to dropping the context.
    pub fn destroy(self) {
        trace!("Destroying context");
        drop(self);
    }

    fn sign_tables(&self) -> Result<&SignTables> {
        self.sign.as_ref().ok_or(ZkpError::MissingCapability("sign"))
    }

    /// Constant-time `k · G` for a secret `k`.
    pub(crate) fn mul_g(&self, k: &Scalar) -> Result<Point> {
        let tables = self.sign_tables()?;
        Ok(tables.g.mul(k, &tables.blind))
    }

    /// Constant-time `k · H` for a secret `k`.
    pub(crate) fn mul_h(&self, k: &Scalar) -> Result<Point> {
        let tables = self.sign_tables()?;
        Ok(tables.h.mul(k, &tables.blind))
    }

    /// Variable-time `s · H` for a public `s`.
    pub(crate) fn mul_h_vartime(&self, s: &Scalar) -> Result<Point> {
        self.verify
            .as_ref()
            .map(|table| table.mul_vartime(s))
            .ok_or(ZkpError::MissingCapability("verify"))
    }

    /// Fails unless the context was created with sign tables.
    pub(crate) fn require_sign(&self) -> Result<()> {
        self.sign_tables().map(|_| ())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextFlags::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("flags", &self.flags)
            .field("sign", &self.can_sign())
            .field("verify", &self.can_verify())
            .finish()
    }
}
