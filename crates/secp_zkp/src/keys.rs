//! Private-key tweaking.
//!
//! Keys and tweaks are 32-byte big-endian integers. A valid private key lies
//! in `[1, n)`. The arithmetic is constant time in the key; only the final
//! validity verdict is branched on.

use crate::context::Context;
use crate::error::{Result, ZkpError};
use crate::scalar::Scalar;

/// Size of a serialized private key or tweak.
pub const SECRET_KEY_SIZE: usize = 32;

fn parse_key(key: &[u8; SECRET_KEY_SIZE]) -> Result<Scalar> {
    let scalar = Scalar::from_bytes_checked(key, "private key")?;
    if bool::from(scalar.is_zero()) {
        return Err(ZkpError::InvalidScalar("private key is zero".into()));
    }
    Ok(scalar)
}

fn reject_zero(value: &Scalar, message: &str) -> Result<()> {
    if bool::from(value.is_zero()) {
        return Err(ZkpError::InvalidScalar(message.into()));
    }
    Ok(())
}

/// Returns true when `key` is a valid private key (`0 < key < n`).
pub fn verify_secret_key(key: &[u8; SECRET_KEY_SIZE]) -> bool {
    parse_key(key).is_ok()
}

/// `(key + tweak) mod n`.
///
/// Fails with `InvalidScalar` when the key is zero or `>= n`, the tweak is
/// `>= n`, or the sum is zero. Needs a sign-capable context.
pub fn tweak_add(
    ctx: &Context,
    key: &[u8; SECRET_KEY_SIZE],
    tweak: &[u8; SECRET_KEY_SIZE],
) -> Result<[u8; SECRET_KEY_SIZE]> {
    ctx.require_sign()?;
    let key = parse_key(key)?;
    let tweak = Scalar::from_bytes_checked(tweak, "tweak")?;

    let sum = key + tweak;
    reject_zero(&sum, "tweaked key is zero")?;
    Ok(sum.to_bytes())
}

/// `(key * tweak) mod n`.
///
/// Fails with `InvalidScalar` when the key is zero or `>= n`, or the tweak is
/// zero or `>= n`. Needs a sign-capable context.
pub fn tweak_mul(
    ctx: &Context,
    key: &[u8; SECRET_KEY_SIZE],
    tweak: &[u8; SECRET_KEY_SIZE],
) -> Result<[u8; SECRET_KEY_SIZE]> {
    ctx.require_sign()?;
    let key = parse_key(key)?;
    let tweak = Scalar::from_bytes_checked(tweak, "tweak")?;
    reject_zero(&tweak, "multiplicative tweak is zero")?;

    Ok((key * tweak).to_bytes())
}

/// Compressed public key `key · G`.
pub fn public_key_create(ctx: &Context, key: &[u8; SECRET_KEY_SIZE]) -> Result<[u8; 33]> {
    let key = parse_key(key)?;
    ctx.mul_g(&key)?.to_compressed()
}
