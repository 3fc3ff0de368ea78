//! Single-ring Borromean (AOS) signature over the base H.
//!
//! For public keys `P_0..P_{m-1}` and a secret `d` with `P_r = d·H`, the
//! signature is `(e0, s_0..s_{m-1})` such that walking the ring
//!
//! ```text
//! e_0     = Hc(e0, msg, 0)
//! R_j     = s_j·H + e_j·P_j
//! e_{j+1} = Hc(R_j, msg, j + 1)
//! ```
//!
//! ends with `SHA-256(R_{m-1} || msg) == e0`.

use log::trace;
use sha2::{Digest, Sha256};

use crate::context::Context;
use crate::error::{Result, ZkpError};
use crate::generator::Generator;
use crate::point::Point;
use crate::scalar::Scalar;

const MESSAGE_DOMAIN: &[u8] = b"secp_zkp/surjection-message";
const NONCE_DOMAIN: &[u8] = b"secp_zkp/surjection-nonce";

/// Completed ring: initial challenge plus one response per member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RingSignature {
    pub(crate) e0: [u8; 32],
    pub(crate) s: Vec<[u8; 32]>,
}

/// Commits to every candidate input and the output.
pub(crate) fn message_hash(inputs: &[Generator], output: &Generator) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(MESSAGE_DOMAIN);
    for input in inputs {
        hasher.update(input.to_bytes());
    }
    hasher.update(output.to_bytes());
    hasher.finalize().into()
}

/// `Hc(x, msg, j) = SHA-256(x || msg || be32(0) || be32(j)) mod n`.
fn challenge(x: &[u8], msg: &[u8; 32], index: usize) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(x);
    hasher.update(msg);
    hasher.update(0u32.to_be_bytes());
    hasher.update((index as u32).to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    Scalar::from_bytes_reduced(&digest)
}

fn closing_hash(last: &[u8; 33], msg: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(last);
    hasher.update(msg);
    hasher.finalize().into()
}

fn nonce(secret: &Scalar, msg: &[u8; 32], index: usize) -> Scalar {
    let mut hasher = Sha256::new();
    hasher.update(NONCE_DOMAIN);
    hasher.update(secret.to_bytes());
    hasher.update(msg);
    hasher.update((index as u32).to_be_bytes());
    let digest: [u8; 32] = hasher.finalize().into();
    Scalar::from_bytes_reduced(&digest)
}

fn encode_commitment(point: &Point) -> Result<[u8; 33]> {
    point
        .to_compressed()
        .map_err(|_| ZkpError::ArithmeticError("ring commitment is the point at infinity".into()))
}

/// Signs with secret `d` for the member at `real`.
///
/// Every nonce and fake response is derived from `d`, `msg` and the member
/// index, so the output is deterministic. All multiplications by
/// secret-derived scalars use the context's constant-time tables.
pub(crate) fn sign(
    ctx: &Context,
    msg: &[u8; 32],
    keys: &[Point],
    real: usize,
    secret: &Scalar,
) -> Result<RingSignature> {
    let m = keys.len();
    debug_assert!(real < m);

    let mut s: Vec<Scalar> = (0..m).map(|j| nonce(secret, msg, j)).collect();
    let k = s[real];

    let step = |j: usize, e: &Scalar, s: &Scalar| -> Result<[u8; 33]> {
        encode_commitment(&ctx.mul_h(s)?.add_point(&keys[j].mul_scalar(e)))
    };

    // From the real member forward to the end of the ring
    let mut commitment = encode_commitment(&ctx.mul_h(&k)?)?;
    for j in real + 1..m {
        let e = challenge(&commitment, msg, j);
        commitment = step(j, &e, &s[j])?;
    }
    let e0 = closing_hash(&commitment, msg);

    // From the start of the ring back round to the real member
    let mut e = challenge(&e0, msg, 0);
    for j in 0..real {
        commitment = step(j, &e, &s[j])?;
        e = challenge(&commitment, msg, j + 1);
    }

    s[real] = k - e * *secret;
    trace!("Signed ring of {} member(s)", m);

    Ok(RingSignature {
        e0,
        s: s.iter().map(Scalar::to_bytes).collect(),
    })
}

/// Walks the ring; any malformed response or degenerate commitment is a
/// failed verification.
pub(crate) fn verify(ctx: &Context, msg: &[u8; 32], keys: &[Point], sig: &RingSignature) -> bool {
    if keys.is_empty() || keys.len() != sig.s.len() {
        return false;
    }

    let mut e = challenge(&sig.e0, msg, 0);
    let mut commitment = [0u8; 33];
    for (j, (key, s_bytes)) in keys.iter().zip(&sig.s).enumerate() {
        let Some(s) = Option::<Scalar>::from(Scalar::from_bytes(s_bytes)) else {
            trace!("Ring response {} is not below the group order", j);
            return false;
        };
        let Ok(s_h) = ctx.mul_h_vartime(&s) else {
            return false;
        };
        let Ok(encoded) = s_h.add_point(&key.mul_scalar(&e)).to_compressed() else {
            trace!("Ring commitment {} is the point at infinity", j);
            return false;
        };
        commitment = encoded;
        e = challenge(&commitment, msg, j + 1);
    }

    closing_hash(&commitment, msg) == sig.e0
}
