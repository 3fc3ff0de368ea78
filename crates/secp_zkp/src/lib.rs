//! # secp_zkp - Confidential Asset Primitives on secp256k1
//!
//! The cryptographic core behind confidential assets: blinded asset
//! generators and the surjection proofs that tie transaction outputs to
//! their inputs without revealing which input funded which output.
//!
//! ## Features
//!
//! - **Constant-time arithmetic**: 256-bit field and scalar arithmetic mod p and n
//! - **Curve group**: complete projective formulas for y² = x³ + 7
//! - **Contexts**: owned precomputation with re-randomizable blinding
//! - **Key tweaks**: additive and multiplicative private-key tweaks
//! - **Asset generators**: hash-to-curve of asset tags, blinded with `r·H`
//! - **Surjection proofs**: anonymity-set selection and ring proofs over H
//! - **Batch verification**: parallel verification of many proofs
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           secp_zkp                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Surjection  │  Generator  │  Keys  │  Context  │    Point    │
//! └──────────────────────────────────────────────────────────────┘
//!         │             │          │          │            │
//!         ├─ Selection  ├─ Tag     ├─ Add     ├─ G table   ├─ Field
//!         ├─ Ring (AOS) ├─ Hash to ├─ Mul     ├─ H table   ├─ Scalar
//!         ├─ Encoding   │  curve   └─ Pubkey  └─ Blinding  └─ Limb arith
//!         └─ Batch      └─ Blind
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use secp_zkp::{keys, Context, ContextFlags, FixedAssetTag, Generator};
//! use secp_zkp::surjection::{SelectionConfig, SurjectionProofSkeleton};
//!
//! let ctx = Context::new_randomized(ContextFlags::BOTH).unwrap();
//!
//! // 1. Key tweaking
//! let tweaked = keys::tweak_add(&ctx, &[1u8; 32], &[2u8; 32]).unwrap();
//! assert_eq!(tweaked, [3u8; 32]);
//!
//! // 2. Blinded asset generators
//! let asset = FixedAssetTag::from_bytes([0xaa; 32]);
//! let other = FixedAssetTag::from_bytes([0xbb; 32]);
//! let inputs = vec![
//!     Generator::generate_blinded(&ctx, &other, &[0x11; 32]).unwrap(),
//!     Generator::generate_blinded(&ctx, &asset, &[0x22; 32]).unwrap(),
//! ];
//! let output = Generator::generate_blinded(&ctx, &asset, &[0x33; 32]).unwrap();
//!
//! // 3. Surjection proof
//! let (skeleton, index) = SurjectionProofSkeleton::initialize(
//!     &[other, asset],
//!     &asset,
//!     &SelectionConfig::default(),
//!     &[0x44; 32],
//! )
//! .unwrap();
//! assert_eq!(index, 1);
//!
//! let proof = skeleton
//!     .generate(&ctx, &inputs, &output, index, &[0x22; 32], &[0x33; 32])
//!     .unwrap();
//! assert!(proof.verify(&ctx, &inputs, &output));
//! ```
//!
//! ## Security Considerations
//!
//! - Arithmetic on secrets (keys, blinding factors, nonces) avoids
//!   data-dependent branches and table indices. Verification handles only
//!   public data and is variable time.
//! - Ring nonces are derived from the secret and the full proof message, so
//!   proofs are deterministic and never reuse a nonce across messages.
//! - Never log or expose blinding factors or private keys.
//! - Audit before using in production systems.

mod arith;
pub mod context;
pub mod error;
pub mod field;
pub mod generator;
mod hex_serde;
pub mod keys;
pub mod point;
pub mod scalar;
pub mod surjection;

// Re-export main types
pub use context::{Context, ContextFlags};
pub use error::{Result, ZkpError};
pub use field::FieldElement;
pub use generator::{FixedAssetTag, Generator};
pub use point::{AffinePoint, Point};
pub use scalar::Scalar;
pub use surjection::{SelectionConfig, SurjectionProof, SurjectionProofSkeleton};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
