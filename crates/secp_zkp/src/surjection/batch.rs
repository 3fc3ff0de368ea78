//! Parallel verification of many surjection proofs.
//!
//! Ring signatures do not combine into a single equation the way Schnorr
//! proofs do, so batching here means independent verification spread over
//! the rayon thread pool. The shared [`Context`] is only read.
//!
//! ## Example
//!
//! ```rust
//! use secp_zkp::{Context, ContextFlags, FixedAssetTag, Generator};
//! use secp_zkp::surjection::{BatchVerifier, SelectionConfig, SurjectionProofSkeleton};
//!
//! let ctx = Context::new(ContextFlags::BOTH);
//! let tag = FixedAssetTag::from_bytes([9u8; 32]);
//! let input = Generator::generate_blinded(&ctx, &tag, &[1u8; 32]).unwrap();
//! let output = Generator::generate_blinded(&ctx, &tag, &[2u8; 32]).unwrap();
//!
//! let (skeleton, index) =
//!     SurjectionProofSkeleton::initialize(&[tag], &tag, &SelectionConfig::default(), &[0u8; 32])
//!         .unwrap();
//! let proof = skeleton
//!     .generate(&ctx, &[input], &output, index, &[1u8; 32], &[2u8; 32])
//!     .unwrap();
//!
//! let mut verifier = BatchVerifier::new();
//! verifier.add(proof, vec![input], output);
//! assert!(verifier.verify_all(&ctx).all_valid);
//! ```

use std::time::Instant;

use log::debug;
use rayon::prelude::*;

use super::proof::SurjectionProof;
use crate::context::Context;
use crate::generator::Generator;

struct BatchEntry {
    proof: SurjectionProof,
    inputs: Vec<Generator>,
    output: Generator,
}

/// Collects surjection proofs with their public generators.
#[derive(Default)]
pub struct BatchVerifier {
    entries: Vec<BatchEntry>,
}

impl BatchVerifier {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Queues a proof together with the generators it must verify against.
    pub fn add(&mut self, proof: SurjectionProof, inputs: Vec<Generator>, output: Generator) {
        self.entries.push(BatchEntry {
            proof,
            inputs,
            output,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Verifies every queued proof in parallel. Results keep insertion order.
    pub fn verify_all(&self, ctx: &Context) -> BatchResult {
        let start = Instant::now();

        let results: Vec<bool> = self
            .entries
            .par_iter()
            .map(|entry| entry.proof.verify(ctx, &entry.inputs, &entry.output))
            .collect();

        let all_valid = results.iter().all(|&v| v);
        let verification_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "Batch verified {} surjection proofs in {} ms (all valid: {})",
            results.len(),
            verification_time_ms,
            all_valid
        );

        BatchResult {
            all_valid,
            results,
            verification_time_ms,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Result of batch verification
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// True if all proofs are valid (vacuously true for an empty batch)
    pub all_valid: bool,
    /// Per-proof results in insertion order
    pub results: Vec<bool>,
    /// Time taken to verify all proofs (in milliseconds)
    pub verification_time_ms: u64,
}

impl BatchResult {
    pub fn total_proofs(&self) -> usize {
        self.results.len()
    }

    pub fn valid_count(&self) -> usize {
        self.results.iter().filter(|&&v| v).count()
    }

    pub fn invalid_count(&self) -> usize {
        self.total_proofs() - self.valid_count()
    }

    /// Result of the proof added at `index`, if any.
    pub fn is_valid(&self, index: usize) -> Option<bool> {
        self.results.get(index).copied()
    }
}

/// Verifies `(proof, inputs, output)` triples without building a
/// [`BatchVerifier`].
pub fn verify_batch(
    ctx: &Context,
    proofs: &[(SurjectionProof, Vec<Generator>, Generator)],
) -> Vec<bool> {
    proofs
        .par_iter()
        .map(|(proof, inputs, output)| proof.verify(ctx, inputs, output))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFlags;
    use crate::generator::FixedAssetTag;
    use crate::surjection::{SelectionConfig, SurjectionProofSkeleton};

    fn make_proof(ctx: &Context, asset: u8) -> (SurjectionProof, Vec<Generator>, Generator) {
        let tags = [
            FixedAssetTag::from_bytes([asset; 32]),
            FixedAssetTag::from_bytes([asset.wrapping_add(1); 32]),
        ];
        let keys = [[0x21u8; 32], [0x22u8; 32]];
        let inputs: Vec<Generator> = tags
            .iter()
            .zip(&keys)
            .map(|(t, k)| Generator::generate_blinded(ctx, t, k).unwrap())
            .collect();
        let out_key = [0x33u8; 32];
        let output = Generator::generate_blinded(ctx, &tags[0], &out_key).unwrap();

        let (skeleton, index) = SurjectionProofSkeleton::initialize(
            &tags,
            &tags[0],
            &SelectionConfig::default(),
            &[asset; 32],
        )
        .unwrap();
        let proof = skeleton
            .generate(ctx, &inputs, &output, index, &keys[index], &out_key)
            .unwrap();
        (proof, inputs, output)
    }

    #[test]
    fn test_batch_verifier_empty() {
        let ctx = Context::new(ContextFlags::VERIFY);
        let verifier = BatchVerifier::new();
        assert_eq!(verifier.len(), 0);
        assert!(verifier.is_empty());

        let result = verifier.verify_all(&ctx);
        assert!(result.all_valid);
        assert_eq!(result.total_proofs(), 0);
    }

    #[test]
    fn test_batch_all_valid() {
        let ctx = Context::new(ContextFlags::BOTH);
        let mut verifier = BatchVerifier::new();
        for asset in 0..5u8 {
            let (proof, inputs, output) = make_proof(&ctx, asset * 3);
            verifier.add(proof, inputs, output);
        }

        let result = verifier.verify_all(&ctx);
        assert!(result.all_valid);
        assert_eq!(result.valid_count(), 5);
        assert_eq!(result.invalid_count(), 0);
    }

    #[test]
    fn test_batch_reports_invalid_entry() {
        let ctx = Context::new(ContextFlags::BOTH);
        let mut verifier = BatchVerifier::new();

        let (proof, inputs, output) = make_proof(&ctx, 1);
        verifier.add(proof, inputs, output);

        // Verified against the wrong output
        let (proof, inputs, _) = make_proof(&ctx, 10);
        let wrong = inputs[1];
        verifier.add(proof, inputs, wrong);

        let result = verifier.verify_all(&ctx);
        assert!(!result.all_valid);
        assert_eq!(result.is_valid(0), Some(true));
        assert_eq!(result.is_valid(1), Some(false));
        assert_eq!(result.is_valid(2), None);

        verifier.clear();
        assert!(verifier.is_empty());
    }

    #[test]
    fn test_verify_batch_helper() {
        let ctx = Context::new(ContextFlags::BOTH);
        let proofs: Vec<_> = (0..3u8).map(|a| make_proof(&ctx, a * 5)).collect();
        assert_eq!(verify_batch(&ctx, &proofs), vec![true; 3]);
    }
}
