//! Asset surjection proofs.
//!
//! A surjection proof shows that an output asset generator is a re-blinding
//! of *one of* a set of input generators, without saying which. The prover
//! knows the blinding offset `d` with `output - input[i] = d·H` for the real
//! input `i`; the proof is a ring signature over the keys
//! `output - input[j]` for every input `j` in the anonymity set.
//!
//! # Lifecycle
//!
//! ```text
//!   input tags ──initialize──► SurjectionProofSkeleton ──generate──► SurjectionProof
//!   (+ seed, config)            (N, inclusion bitmap)     (generators,   (bitmap + e0 + s_i)
//!                                                           blinding keys)        │
//!                                                                                 ▼
//!                                                                      verify(inputs, output)
//! ```
//!
//! A skeleton cannot be verified and a complete proof cannot be generated
//! again: the transition consumes the skeleton.
//!
//! # Example
//!
//! ```
//! use secp_zkp::{Context, ContextFlags, FixedAssetTag, Generator};
//! use secp_zkp::surjection::{SelectionConfig, SurjectionProofSkeleton};
//!
//! let ctx = Context::new(ContextFlags::BOTH);
//! let gold = FixedAssetTag::from_bytes([1u8; 32]);
//! let silver = FixedAssetTag::from_bytes([2u8; 32]);
//!
//! let in_keys = [[3u8; 32], [4u8; 32]];
//! let out_key = [5u8; 32];
//! let inputs = vec![
//!     Generator::generate_blinded(&ctx, &gold, &in_keys[0]).unwrap(),
//!     Generator::generate_blinded(&ctx, &silver, &in_keys[1]).unwrap(),
//! ];
//! let output = Generator::generate_blinded(&ctx, &gold, &out_key).unwrap();
//!
//! let (skeleton, index) = SurjectionProofSkeleton::initialize(
//!     &[gold, silver],
//!     &gold,
//!     &SelectionConfig::default(),
//!     &[7u8; 32],
//! )
//! .unwrap();
//!
//! let proof = skeleton
//!     .generate(&ctx, &inputs, &output, index, &in_keys[index], &out_key)
//!     .unwrap();
//! assert!(proof.verify(&ctx, &inputs, &output));
//! ```

pub mod batch;
mod encoding;
pub mod proof;
mod ring;
mod selection;

use serde::{Deserialize, Serialize};

pub use batch::{verify_batch, BatchResult, BatchVerifier};
pub use proof::{SurjectionProof, SurjectionProofSkeleton};

/// Largest number of candidate inputs a proof may reference.
pub const MAX_INPUTS: usize = 256;

/// Wire version byte of a skeleton.
pub const SKELETON_VERSION: u8 = 0x00;

/// Wire version byte of a complete proof.
pub const PROOF_VERSION: u8 = 0x01;

/// Parameters for choosing the anonymity set in
/// [`SurjectionProofSkeleton::initialize`].
///
/// # Examples
///
/// ```
/// # use secp_zkp::surjection::SelectionConfig;
/// let mut config = SelectionConfig::default();
/// config.anonymity_set_size = 5;
///
/// let json = serde_json::to_string(&config).unwrap();
/// let back: SelectionConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(back, config);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Requested number of inputs in the ring.
    ///
    /// Clamped to the number of candidates. Larger sets hide the real input
    /// better at the cost of a larger proof (32 bytes per member).
    pub anonymity_set_size: usize,
    /// How many random subsets to draw before giving up.
    ///
    /// Each draw succeeds when the subset contains at least one input whose
    /// tag matches the output tag.
    pub max_iterations: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            anonymity_set_size: 3,
            max_iterations: 100,
        }
    }
}

impl SelectionConfig {
    /// Smallest possible proof: the ring contains only the real input.
    ///
    /// Offers no anonymity; useful when the link is public anyway.
    pub fn minimal() -> Self {
        Self {
            anonymity_set_size: 1,
            max_iterations: 100,
        }
    }

    /// Larger ring with a generous retry budget.
    pub fn high_privacy() -> Self {
        Self {
            anonymity_set_size: 8,
            max_iterations: 1000,
        }
    }

    /// Ring over every candidate input.
    ///
    /// The first draw always succeeds, so one iteration is enough.
    pub fn full() -> Self {
        Self {
            anonymity_set_size: MAX_INPUTS,
            max_iterations: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SelectionConfig::default();
        assert_eq!(config.anonymity_set_size, 3);
        assert_eq!(config.max_iterations, 100);
    }

    #[test]
    fn test_presets() {
        assert_eq!(SelectionConfig::minimal().anonymity_set_size, 1);
        assert!(SelectionConfig::high_privacy().anonymity_set_size > 3);
        assert_eq!(SelectionConfig::full().anonymity_set_size, MAX_INPUTS);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: SelectionConfig = serde_json::from_str(r#"{"anonymity_set_size": 4}"#).unwrap();
        assert_eq!(config.anonymity_set_size, 4);
        assert_eq!(config.max_iterations, 100);
    }
}
