//! Surjection proof skeletons and complete proofs.
//!
//! ## Wire format
//!
//! ```text
//! skeleton: 0x00 || N (u16 LE) || bitmap (ceil(N/8) bytes, LSB first)
//! proof:    0x01 || N (u16 LE) || bitmap || n_used (CompactSize) || e0 (32) || s_i (32 each)
//! ```

use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use super::encoding::{compact_size_len, read_compact_size, write_compact_size, InputBitmap};
use super::ring::{self, RingSignature};
use super::selection::select_inputs;
use super::{SelectionConfig, MAX_INPUTS, PROOF_VERSION, SKELETON_VERSION};
use crate::context::Context;
use crate::error::{Result, ZkpError};
use crate::generator::{FixedAssetTag, Generator};
use crate::hex_serde::impl_hex_serde;
use crate::point::Point;
use crate::scalar::Scalar;

/// Output of [`SurjectionProofSkeleton::initialize`]: the anonymity set,
/// without any ring payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurjectionProofSkeleton {
    bitmap: InputBitmap,
}

impl SurjectionProofSkeleton {
    /// Chooses the anonymity set for a proof that `output_tag` is one of
    /// `input_tags`.
    ///
    /// Returns the skeleton and the candidate index of the input the caller
    /// must prove against (the smallest matching index in the set).
    ///
    /// # Errors
    ///
    /// - `InvalidInputCount` when there are no candidates or more than
    ///   [`MAX_INPUTS`].
    /// - `NoMatchingInput` when no candidate carries `output_tag`.
    /// - `ExhaustedIterations` when no drawn subset contained a match.
    pub fn initialize(
        input_tags: &[FixedAssetTag],
        output_tag: &FixedAssetTag,
        config: &SelectionConfig,
        seed: &[u8; 32],
    ) -> Result<(Self, usize)> {
        let n = input_tags.len();
        if n == 0 || n > MAX_INPUTS {
            return Err(ZkpError::InvalidInputCount(n));
        }

        let matching: Vec<bool> = input_tags.iter().map(|tag| tag == output_tag).collect();
        let (subset, input_index) = select_inputs(&matching, config, seed)?;

        Ok((
            Self {
                bitmap: InputBitmap::from_indices(n, &subset),
            },
            input_index,
        ))
    }

    pub fn n_total_inputs(&self) -> usize {
        self.bitmap.n_inputs()
    }

    pub fn n_used_inputs(&self) -> usize {
        self.bitmap.count()
    }

    /// Candidate indices in the anonymity set, ascending.
    pub fn used_inputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.bitmap.iter()
    }

    /// Fills in the ring payload.
    ///
    /// `input_index` is the candidate index returned by `initialize`. The
    /// blinding keys are those used to derive `input_generators[input_index]`
    /// and `output_generator` from the same asset tag.
    ///
    /// # Errors
    ///
    /// - `MissingCapability` without a sign-capable context.
    /// - `InvalidScalar` for keys `>= n`, or for equal non-zero keys.
    /// - `GeneratorMismatch` when the generators do not fit the skeleton or
    ///   the keys do not link the chosen input to the output.
    pub fn generate(
        self,
        ctx: &Context,
        input_generators: &[Generator],
        output_generator: &Generator,
        input_index: usize,
        input_blinding_key: &[u8; 32],
        output_blinding_key: &[u8; 32],
    ) -> Result<SurjectionProof> {
        ctx.require_sign()?;

        let in_key = Scalar::from_bytes_checked(input_blinding_key, "input blinding key")?;
        let out_key = Scalar::from_bytes_checked(output_blinding_key, "output blinding key")?;
        if in_key == out_key && !bool::from(in_key.is_zero()) {
            return Err(ZkpError::InvalidScalar(
                "input and output blinding keys are equal".into(),
            ));
        }

        if input_generators.len() != self.n_total_inputs() {
            return Err(ZkpError::GeneratorMismatch(format!(
                "expected {} input generators, got {}",
                self.n_total_inputs(),
                input_generators.len()
            )));
        }
        if !self.bitmap.contains(input_index) {
            return Err(ZkpError::GeneratorMismatch(format!(
                "input {input_index} is not in the anonymity set"
            )));
        }

        let secret = out_key - in_key;
        let output = output_generator.to_point();
        let keys = ring_keys(&self.bitmap, input_generators, &output);
        let real = self.bitmap.iter().take_while(|&i| i != input_index).count();

        if keys[real] != ctx.mul_h(&secret)? {
            return Err(ZkpError::GeneratorMismatch(
                "blinding keys do not link the input to the output".into(),
            ));
        }

        let msg = ring::message_hash(input_generators, output_generator);
        let signature = ring::sign(ctx, &msg, &keys, real, &secret)?;
        debug!(
            "Generated surjection proof over {} of {} inputs",
            keys.len(),
            self.n_total_inputs()
        );

        Ok(SurjectionProof {
            bitmap: self.bitmap,
            signature,
        })
    }

    pub fn serialized_size(&self) -> usize {
        1 + self.bitmap.encoded_len()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        out.push(SKELETON_VERSION);
        self.bitmap.write(&mut out);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let body = strip_version(bytes, SKELETON_VERSION)?;
        let (bitmap, used) = InputBitmap::read(body)?;
        if used != body.len() {
            return Err(ZkpError::InvalidEncoding(format!(
                "{} trailing bytes after skeleton",
                body.len() - used
            )));
        }
        Ok(Self { bitmap })
    }
}

/// `output - input[j]` for every used input `j`, in ascending order.
fn ring_keys(bitmap: &InputBitmap, inputs: &[Generator], output: &Point) -> Vec<Point> {
    bitmap
        .iter()
        .map(|j| output.add_point(&inputs[j].to_point().negate()))
        .collect()
}

fn strip_version(bytes: &[u8], expected: u8) -> Result<&[u8]> {
    match bytes.split_first() {
        Some((&version, body)) if version == expected => Ok(body),
        Some((&version, _)) => Err(ZkpError::InvalidEncoding(format!(
            "unexpected version byte {version:#04x}"
        ))),
        None => Err(ZkpError::InvalidEncoding("empty proof".into())),
    }
}

/// A complete surjection proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurjectionProof {
    bitmap: InputBitmap,
    signature: RingSignature,
}

impl SurjectionProof {
    pub fn n_total_inputs(&self) -> usize {
        self.bitmap.n_inputs()
    }

    pub fn n_used_inputs(&self) -> usize {
        self.bitmap.count()
    }

    /// Candidate indices in the anonymity set, ascending.
    pub fn used_inputs(&self) -> impl Iterator<Item = usize> + '_ {
        self.bitmap.iter()
    }

    /// Checks the proof against the public generators.
    ///
    /// Never fails: any structural problem, including a context without
    /// verify tables, yields `false`.
    pub fn verify(
        &self,
        ctx: &Context,
        input_generators: &[Generator],
        output_generator: &Generator,
    ) -> bool {
        if !ctx.can_verify() {
            warn!("Surjection proof verification attempted without verify tables");
            return false;
        }
        if input_generators.len() != self.n_total_inputs() {
            debug!(
                "Surjection proof expects {} inputs, got {}",
                self.n_total_inputs(),
                input_generators.len()
            );
            return false;
        }

        let output = output_generator.to_point();
        let keys = ring_keys(&self.bitmap, input_generators, &output);
        let msg = ring::message_hash(input_generators, output_generator);
        ring::verify(ctx, &msg, &keys, &self.signature)
    }

    pub fn serialized_size(&self) -> usize {
        let used = self.signature.s.len();
        1 + self.bitmap.encoded_len() + compact_size_len(used as u64) + 32 * (used + 1)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_size());
        out.push(PROOF_VERSION);
        self.bitmap.write(&mut out);
        write_compact_size(&mut out, self.signature.s.len() as u64);
        out.extend_from_slice(&self.signature.e0);
        for s in &self.signature.s {
            out.extend_from_slice(s);
        }
        out
    }

    /// Parses a complete proof. Response scalars are range-checked by
    /// [`SurjectionProof::verify`], not here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let body = strip_version(bytes, PROOF_VERSION)?;
        let (bitmap, mut offset) = InputBitmap::read(body)?;

        let (n_used, len) = read_compact_size(&body[offset..])?;
        offset += len;
        if n_used != bitmap.count() as u64 {
            return Err(ZkpError::InvalidEncoding(format!(
                "bitmap selects {} inputs but {} responses are declared",
                bitmap.count(),
                n_used
            )));
        }

        let payload = &body[offset..];
        let expected = 32 * (bitmap.count() + 1);
        if payload.len() != expected {
            return Err(ZkpError::InvalidEncoding(format!(
                "ring payload is {} bytes, expected {expected}",
                payload.len()
            )));
        }

        let mut chunks = payload.chunks_exact(32).map(|chunk| {
            let mut word = [0u8; 32];
            word.copy_from_slice(chunk);
            word
        });
        let e0 = chunks.next().unwrap_or_default();
        let s = chunks.collect();

        Ok(Self {
            bitmap,
            signature: RingSignature { e0, s },
        })
    }
}

impl fmt::Display for SurjectionProofSkeleton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for SurjectionProofSkeleton {
    type Err = ZkpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

impl fmt::Display for SurjectionProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.to_bytes()))
    }
}

impl FromStr for SurjectionProof {
    type Err = ZkpError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_bytes(&hex::decode(s)?)
    }
}

impl_hex_serde!(SurjectionProofSkeleton);
impl_hex_serde!(SurjectionProof);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ContextFlags;

    fn tag(byte: u8) -> FixedAssetTag {
        FixedAssetTag::from_bytes([byte; 32])
    }

    fn seed_one() -> [u8; 32] {
        let mut seed = [0u8; 32];
        seed[31] = 1;
        seed
    }

    fn key(byte: u8) -> [u8; 32] {
        [byte; 32]
    }

    struct Fixture {
        ctx: Context,
        tags: Vec<FixedAssetTag>,
        keys: Vec<[u8; 32]>,
        inputs: Vec<Generator>,
        output: Generator,
        output_tag: FixedAssetTag,
        output_key: [u8; 32],
    }

    /// Inputs with tags `asset_bytes`, output of asset `output_asset`.
    fn fixture(asset_bytes: &[u8], output_asset: u8) -> Fixture {
        let ctx = Context::new(ContextFlags::BOTH);
        let tags: Vec<_> = asset_bytes.iter().map(|&b| tag(b)).collect();
        let keys: Vec<_> = (0..asset_bytes.len()).map(|i| key(0x10 + i as u8)).collect();
        let inputs = tags
            .iter()
            .zip(&keys)
            .map(|(t, k)| Generator::generate_blinded(&ctx, t, k).unwrap())
            .collect();
        let output_key = key(0x7e);
        let output = Generator::generate_blinded(&ctx, &tag(output_asset), &output_key).unwrap();
        Fixture {
            ctx,
            tags,
            keys,
            inputs,
            output,
            output_tag: tag(output_asset),
            output_key,
        }
    }

    fn prove(f: &Fixture, config: &SelectionConfig, seed: &[u8; 32]) -> SurjectionProof {
        let (skeleton, index) =
            SurjectionProofSkeleton::initialize(&f.tags, &f.output_tag, config, seed).unwrap();
        skeleton
            .generate(
                &f.ctx,
                &f.inputs,
                &f.output,
                index,
                &f.keys[index],
                &f.output_key,
            )
            .unwrap()
    }

    #[test]
    fn test_initialize_is_deterministic() {
        let tags = [tag(0xA), tag(0xB), tag(0xA)];
        let config = SelectionConfig {
            anonymity_set_size: 2,
            max_iterations: 100,
        };

        let (first, index) =
            SurjectionProofSkeleton::initialize(&tags, &tag(0xA), &config, &seed_one()).unwrap();
        let (second, index2) =
            SurjectionProofSkeleton::initialize(&tags, &tag(0xA), &config, &seed_one()).unwrap();

        assert_eq!(first, second);
        assert_eq!(index, index2);
        assert_eq!(first.n_total_inputs(), 3);
        assert_eq!(first.n_used_inputs(), 2);
        assert!(index == 0 || index == 2);
        assert!(first.used_inputs().any(|i| i == index));
    }

    #[test]
    fn test_initialize_errors() {
        let config = SelectionConfig::default();
        assert_eq!(
            SurjectionProofSkeleton::initialize(&[], &tag(1), &config, &seed_one()).unwrap_err(),
            ZkpError::InvalidInputCount(0)
        );

        let too_many = vec![tag(1); MAX_INPUTS + 1];
        assert_eq!(
            SurjectionProofSkeleton::initialize(&too_many, &tag(1), &config, &seed_one())
                .unwrap_err(),
            ZkpError::InvalidInputCount(MAX_INPUTS + 1)
        );

        for iterations in [0, 1, 1000] {
            let config = SelectionConfig {
                anonymity_set_size: 2,
                max_iterations: iterations,
            };
            assert_eq!(
                SurjectionProofSkeleton::initialize(
                    &[tag(1), tag(2)],
                    &tag(3),
                    &config,
                    &seed_one()
                )
                .unwrap_err(),
                ZkpError::NoMatchingInput
            );
        }
    }

    #[test]
    fn test_generate_and_verify() {
        let f = fixture(&[1, 2, 1, 3], 1);
        let proof = prove(&f, &SelectionConfig::default(), &seed_one());

        assert_eq!(proof.n_total_inputs(), 4);
        assert_eq!(proof.n_used_inputs(), 3);
        assert!(proof.verify(&f.ctx, &f.inputs, &f.output));
        // Pure and repeatable
        assert!(proof.verify(&f.ctx, &f.inputs, &f.output));
    }

    #[test]
    fn test_every_used_secret_index_verifies() {
        let f = fixture(&[1, 1, 1, 1, 1], 1);
        let (skeleton, _) = SurjectionProofSkeleton::initialize(
            &f.tags,
            &tag(1),
            &SelectionConfig::full(),
            &seed_one(),
        )
        .unwrap();

        for index in skeleton.used_inputs().collect::<Vec<_>>() {
            let proof = skeleton
                .clone()
                .generate(
                    &f.ctx,
                    &f.inputs,
                    &f.output,
                    index,
                    &f.keys[index],
                    &f.output_key,
                )
                .unwrap();
            assert!(proof.verify(&f.ctx, &f.inputs, &f.output), "index {index}");
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let f = fixture(&[1, 2, 1], 1);
        let a = prove(&f, &SelectionConfig::default(), &seed_one());
        let b = prove(&f, &SelectionConfig::default(), &seed_one());
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_generate_rejects_mismatches() {
        let f = fixture(&[1, 2, 1], 1);
        let (skeleton, index) = SurjectionProofSkeleton::initialize(
            &f.tags,
            &tag(1),
            &SelectionConfig::full(),
            &seed_one(),
        )
        .unwrap();

        let err = skeleton
            .clone()
            .generate(&f.ctx, &f.inputs[..2], &f.output, index, &f.keys[index], &f.output_key)
            .unwrap_err();
        assert!(matches!(err, ZkpError::GeneratorMismatch(_)));

        let err = skeleton
            .clone()
            .generate(&f.ctx, &f.inputs, &f.output, 7, &f.keys[index], &f.output_key)
            .unwrap_err();
        assert!(matches!(err, ZkpError::GeneratorMismatch(_)));

        // Input 1 carries a different asset, so no key links it to the output
        let err = skeleton
            .clone()
            .generate(&f.ctx, &f.inputs, &f.output, 1, &f.keys[1], &f.output_key)
            .unwrap_err();
        assert!(matches!(err, ZkpError::GeneratorMismatch(_)));

        // Wrong key for the right input
        let err = skeleton
            .generate(&f.ctx, &f.inputs, &f.output, index, &key(0x55), &f.output_key)
            .unwrap_err();
        assert!(matches!(err, ZkpError::GeneratorMismatch(_)));
    }

    #[test]
    fn test_generate_rejects_bad_keys() {
        let f = fixture(&[1, 1], 1);
        let (skeleton, index) = SurjectionProofSkeleton::initialize(
            &f.tags,
            &tag(1),
            &SelectionConfig::default(),
            &seed_one(),
        )
        .unwrap();

        let err = skeleton
            .clone()
            .generate(&f.ctx, &f.inputs, &f.output, index, &[0xff; 32], &f.output_key)
            .unwrap_err();
        assert!(matches!(err, ZkpError::InvalidScalar(_)));

        let err = skeleton
            .clone()
            .generate(&f.ctx, &f.inputs, &f.output, index, &key(9), &key(9))
            .unwrap_err();
        assert!(matches!(err, ZkpError::InvalidScalar(_)));

        let verify_only = Context::new(ContextFlags::VERIFY);
        let err = skeleton
            .generate(
                &verify_only,
                &f.inputs,
                &f.output,
                index,
                &f.keys[index],
                &f.output_key,
            )
            .unwrap_err();
        assert_eq!(err, ZkpError::MissingCapability("sign"));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let f = fixture(&[1, 2, 1], 1);
        let proof = prove(&f, &SelectionConfig::full(), &seed_one());
        let bytes = proof.to_bytes();

        // Flip one bit in every payload byte in turn
        let header = bytes.len() - 32 * (proof.n_used_inputs() + 1);
        for pos in (header..bytes.len()).step_by(7) {
            let mut tampered = bytes.clone();
            tampered[pos] ^= 0x01;
            if let Ok(p) = SurjectionProof::from_bytes(&tampered) {
                assert!(!p.verify(&f.ctx, &f.inputs, &f.output), "byte {pos}");
            }
        }

        // Swapping two inputs changes the ring
        let mut swapped = f.inputs.clone();
        swapped.swap(0, 1);
        assert!(!proof.verify(&f.ctx, &swapped, &f.output));

        // Wrong output
        assert!(!proof.verify(&f.ctx, &f.inputs, &f.inputs[0]));

        // Wrong input count
        assert!(!proof.verify(&f.ctx, &f.inputs[..2], &f.output));
    }

    #[test]
    fn test_verify_without_verify_tables() {
        let f = fixture(&[1, 2], 1);
        let proof = prove(&f, &SelectionConfig::default(), &seed_one());
        let sign_only = Context::new(ContextFlags::SIGN);
        assert!(!proof.verify(&sign_only, &f.inputs, &f.output));
    }

    #[test]
    fn test_wire_layout() {
        let f = fixture(&[1, 2, 1], 1);
        let proof = prove(&f, &SelectionConfig::full(), &seed_one());
        let bytes = proof.to_bytes();

        assert_eq!(bytes.len(), proof.serialized_size());
        assert_eq!(&bytes[..5], &[PROOF_VERSION, 3, 0, 0b0000_0111, 3]);
        assert_eq!(bytes.len(), 5 + 32 * 4);
        assert_eq!(SurjectionProof::from_bytes(&bytes).unwrap(), proof);
    }

    #[test]
    fn test_skeleton_wire() {
        let tags = [tag(1), tag(2), tag(1)];
        let (skeleton, _) = SurjectionProofSkeleton::initialize(
            &tags,
            &tag(1),
            &SelectionConfig::full(),
            &seed_one(),
        )
        .unwrap();

        let bytes = skeleton.to_bytes();
        assert_eq!(bytes, vec![SKELETON_VERSION, 3, 0, 0b0000_0111]);
        assert_eq!(bytes.len(), skeleton.serialized_size());
        assert_eq!(SurjectionProofSkeleton::from_bytes(&bytes).unwrap(), skeleton);

        let text = skeleton.to_string();
        assert_eq!(text.parse::<SurjectionProofSkeleton>().unwrap(), skeleton);

        // A skeleton is not a proof and vice versa
        assert!(SurjectionProof::from_bytes(&bytes).is_err());
        assert!(SurjectionProofSkeleton::from_bytes(&[SKELETON_VERSION, 3, 0, 7, 0]).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed() {
        let f = fixture(&[1, 2, 1], 1);
        let proof = prove(&f, &SelectionConfig::full(), &seed_one());
        let bytes = proof.to_bytes();

        let reject = |b: &[u8]| {
            assert!(matches!(
                SurjectionProof::from_bytes(b),
                Err(ZkpError::InvalidEncoding(_))
            ));
        };

        reject(&[]);
        reject(&bytes[..bytes.len() - 1]);

        let mut extra = bytes.clone();
        extra.push(0);
        reject(&extra);

        let mut version = bytes.clone();
        version[0] = 0x02;
        reject(&version);

        // Declared count disagrees with the bitmap
        let mut count = bytes.clone();
        count[4] = 2;
        reject(&count);

        // Bitmap clears an input but the payload still has three responses
        let mut bitmap = bytes.clone();
        bitmap[3] = 0b0000_0011;
        reject(&bitmap);
    }

    #[test]
    fn test_text_and_serde_forms() {
        let f = fixture(&[1, 2], 1);
        let proof = prove(&f, &SelectionConfig::default(), &seed_one());

        let text = proof.to_string();
        assert_eq!(text.parse::<SurjectionProof>().unwrap(), proof);
        assert!("zz".parse::<SurjectionProof>().is_err());

        let json = serde_json::to_string(&proof).unwrap();
        let back: SurjectionProof = serde_json::from_str(&json).unwrap();
        assert_eq!(back, proof);
        assert!(back.verify(&f.ctx, &f.inputs, &f.output));
    }

    #[test]
    fn test_single_input_ring() {
        let f = fixture(&[4], 4);
        let proof = prove(&f, &SelectionConfig::minimal(), &seed_one());
        assert_eq!(proof.n_used_inputs(), 1);
        assert!(proof.verify(&f.ctx, &f.inputs, &f.output));
    }
}
