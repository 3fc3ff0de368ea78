//! Seeded anonymity-set selection.

use log::{debug, trace};
use sha2::{Digest, Sha256};

use super::SelectionConfig;
use crate::error::{Result, ZkpError};

/// Deterministic word stream: each SHA-256 state yields four little-endian
/// u64 words, then the state is hashed again. The seed itself is hashed
/// before the first draw.
pub(crate) struct SeedStream {
    state: [u8; 32],
    offset: usize,
}

impl SeedStream {
    const WORDS_PER_STATE: usize = 4;

    pub(crate) fn new(seed: &[u8; 32]) -> Self {
        Self {
            state: *seed,
            offset: Self::WORDS_PER_STATE,
        }
    }

    pub(crate) fn next_u64(&mut self) -> u64 {
        if self.offset == Self::WORDS_PER_STATE {
            self.state = Sha256::digest(self.state).into();
            self.offset = 0;
        }
        let start = self.offset * 8;
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.state[start..start + 8]);
        self.offset += 1;
        u64::from_le_bytes(word)
    }

    /// Uniform draw from `[0, bound)` by masking and rejecting. `bound > 0`.
    pub(crate) fn next_below(&mut self, bound: u64) -> u64 {
        debug_assert!(bound > 0);
        let mask = bound.next_power_of_two() - 1;
        loop {
            let candidate = self.next_u64() & mask;
            if candidate < bound {
                return candidate;
            }
        }
    }
}

/// Draws `k` distinct indices from `[0, n)` with a partial Fisher-Yates
/// shuffle. The result is in draw order.
pub(crate) fn draw_subset(stream: &mut SeedStream, n: usize, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let k = k.min(n);
    for i in 0..k {
        let remaining = (n - i) as u64;
        let j = i + stream.next_below(remaining) as usize;
        indices.swap(i, j);
    }
    indices.truncate(k);
    indices
}

/// Picks the anonymity set for a proof.
///
/// `matching[i]` tells whether candidate `i` carries the output tag. Returns
/// the chosen subset sorted ascending, together with the smallest matching
/// candidate index inside it.
pub(crate) fn select_inputs(
    matching: &[bool],
    config: &SelectionConfig,
    seed: &[u8; 32],
) -> Result<(Vec<usize>, usize)> {
    if !matching.iter().any(|&m| m) {
        return Err(ZkpError::NoMatchingInput);
    }

    let n = matching.len();
    let k = config.anonymity_set_size.min(n);
    let mut stream = SeedStream::new(seed);

    for iteration in 0..config.max_iterations {
        let mut subset = draw_subset(&mut stream, n, k);
        subset.sort_unstable();

        if let Some(&input_index) = subset.iter().find(|&&i| matching[i]) {
            debug!(
                "Selected {} of {} inputs after {} iteration(s)",
                subset.len(),
                n,
                iteration + 1
            );
            return Ok((subset, input_index));
        }
        trace!("Subset {:?} has no matching input, redrawing", subset);
    }

    Err(ZkpError::ExhaustedIterations {
        iterations: config.max_iterations,
    })
}
