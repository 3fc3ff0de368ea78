//! Wire helpers: the inclusion bitmap and CompactSize integers.

use crate::error::{Result, ZkpError};

use super::MAX_INPUTS;

/// Which of the `n_inputs` candidates belong to the anonymity set.
///
/// Bit `i` lives in byte `i / 8` at position `i % 8` (LSB first). Bits past
/// `n_inputs` are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InputBitmap {
    n_inputs: usize,
    bits: Vec<u8>,
}

impl InputBitmap {
    pub(crate) fn from_indices(n_inputs: usize, indices: &[usize]) -> Self {
        let mut bits = vec![0u8; bitmap_len(n_inputs)];
        for &i in indices {
            debug_assert!(i < n_inputs);
            bits[i / 8] |= 1 << (i % 8);
        }
        Self { n_inputs, bits }
    }

    pub(crate) fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    pub(crate) fn contains(&self, index: usize) -> bool {
        index < self.n_inputs && self.bits[index / 8] & (1 << (index % 8)) != 0
    }

    pub(crate) fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Set indices in ascending order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.n_inputs).filter(move |&i| self.contains(i))
    }

    /// Bytes written by [`InputBitmap::write`].
    pub(crate) fn encoded_len(&self) -> usize {
        2 + self.bits.len()
    }

    /// `N (u16 LE) || bitmap`.
    pub(crate) fn write(&self, out: &mut Vec<u8>) {
        // n_inputs <= MAX_INPUTS always fits
        out.extend_from_slice(&(self.n_inputs as u16).to_le_bytes());
        out.extend_from_slice(&self.bits);
    }

    /// Parses `N || bitmap` from the front of `bytes`, returning the bitmap
    /// and the number of bytes consumed.
    pub(crate) fn read(bytes: &[u8]) -> Result<(Self, usize)> {
        let n_bytes: [u8; 2] = bytes
            .get(..2)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| ZkpError::InvalidEncoding("truncated input count".into()))?;
        let n_inputs = u16::from_le_bytes(n_bytes) as usize;
        if n_inputs == 0 || n_inputs > MAX_INPUTS {
            return Err(ZkpError::InvalidEncoding(format!(
                "input count {n_inputs} outside 1..={MAX_INPUTS}"
            )));
        }

        let len = bitmap_len(n_inputs);
        let bits = bytes
            .get(2..2 + len)
            .ok_or_else(|| ZkpError::InvalidEncoding("truncated bitmap".into()))?
            .to_vec();

        let padding = len * 8 - n_inputs;
        if padding > 0 && bits[len - 1] >> (8 - padding) != 0 {
            return Err(ZkpError::InvalidEncoding(
                "bitmap padding bits are set".into(),
            ));
        }

        let bitmap = Self { n_inputs, bits };
        if bitmap.count() == 0 {
            return Err(ZkpError::InvalidEncoding("bitmap selects no inputs".into()));
        }
        Ok((bitmap, 2 + len))
    }
}

pub(crate) fn bitmap_len(n_inputs: usize) -> usize {
    n_inputs.div_ceil(8)
}

/// Length of the CompactSize encoding of `value`.
pub(crate) fn compact_size_len(value: u64) -> usize {
    match value {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Bitcoin CompactSize: one byte below 0xfd, otherwise a marker byte
/// (0xfd/0xfe/0xff) followed by a 2/4/8-byte little-endian integer.
pub(crate) fn write_compact_size(out: &mut Vec<u8>, value: u64) {
    match compact_size_len(value) {
        1 => out.push(value as u8),
        3 => {
            out.push(0xfd);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        5 => {
            out.push(0xfe);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Reads a CompactSize from the front of `bytes`. Non-minimal encodings are
/// rejected.
pub(crate) fn read_compact_size(bytes: &[u8]) -> Result<(u64, usize)> {
    let truncated = || ZkpError::InvalidEncoding("truncated compact size".into());
    let (&marker, rest) = bytes.split_first().ok_or_else(truncated)?;

    let (value, len) = match marker {
        0xfd => {
            let raw: [u8; 2] = rest.get(..2).and_then(|b| b.try_into().ok()).ok_or_else(truncated)?;
            (u64::from(u16::from_le_bytes(raw)), 3)
        }
        0xfe => {
            let raw: [u8; 4] = rest.get(..4).and_then(|b| b.try_into().ok()).ok_or_else(truncated)?;
            (u64::from(u32::from_le_bytes(raw)), 5)
        }
        0xff => {
            let raw: [u8; 8] = rest.get(..8).and_then(|b| b.try_into().ok()).ok_or_else(truncated)?;
            (u64::from_le_bytes(raw), 9)
        }
        small => (u64::from(small), 1),
    };

    if compact_size_len(value) != len {
        return Err(ZkpError::InvalidEncoding(format!(
            "non-canonical compact size for {value}"
        )));
    }
    Ok((value, len))
}
