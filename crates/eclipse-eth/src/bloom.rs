// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Probe view over a header's 2048-bit logs bloom.
//!
//! The probe is only a pre-filter: a positive answer must be confirmed by
//! rebuilding the receipts trie root, while a negative answer is final
//! (bloom filters have no false negatives).

use alloy_primitives::B256;

/// Bits in an Ethereum logs bloom.
pub const BLOOM_BIT_SIZE: usize = 2048;

/// Bytes in an Ethereum logs bloom.
pub const BLOOM_BYTE_SIZE: usize = BLOOM_BIT_SIZE / 8;

/// Borrowed view over a 256-byte logs bloom.
#[derive(Clone, Copy, Debug)]
pub struct BloomFilter<'a> {
    bytes: &'a [u8; BLOOM_BYTE_SIZE],
}

impl<'a> BloomFilter<'a> {
    /// Wrap a logs-bloom field.
    pub fn new(bytes: &'a [u8; BLOOM_BYTE_SIZE]) -> Self {
        Self { bytes }
    }

    /// Check the three probe bits derived from a Keccak-256 digest.
    ///
    /// Each of the byte pairs `(0,1)`, `(2,3)`, `(4,5)` yields an 11-bit
    /// index; the byte order into the filter is the Ethereum convention
    /// `256 - ((pair & 0x7ff) >> 3) - 1`, with the low three bits of the
    /// pair selecting the bit within the byte.
    pub fn contains_hash(&self, hash: &B256) -> bool {
        let h = hash.as_slice();

        let v1 = 1u8 << (h[1] & 0x07);
        let v2 = 1u8 << (h[3] & 0x07);
        let v3 = 1u8 << (h[5] & 0x07);

        let i1 = byte_index(h[0], h[1]);
        let i2 = byte_index(h[2], h[3]);
        let i3 = byte_index(h[4], h[5]);

        (self.bytes[i1] & v1 != 0) && (self.bytes[i2] & v2 != 0) && (self.bytes[i3] & v3 != 0)
    }

    /// True iff every digest probes positive.
    pub fn contains_all<'h, I>(&self, hashes: I) -> bool
    where
        I: IntoIterator<Item = &'h B256>,
    {
        hashes.into_iter().all(|h| self.contains_hash(h))
    }

    /// Number of set bits; a rough load indicator.
    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Number of clear bits.
    pub fn count_zeros(&self) -> usize {
        BLOOM_BIT_SIZE - self.count_ones()
    }
}

fn byte_index(hi: u8, lo: u8) -> usize {
    let pair = (hi as usize) << 8 | lo as usize;
    BLOOM_BYTE_SIZE - ((pair & 0x7ff) >> 3) - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Bloom, BloomInput};

    #[test]
    fn empty_bloom_contains_nothing() {
        let bytes = [0u8; BLOOM_BYTE_SIZE];
        let bloom = BloomFilter::new(&bytes);
        assert!(!bloom.contains_hash(&keccak256(b"anything")));
        assert_eq!(bloom.count_ones(), 0);
        assert_eq!(bloom.count_zeros(), BLOOM_BIT_SIZE);
    }

    #[test]
    fn full_bloom_contains_everything() {
        let bytes = [0xFF; BLOOM_BYTE_SIZE];
        let bloom = BloomFilter::new(&bytes);
        assert!(bloom.contains_hash(&keccak256(b"anything")));
        assert_eq!(bloom.count_zeros(), 0);
    }

    #[test]
    fn no_false_negatives_against_reference_accrual() {
        // alloy's Bloom::accrue implements the same m3:2048 scheme the
        // chain uses, so anything accrued there must probe positive here.
        let inputs: Vec<&[u8]> = vec![
            b"contract address bytes..",
            b"topic-0",
            b"topic-1",
            &[0u8; 20],
            &[0xFF; 32],
        ];
        let mut reference = Bloom::ZERO;
        for input in &inputs {
            reference.accrue(BloomInput::Raw(input));
        }
        let bloom = BloomFilter::new(&reference.0 .0);
        for input in &inputs {
            assert!(bloom.contains_hash(&keccak256(input)));
        }
        let hashes: Vec<B256> = inputs.iter().map(|i| keccak256(i)).collect();
        assert!(bloom.contains_all(hashes.iter()));
    }

    #[test]
    fn one_missing_hash_fails_contains_all() {
        let mut reference = Bloom::ZERO;
        reference.accrue(BloomInput::Raw(b"present"));
        let bloom = BloomFilter::new(&reference.0 .0);
        let hashes = [keccak256(b"present"), keccak256(b"absent")];
        assert!(!bloom.contains_all(hashes.iter()));
    }
}
