// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! One parsed block header.
//!
//! The monitor hashes the exact bytes it received, so [`HeaderEntry`] keeps
//! the raw RLP alongside the typed fields and guarantees the two agree.

use alloy_primitives::{b256, keccak256, B256};

use crate::{bloom::BloomFilter, error::HeaderError};

/// Keccak-256 of the RLP encoding of an empty uncle list. A header whose
/// `sha3Uncles` field equals this value has no uncles; this is the only
/// supported test for "has uncles".
pub const EMPTY_UNCLES_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Field count of a pre-London header; every known layout extends it.
pub const MIN_HEADER_FIELDS: usize = 15;

const PARENT_HASH_IDX: usize = 0;
const UNCLES_HASH_IDX: usize = 1;
const TXS_ROOT_IDX: usize = 4;
const RECEIPTS_ROOT_IDX: usize = 5;
const LOGS_BLOOM_IDX: usize = 6;
const DIFFICULTY_IDX: usize = 7;
const NUMBER_IDX: usize = 8;
const TIMESTAMP_IDX: usize = 11;

const BLOOM_LEN: usize = 256;
const HASH_LEN: usize = 32;

/// A block header parsed from raw RLP bytes, plus the trusted time it was
/// received (zero for headers loaded during the first bootstrap phase).
///
/// Invariant: the typed fields always agree with the stored RLP. The hash
/// is the Keccak-256 of the bytes as received and is *not* recomputed by
/// the setters; those exist to shape synthetic headers for next-block
/// difficulty estimation, which never hash.
#[derive(Clone, Debug)]
pub struct HeaderEntry {
    raw: Vec<u8>,
    fields: Vec<Vec<u8>>,
    trusted_time: u64,
    hash: B256,
    number: u64,
    time: u64,
    difficulty: u64,
    has_uncle: bool,
    bloom: Box<[u8; BLOOM_LEN]>,
}

impl HeaderEntry {
    /// Parse a raw RLP header. `trusted_time` is the trusted-clock reading
    /// at receipt, or zero for historical (bootstrap) headers.
    pub fn from_rlp(raw: &[u8], trusted_time: u64) -> Result<Self, HeaderError> {
        let fields = split_fields(raw)?;
        if fields.len() < MIN_HEADER_FIELDS {
            return Err(HeaderError::TooFewFields(fields.len()));
        }
        for (idx, expected) in [
            (PARENT_HASH_IDX, HASH_LEN),
            (UNCLES_HASH_IDX, HASH_LEN),
            (TXS_ROOT_IDX, HASH_LEN),
            (RECEIPTS_ROOT_IDX, HASH_LEN),
            (LOGS_BLOOM_IDX, BLOOM_LEN),
        ] {
            if fields[idx].len() != expected {
                return Err(HeaderError::FieldLength {
                    index: idx,
                    got: fields[idx].len(),
                    expected,
                });
            }
        }

        let number = parse_u64(&fields, NUMBER_IDX)?;
        let time = parse_u64(&fields, TIMESTAMP_IDX)?;
        let difficulty = parse_u64(&fields, DIFFICULTY_IDX)?;
        let has_uncle = fields[UNCLES_HASH_IDX] != EMPTY_UNCLES_HASH.as_slice();

        let mut bloom = Box::new([0u8; BLOOM_LEN]);
        bloom.copy_from_slice(&fields[LOGS_BLOOM_IDX]);

        Ok(Self {
            raw: raw.to_vec(),
            fields,
            trusted_time,
            hash: keccak256(raw),
            number,
            time,
            difficulty,
            has_uncle,
            bloom,
        })
    }

    /// An all-zero header used as scaffolding for next-block difficulty
    /// estimation. Its hash is zero; it must never enter the fork tree.
    pub fn synthetic() -> Self {
        let mut fields = vec![Vec::new(); MIN_HEADER_FIELDS];
        fields[PARENT_HASH_IDX] = vec![0; HASH_LEN];
        fields[UNCLES_HASH_IDX] = EMPTY_UNCLES_HASH.to_vec();
        fields[TXS_ROOT_IDX] = vec![0; HASH_LEN];
        fields[RECEIPTS_ROOT_IDX] = vec![0; HASH_LEN];
        fields[LOGS_BLOOM_IDX] = vec![0; BLOOM_LEN];
        let raw = encode_field_list(&fields);
        Self {
            raw,
            fields,
            trusted_time: 0,
            hash: B256::ZERO,
            number: 0,
            time: 0,
            difficulty: 0,
            has_uncle: false,
            bloom: Box::new([0u8; BLOOM_LEN]),
        }
    }

    /// The header RLP. For parsed headers this starts out as the exact
    /// bytes received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Keccak-256 of the bytes as received (the block hash).
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Trusted-clock reading at receipt; zero for bootstrap headers.
    pub fn trusted_time(&self) -> u64 {
        self.trusted_time
    }

    /// Block number.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Raw big-endian number bytes, exactly as they appear in the RLP.
    pub fn number_bytes(&self) -> &[u8] {
        &self.fields[NUMBER_IDX]
    }

    /// Block timestamp.
    pub fn time(&self) -> u64 {
        self.time
    }

    /// Block difficulty (zero for post-Merge blocks).
    pub fn difficulty(&self) -> u64 {
        self.difficulty
    }

    /// Whether the header's `sha3Uncles` differs from the empty-list hash.
    pub fn has_uncle(&self) -> bool {
        self.has_uncle
    }

    /// The claimed parent hash.
    pub fn parent_hash(&self) -> B256 {
        B256::from_slice(&self.fields[PARENT_HASH_IDX])
    }

    /// The claimed receipts trie root.
    pub fn receipts_root(&self) -> B256 {
        B256::from_slice(&self.fields[RECEIPTS_ROOT_IDX])
    }

    /// The claimed transactions trie root.
    pub fn transactions_root(&self) -> B256 {
        B256::from_slice(&self.fields[TXS_ROOT_IDX])
    }

    /// The 256-byte logs bloom.
    pub fn logs_bloom(&self) -> &[u8; BLOOM_LEN] {
        &self.bloom
    }

    /// Bloom probe view over the logs bloom.
    pub fn bloom(&self) -> BloomFilter<'_> {
        BloomFilter::new(&self.bloom)
    }

    /// Overwrite the block number, keeping typed and RLP forms in step.
    pub fn set_number(&mut self, number: u64) {
        self.number = number;
        self.fields[NUMBER_IDX] = be_minimal(number);
        self.reencode();
    }

    /// Overwrite the timestamp, keeping typed and RLP forms in step.
    pub fn set_time(&mut self, time: u64) {
        self.time = time;
        self.fields[TIMESTAMP_IDX] = be_minimal(time);
        self.reencode();
    }

    /// Overwrite the difficulty, keeping typed and RLP forms in step.
    pub fn set_difficulty(&mut self, difficulty: u64) {
        self.difficulty = difficulty;
        self.fields[DIFFICULTY_IDX] = be_minimal(difficulty);
        self.reencode();
    }

    /// Overwrite the uncles hash, keeping typed and RLP forms in step.
    pub fn set_uncles_hash(&mut self, hash: B256) {
        self.has_uncle = hash != EMPTY_UNCLES_HASH;
        self.fields[UNCLES_HASH_IDX] = hash.to_vec();
        self.reencode();
    }

    fn reencode(&mut self) {
        self.raw = encode_field_list(&self.fields);
    }
}

/// Split a header RLP into its raw field payloads. Every field of an
/// Ethereum header is a byte string; nested lists are rejected.
fn split_fields(raw: &[u8]) -> Result<Vec<Vec<u8>>, HeaderError> {
    let mut buf = raw;
    let header = alloy_rlp::Header::decode(&mut buf)?;
    if !header.list {
        return Err(HeaderError::NotAList);
    }
    if buf.len() != header.payload_length {
        return Err(HeaderError::TrailingBytes);
    }

    let mut fields = Vec::with_capacity(MIN_HEADER_FIELDS);
    let mut payload = buf;
    while !payload.is_empty() {
        let field = alloy_rlp::Header::decode(&mut payload)?;
        if field.list {
            return Err(HeaderError::NestedListField(fields.len()));
        }
        if payload.len() < field.payload_length {
            return Err(HeaderError::Rlp(alloy_rlp::Error::InputTooShort));
        }
        let (bytes, rest) = payload.split_at(field.payload_length);
        fields.push(bytes.to_vec());
        payload = rest;
    }
    Ok(fields)
}

fn encode_field_list(fields: &[Vec<u8>]) -> Vec<u8> {
    let mut payload = Vec::new();
    for field in fields {
        if field.len() == 1 && field[0] < 0x80 {
            payload.push(field[0]);
        } else {
            alloy_rlp::Header {
                list: false,
                payload_length: field.len(),
            }
            .encode(&mut payload);
            payload.extend_from_slice(field);
        }
    }
    let mut out = Vec::with_capacity(payload.len() + 4);
    alloy_rlp::Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

fn parse_u64(fields: &[Vec<u8>], idx: usize) -> Result<u64, HeaderError> {
    let bytes = &fields[idx];
    if bytes.len() > 8 {
        return Err(HeaderError::IntegerTooWide(idx, bytes.len()));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}

fn be_minimal(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

/// Test-only raw header builder shared across the crate's unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Build a minimal 15-field header RLP.
    pub(crate) fn build_header(
        parent_hash: B256,
        uncles_hash: B256,
        number: u64,
        time: u64,
        difficulty: u64,
        bloom: &[u8; 256],
        receipts_root: B256,
    ) -> Vec<u8> {
        let mut fields = vec![Vec::new(); MIN_HEADER_FIELDS];
        fields[PARENT_HASH_IDX] = parent_hash.to_vec();
        fields[UNCLES_HASH_IDX] = uncles_hash.to_vec();
        fields[TXS_ROOT_IDX] = vec![0; 32];
        fields[RECEIPTS_ROOT_IDX] = receipts_root.to_vec();
        fields[LOGS_BLOOM_IDX] = bloom.to_vec();
        fields[DIFFICULTY_IDX] = be_minimal(difficulty);
        fields[NUMBER_IDX] = be_minimal(number);
        fields[TIMESTAMP_IDX] = be_minimal(time);
        encode_field_list(&fields)
    }
}
