// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Monitor identity and attestable security state.
//!
//! Both records cross a trust boundary: a verifier re-derives its view of
//! the monitor from these bytes. They serialize as an RLP list of
//! `[key, value]` pairs with a fixed key order and every field always
//! present, so the encoding of a given state is unique and byte-stable.

use alloy_primitives::B256;

use crate::{config::MonitorConfig, error::CoreError, platform::EntropySource};

/// Length of a monitor session ID in bytes.
pub const SESSION_ID_LEN: usize = 16;

/// Fixed session ID for development builds.
///
/// `0x52fdfc072182654f163f5f0f9a621d72`. Never use in production.
#[cfg(feature = "dev-session-id")]
pub const DEV_SESSION_ID: [u8; SESSION_ID_LEN] = [
    0x52, 0xfd, 0xfc, 0x07, 0x21, 0x82, 0x65, 0x4f, //
    0x16, 0x3f, 0x5f, 0x0f, 0x9a, 0x62, 0x1d, 0x72,
];

/// Identity of one monitor process runtime.
///
/// The session ID is random per instance and is not itself security
/// critical; it lets a verifier tell two monitor runs apart and is bound
/// into the sync-message event topics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonitorId {
    session_id: [u8; SESSION_ID_LEN],
}

impl MonitorId {
    /// Draw a fresh random session ID.
    #[cfg(not(feature = "dev-session-id"))]
    pub fn generate(entropy: &dyn EntropySource) -> Self {
        let mut session_id = [0u8; SESSION_ID_LEN];
        entropy.fill_bytes(&mut session_id);
        Self { session_id }
    }

    /// Development build: fixed session ID.
    #[cfg(feature = "dev-session-id")]
    pub fn generate(_entropy: &dyn EntropySource) -> Self {
        Self {
            session_id: DEV_SESSION_ID,
        }
    }

    /// Build an identity from existing session ID bytes.
    pub fn from_session_id(bytes: &[u8]) -> Result<Self, CoreError> {
        let session_id = <[u8; SESSION_ID_LEN]>::try_from(bytes)
            .map_err(|_| CoreError::SessionIdLength(bytes.len()))?;
        Ok(Self { session_id })
    }

    /// The 16-byte session ID.
    pub fn session_id(&self) -> &[u8; SESSION_ID_LEN] {
        &self.session_id
    }

    /// Serialize for attestation.
    pub fn to_attested_bytes(&self) -> Vec<u8> {
        let mut w = KvWriter::new();
        w.pair_bytes("sessionID", &self.session_id);
        w.finish()
    }

    /// Deserialize from attested bytes.
    pub fn from_attested_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = KvReader::new(bytes)?;
        let session_id = r.expect_bytes("sessionID")?;
        Self::from_session_id(&session_id)
    }
}

/// Security-relevant monitor state that a verifier can attest.
///
/// `checkpoint_num` is kept as the raw big-endian byte string lifted from
/// the header's RLP number field (variable length), not as a fixed-width
/// integer, so the attested bytes match the chain encoding exactly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonitorSecState {
    /// Secure version number of the running monitor.
    pub svn: u32,
    /// Hash of the genesis block, recorded during the first bootstrap phase.
    pub genesis_hash: B256,
    /// Count of completed checkpoint windows. The window containing the
    /// genesis block is number 0.
    pub checkpoint_iter: u64,
    /// Hash of the last block in the current checkpoint window.
    pub checkpoint_hash: B256,
    /// Raw RLP number bytes of the block behind `checkpoint_hash`.
    pub checkpoint_num: Vec<u8>,
}

impl MonitorSecState {
    /// Fresh state for a given secure version number.
    pub fn new(svn: u32) -> Self {
        Self {
            svn,
            ..Self::default()
        }
    }

    /// Serialize for attestation.
    pub fn to_attested_bytes(&self) -> Vec<u8> {
        let mut w = KvWriter::new();
        w.pair_u32("SVN", self.svn);
        w.pair_bytes("genesisHash", self.genesis_hash.as_slice());
        w.pair_u64("checkpointIter", self.checkpoint_iter);
        w.pair_bytes("checkpointHash", self.checkpoint_hash.as_slice());
        w.pair_bytes("checkpointNum", &self.checkpoint_num);
        w.finish()
    }

    /// Deserialize from attested bytes. Fails if any field is missing or
    /// out of order.
    pub fn from_attested_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = KvReader::new(bytes)?;
        let svn = r.expect_u64("SVN")? as u32;
        let genesis_hash = r.expect_hash("genesisHash")?;
        let checkpoint_iter = r.expect_u64("checkpointIter")?;
        let checkpoint_hash = r.expect_hash("checkpointHash")?;
        let checkpoint_num = r.expect_bytes("checkpointNum")?;
        Ok(Self {
            svn,
            genesis_hash,
            checkpoint_iter,
            checkpoint_hash,
            checkpoint_num,
        })
    }
}

impl MonitorConfig {
    /// Serialize for attestation.
    pub fn to_attested_bytes(&self) -> Vec<u8> {
        let mut w = KvWriter::new();
        w.pair_u32("SVN", self.svn);
        w.pair_str("chainName", &self.chain_name);
        w.pair_u64("checkpointSize", self.checkpoint_size);
        w.pair_u8("minDiffPercent", self.min_diff_percent);
        w.pair_u64("maxWaitTime", self.max_wait_time);
        w.pair_u64("syncMaxWaitTime", self.sync_max_wait_time);
        w.finish()
    }

    /// Deserialize from attested bytes. Fails if any field is missing or
    /// out of order.
    pub fn from_attested_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut r = KvReader::new(bytes)?;
        let svn = r.expect_u64("SVN")? as u32;
        let chain_name = r.expect_str("chainName")?;
        let checkpoint_size = r.expect_u64("checkpointSize")?;
        let min_diff_percent = r.expect_u64("minDiffPercent")?;
        let max_wait_time = r.expect_u64("maxWaitTime")?;
        let sync_max_wait_time = r.expect_u64("syncMaxWaitTime")?;
        if min_diff_percent > u8::MAX as u64 {
            return Err(CoreError::FieldShape("minDiffPercent"));
        }
        Ok(Self {
            svn,
            chain_name,
            checkpoint_size,
            min_diff_percent: min_diff_percent as u8,
            max_wait_time,
            sync_max_wait_time,
        })
    }
}

/// Writer for the `[key, value]` pair list encoding.
struct KvWriter {
    payload: Vec<u8>,
}

impl KvWriter {
    fn new() -> Self {
        Self {
            payload: Vec::new(),
        }
    }

    fn pair(&mut self, key: &str, value_rlp: &[u8]) {
        let mut pair = Vec::with_capacity(1 + key.len() + value_rlp.len());
        encode_bytes(key.as_bytes(), &mut pair);
        pair.extend_from_slice(value_rlp);
        alloy_rlp::Header {
            list: true,
            payload_length: pair.len(),
        }
        .encode(&mut self.payload);
        self.payload.extend_from_slice(&pair);
    }

    fn pair_bytes(&mut self, key: &str, value: &[u8]) {
        let mut v = Vec::with_capacity(1 + value.len());
        encode_bytes(value, &mut v);
        self.pair(key, &v);
    }

    fn pair_str(&mut self, key: &str, value: &str) {
        self.pair_bytes(key, value.as_bytes());
    }

    fn pair_u64(&mut self, key: &str, value: u64) {
        self.pair(key, &alloy_rlp::encode(value));
    }

    fn pair_u32(&mut self, key: &str, value: u32) {
        self.pair(key, &alloy_rlp::encode(value));
    }

    fn pair_u8(&mut self, key: &str, value: u8) {
        self.pair(key, &alloy_rlp::encode(value));
    }

    fn finish(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload.len() + 4);
        alloy_rlp::Header {
            list: true,
            payload_length: self.payload.len(),
        }
        .encode(&mut out);
        out.extend_from_slice(&self.payload);
        out
    }
}

/// Reader for the `[key, value]` pair list encoding. Pairs must arrive in
/// the exact order the corresponding writer produced them.
struct KvReader<'a> {
    payload: &'a [u8],
}

impl<'a> KvReader<'a> {
    fn new(mut buf: &'a [u8]) -> Result<Self, CoreError> {
        let header = alloy_rlp::Header::decode(&mut buf)?;
        if !header.list || buf.len() != header.payload_length {
            return Err(CoreError::Rlp(alloy_rlp::Error::UnexpectedString));
        }
        Ok(Self { payload: buf })
    }

    /// Open the next pair, check its key, and return the raw value RLP.
    fn next_value(&mut self, key: &'static str) -> Result<&'a [u8], CoreError> {
        if self.payload.is_empty() {
            return Err(CoreError::FieldMissing(key));
        }
        let pair_header = alloy_rlp::Header::decode(&mut self.payload)?;
        if !pair_header.list || self.payload.len() < pair_header.payload_length {
            return Err(CoreError::FieldShape(key));
        }
        let (mut pair, rest) = self.payload.split_at(pair_header.payload_length);
        self.payload = rest;

        let got_key = decode_bytes(&mut pair).map_err(CoreError::Rlp)?;
        if got_key != key.as_bytes() {
            return Err(CoreError::FieldMissing(key));
        }
        Ok(pair)
    }

    fn expect_bytes(&mut self, key: &'static str) -> Result<Vec<u8>, CoreError> {
        let mut value = self.next_value(key)?;
        let bytes = decode_bytes(&mut value).map_err(CoreError::Rlp)?;
        Ok(bytes.to_vec())
    }

    fn expect_str(&mut self, key: &'static str) -> Result<String, CoreError> {
        let bytes = self.expect_bytes(key)?;
        String::from_utf8(bytes).map_err(|_| CoreError::FieldShape(key))
    }

    fn expect_u64(&mut self, key: &'static str) -> Result<u64, CoreError> {
        let bytes = self.expect_bytes(key)?;
        if bytes.len() > 8 || bytes.first() == Some(&0) {
            return Err(CoreError::FieldShape(key));
        }
        Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
    }

    fn expect_hash(&mut self, key: &'static str) -> Result<B256, CoreError> {
        let bytes = self.expect_bytes(key)?;
        if bytes.len() != 32 {
            return Err(CoreError::FieldShape(key));
        }
        Ok(B256::from_slice(&bytes))
    }
}

/// RLP-encode one byte string, including the single-byte short form.
fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    if bytes.len() == 1 && bytes[0] < 0x80 {
        out.push(bytes[0]);
    } else {
        alloy_rlp::Header {
            list: false,
            payload_length: bytes.len(),
        }
        .encode(out);
        out.extend_from_slice(bytes);
    }
}

/// Decode one RLP byte string from the front of `buf`.
fn decode_bytes<'a>(buf: &mut &'a [u8]) -> Result<&'a [u8], alloy_rlp::Error> {
    let header = alloy_rlp::Header::decode(buf)?;
    if header.list {
        return Err(alloy_rlp::Error::UnexpectedList);
    }
    if buf.len() < header.payload_length {
        return Err(alloy_rlp::Error::InputTooShort);
    }
    let (bytes, rest) = buf.split_at(header.payload_length);
    *buf = rest;
    Ok(bytes)
}
