// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for the monitor end-to-end tests: a settable trusted
//! clock, deterministic entropy, raw header/receipt builders, and a
//! harness wiring a `Monitor` to recording callbacks.

#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use alloy_primitives::{Address, Bloom, BloomInput, B256};
use eclipse_core::{
    platform::{EntropySource, TrustedClock},
    MonitorConfig,
};
use eclipse_eth::{header::EMPTY_UNCLES_HASH, Monitor, Network, ReceiptSet};

/// Sync contract address used by every harness monitor.
pub const SYNC_ADDR: Address = Address::repeat_byte(0xC0);

/// Sync event signature used by every harness monitor.
pub const SYNC_SIGN: B256 = B256::repeat_byte(0xE0);

/// A trusted clock the test can move forward.
#[derive(Clone, Default)]
pub struct TestClock(Arc<AtomicU64>);

impl TestClock {
    pub fn set(&self, now: u64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn now(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

impl TrustedClock for TestClock {
    fn now_in_sec(&self) -> u64 {
        self.now()
    }
}

/// Deterministic entropy: every draw fills with a fresh counter value.
#[derive(Clone, Default)]
pub struct TestEntropy(Arc<AtomicU64>);

impl EntropySource for TestEntropy {
    fn fill_bytes(&self, buf: &mut [u8]) {
        let round = self.0.fetch_add(1, Ordering::SeqCst) as u8;
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = round.wrapping_add(i as u8);
        }
    }
}

fn rlp_bytes(data: &[u8], out: &mut Vec<u8>) {
    if data.len() == 1 && data[0] < 0x80 {
        out.push(data[0]);
    } else {
        alloy_rlp::Header {
            list: false,
            payload_length: data.len(),
        }
        .encode(out);
        out.extend_from_slice(data);
    }
}

fn rlp_list(payload: Vec<u8>) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 4);
    alloy_rlp::Header {
        list: true,
        payload_length: payload.len(),
    }
    .encode(&mut out);
    out.extend_from_slice(&payload);
    out
}

fn be_minimal(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

/// Raw 15-field header RLP.
pub fn build_header(
    parent_hash: B256,
    number: u64,
    time: u64,
    difficulty: u64,
    bloom: &[u8; 256],
    receipts_root: B256,
) -> Vec<u8> {
    let mut fields: Vec<Vec<u8>> = vec![Vec::new(); 15];
    fields[0] = parent_hash.to_vec();
    fields[1] = EMPTY_UNCLES_HASH.to_vec();
    fields[4] = vec![0; 32];
    fields[5] = receipts_root.to_vec();
    fields[6] = bloom.to_vec();
    fields[7] = be_minimal(difficulty);
    fields[8] = be_minimal(number);
    fields[11] = be_minimal(time);

    let mut payload = Vec::new();
    for field in &fields {
        rlp_bytes(field, &mut payload);
    }
    rlp_list(payload)
}

/// Raw legacy receipt `[1, 0, zeroBloom, logs]`.
pub fn build_receipt(logs: &[(Address, Vec<B256>, Vec<u8>)]) -> Vec<u8> {
    let mut logs_payload = Vec::new();
    for (address, topics, data) in logs {
        let mut topics_payload = Vec::new();
        for topic in topics {
            rlp_bytes(topic.as_slice(), &mut topics_payload);
        }
        let mut log_payload = Vec::new();
        rlp_bytes(address.as_slice(), &mut log_payload);
        log_payload.extend_from_slice(&rlp_list(topics_payload));
        rlp_bytes(data, &mut log_payload);
        logs_payload.extend_from_slice(&rlp_list(log_payload));
    }

    let mut payload = Vec::new();
    rlp_bytes(&[1], &mut payload);
    rlp_bytes(&[], &mut payload);
    rlp_bytes(&[0u8; 256], &mut payload);
    payload.extend_from_slice(&rlp_list(logs_payload));
    rlp_list(payload)
}

/// Receipts root the header must claim for the given raw receipts.
pub fn receipts_root_of(raw_receipts: &[Vec<u8>]) -> B256 {
    ReceiptSet::from_raw_list(raw_receipts).unwrap().root()
}

/// A logs bloom accruing each raw input.
pub fn bloom_with(inputs: &[&[u8]]) -> [u8; 256] {
    let mut bloom = Bloom::ZERO;
    for input in inputs {
        bloom.accrue(BloomInput::Raw(input));
    }
    bloom.0 .0
}

/// A monitor wired to recording callbacks and a programmable receipts
/// store.
pub struct Harness {
    pub monitor: Monitor,
    pub clock: TestClock,
    /// Block numbers passed to the validated-header callback.
    pub validated: Arc<Mutex<Vec<u64>>>,
    /// Block numbers passed to the confirmed-header callback.
    pub confirmed: Arc<Mutex<Vec<u64>>>,
    /// Raw receipts served per block number.
    pub receipts: Arc<Mutex<HashMap<u64, Vec<Vec<u8>>>>>,
}

impl Harness {
    pub fn new(network: Network, checkpoint_size: u64, max_wait_time: u64) -> Self {
        let config = MonitorConfig {
            checkpoint_size,
            max_wait_time,
            ..MonitorConfig::ethereum_mainnet()
        };

        let clock = TestClock::default();
        let validated = Arc::new(Mutex::new(Vec::new()));
        let confirmed = Arc::new(Mutex::new(Vec::new()));
        let receipts: Arc<Mutex<HashMap<u64, Vec<Vec<u8>>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let validated_sink = Arc::clone(&validated);
        let confirmed_sink = Arc::clone(&confirmed);
        let receipts_store = Arc::clone(&receipts);

        let monitor = Monitor::new(
            config,
            network,
            Box::new(clock.clone()),
            Box::new(TestEntropy::default()),
            SYNC_ADDR,
            SYNC_SIGN,
            Box::new(move |number| {
                receipts_store
                    .lock()
                    .unwrap()
                    .get(&number)
                    .cloned()
                    .ok_or_else(|| format!("no receipts staged for block #{number}").into())
            }),
            Box::new(move |header| validated_sink.lock().unwrap().push(header.number())),
            Box::new(move |header| confirmed_sink.lock().unwrap().push(header.number())),
        );

        Self {
            monitor,
            clock,
            validated,
            confirmed,
            receipts,
        }
    }

    /// The session ID as it appears in a 32-byte event topic.
    pub fn session_topic(&self) -> B256 {
        let mut topic = B256::ZERO;
        topic.0[..16].copy_from_slice(self.monitor.monitor_id().session_id());
        topic
    }

    pub fn validated_count(&self) -> usize {
        self.validated.lock().unwrap().len()
    }

    pub fn confirmed_count(&self) -> usize {
        self.confirmed.lock().unwrap().len()
    }
}
