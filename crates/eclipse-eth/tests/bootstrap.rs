// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Genesis bootstrap scenarios: building checkpoint windows from the
//! genesis block and rejecting malformed ancestry.

mod common;

use alloy_primitives::{keccak256, B256};
use common::{build_header, Harness};
use eclipse_core::Phase;
use eclipse_eth::{MonitorError, Network};

/// Frontier difficulty for a fast child (delta below the duration limit).
fn frontier_fast(parent_diff: u64) -> u64 {
    parent_diff + (parent_diff >> 11)
}

#[test]
fn genesis_bootstrap_completes_first_window() {
    let mut harness = Harness::new(Network::Mainnet, 4, 400);

    // mainnet genesis difficulty
    let mut difficulty = 17_179_869_184u64;
    let mut parent_hash = B256::ZERO;
    let mut hashes = Vec::new();

    for number in 0..4u64 {
        if number > 0 {
            difficulty = frontier_fast(difficulty);
        }
        let raw = build_header(
            parent_hash,
            number,
            1_438_269_973 + number * 10,
            difficulty,
            &[0u8; 256],
            B256::ZERO,
        );
        parent_hash = keccak256(&raw);
        hashes.push(parent_hash);
        harness.monitor.update(&raw).unwrap();
    }

    // one window completed: iteration counted, tail pinned
    let state = harness.monitor.sec_state();
    assert_eq!(state.checkpoint_iter, 1);
    assert_eq!(state.checkpoint_hash, hashes[3]);
    assert_eq!(state.checkpoint_num, vec![3]);
    assert_eq!(state.genesis_hash, hashes[0]);

    // every header was validated, the whole window confirmed in order
    assert_eq!(*harness.validated.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(*harness.confirmed.lock().unwrap(), vec![0, 1, 2, 3]);
    assert_eq!(harness.monitor.phase(), Phase::BootstrapI);
}

#[test]
fn bootstrap_rejects_wrong_parent_hash() {
    let mut harness = Harness::new(Network::Mainnet, 4, 400);

    let mut difficulty = 17_179_869_184u64;
    let mut parent_hash = B256::ZERO;
    for number in 0..4u64 {
        if number > 0 {
            difficulty = frontier_fast(difficulty);
        }
        let raw = build_header(
            parent_hash,
            number,
            1_438_269_973 + number * 10,
            difficulty,
            &[0u8; 256],
            B256::ZERO,
        );
        parent_hash = keccak256(&raw);
        harness.monitor.update(&raw).unwrap();
    }
    let state_before = harness.monitor.sec_state().clone();
    let validated_before = harness.validated_count();
    let confirmed_before = harness.confirmed_count();

    // block #4 claiming a fabricated parent
    let raw = build_header(
        B256::repeat_byte(0xFF),
        4,
        1_438_270_020,
        frontier_fast(difficulty),
        &[0u8; 256],
        B256::ZERO,
    );
    let err = harness.monitor.update(&raw).unwrap_err();
    assert!(matches!(err, MonitorError::BootstrapValidation(_)));

    // checkpoint untouched, no callbacks fired
    assert_eq!(harness.monitor.sec_state(), &state_before);
    assert_eq!(harness.validated_count(), validated_before);
    assert_eq!(harness.confirmed_count(), confirmed_before);
}

#[test]
fn bootstrap_rejects_wrong_difficulty() {
    let mut harness = Harness::new(Network::Mainnet, 4, 400);

    let genesis = build_header(B256::ZERO, 0, 1_438_269_973, 17_179_869_184, &[0u8; 256], B256::ZERO);
    harness.monitor.update(&genesis).unwrap();

    // claimed difficulty off by one
    let child = build_header(
        keccak256(&genesis),
        1,
        1_438_269_983,
        frontier_fast(17_179_869_184) + 1,
        &[0u8; 256],
        B256::ZERO,
    );
    assert!(harness.monitor.update(&child).is_err());
    assert_eq!(harness.validated_count(), 1);
}

#[test]
fn garbage_header_is_a_parse_error() {
    let mut harness = Harness::new(Network::Mainnet, 4, 400);
    let err = harness.monitor.update(&[0x01, 0x02, 0x03]).unwrap_err();
    assert!(matches!(err, MonitorError::Header(_)));
}

#[test]
fn bootstrap_ends_at_planned_block() {
    let mut harness = Harness::new(Network::Goerli, 4, 400);
    // 20 blocks ahead, two-window margin: bootstrap ends at #11
    harness.monitor.refresh_bootstrap_plan(19, Some(0));
    assert_eq!(harness.monitor.bootstrap_i_end_num(), Some(11));
    assert_eq!(harness.monitor.planned_sync_num(), Some(19));

    let mut parent_hash = B256::ZERO;
    for number in 0..12u64 {
        let raw = build_header(parent_hash, number, number * 15, 2, &[0u8; 256], B256::ZERO);
        parent_hash = keccak256(&raw);
        harness.monitor.update(&raw).unwrap();
        if number < 11 {
            assert_eq!(harness.monitor.phase(), Phase::BootstrapI);
        }
    }

    // three windows confirmed and the phase advanced
    assert_eq!(harness.monitor.phase(), Phase::BootstrapII);
    assert_eq!(harness.monitor.sec_state().checkpoint_iter, 3);
}
