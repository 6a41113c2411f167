// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Drive a monitor through its bootstrap phases against a synthetic
//! Clique-style chain and print the attestable state along the way.
//!
//! ```sh
//! cargo run -p eclipse-eth --example bootstrap_demo
//! ```

use alloy_primitives::{keccak256, Address, B256};
use eclipse_core::{MonitorConfig, OsEntropy, Phase, SystemClock};
use eclipse_eth::{Monitor, Network};

/// Build a minimal 15-field header RLP for the demo chain.
fn demo_header(parent_hash: B256, number: u64, time: u64) -> Vec<u8> {
    const EMPTY_UNCLES: [u8; 32] = [
        0x1d, 0xcc, 0x4d, 0xe8, 0xde, 0xc7, 0x5d, 0x7a, 0xab, 0x85, 0xb5, 0x67, 0xb6, 0xcc,
        0xd4, 0x1a, 0xd3, 0x12, 0x45, 0x1b, 0x94, 0x8a, 0x74, 0x13, 0xf0, 0xa1, 0x42, 0xfd,
        0x40, 0xd4, 0x93, 0x47,
    ];

    let mut fields: Vec<Vec<u8>> = vec![Vec::new(); 15];
    fields[0] = parent_hash.to_vec();
    fields[1] = EMPTY_UNCLES.to_vec();
    fields[4] = vec![0; 32];
    fields[5] = vec![0; 32];
    fields[6] = vec![0; 256];
    fields[7] = vec![2]; // in-turn clique difficulty
    fields[8] = be_minimal(number);
    fields[11] = be_minimal(time);

    let mut payload = Vec::new();
    for field in &fields {
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
    let mut out = Vec::new();
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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = MonitorConfig {
        checkpoint_size: 4,
        ..MonitorConfig::ethereum_mainnet()
    };

    let mut monitor = Monitor::new(
        config,
        Network::Goerli,
        Box::new(SystemClock),
        Box::new(OsEntropy),
        Address::repeat_byte(0xC0),
        B256::repeat_byte(0xE0),
        // the demo chain carries no events, so no receipts are needed
        Box::new(|number| Err(format!("no receipts source for block #{number}").into())),
        Box::new(|header| println!("validated  block #{}", header.number())),
        Box::new(|header| println!("confirmed  block #{}", header.number())),
    );

    // plan: chain tip at #19, so bootstrap loads #0..=#11
    monitor.refresh_bootstrap_plan(19, Some(0));
    println!(
        "bootstrap ends at {:?}, sync planned at {:?}",
        monitor.bootstrap_i_end_num(),
        monitor.planned_sync_num()
    );

    let mut parent_hash = B256::ZERO;
    for number in 0..12u64 {
        let raw = demo_header(parent_hash, number, number * 15);
        parent_hash = keccak256(&raw);
        monitor.update(&raw)?;
    }

    assert_eq!(monitor.phase(), Phase::BootstrapII);
    let state = monitor.sec_state();
    println!(
        "phase {:?}: {} checkpoint windows, tail {}",
        monitor.phase(),
        state.checkpoint_iter,
        state.checkpoint_hash
    );
    println!("attested state: 0x{}", alloy_primitives::hex::encode(state.to_attested_bytes()));

    Ok(())
}
