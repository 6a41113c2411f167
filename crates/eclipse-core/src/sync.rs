// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The sync-epoch record.
//!
//! A sync epoch starts when the monitor draws a fresh random nonce and asks
//! the embedder to publish it on-chain. The epoch is proven live the first
//! time a matching on-chain event is observed within the configured window.
//! The record is immutable after construction except for the single atomic
//! `synced` flag, and is shared (`Arc`) between the sync manager and every
//! fork-tree node inserted during the epoch.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::platform::{EntropySource, TrustedClock};

/// Length of a sync nonce in bytes.
pub const SYNC_NONCE_LEN: usize = 32;

/// Fixed sync nonce for development builds.
///
/// `0x9566c74d10037c4d7bbb0407d1e2c64981855ad8681d0d86d1e91e00167939cb`.
/// Never use in production.
#[cfg(feature = "dev-sync-nonce")]
pub const DEV_SYNC_NONCE: [u8; SYNC_NONCE_LEN] = [
    0x95, 0x66, 0xc7, 0x4d, 0x10, 0x03, 0x7c, 0x4d, //
    0x7b, 0xbb, 0x04, 0x07, 0xd1, 0xe2, 0xc6, 0x49, //
    0x81, 0x85, 0x5a, 0xd8, 0x68, 0x1d, 0x0d, 0x86, //
    0xd1, 0xe9, 0x1e, 0x00, 0x16, 0x79, 0x39, 0xcb,
];

/// One sync epoch: a fresh nonce, the trusted time it was drawn, and the
/// liveness flag.
#[derive(Debug)]
pub struct SyncState {
    max_wait_time: u64,
    gen_time: u64,
    nonce: [u8; SYNC_NONCE_LEN],
    synced: AtomicBool,
}

impl SyncState {
    /// Draw a new sync epoch: timestamp now, random nonce.
    #[cfg(not(feature = "dev-sync-nonce"))]
    pub fn generate(
        max_wait_time: u64,
        clock: &dyn TrustedClock,
        entropy: &dyn EntropySource,
    ) -> Self {
        let gen_time = clock.now_in_sec();
        let mut nonce = [0u8; SYNC_NONCE_LEN];
        entropy.fill_bytes(&mut nonce);
        Self {
            max_wait_time,
            gen_time,
            nonce,
            synced: AtomicBool::new(false),
        }
    }

    /// Development build: fixed nonce, zero generation time.
    #[cfg(feature = "dev-sync-nonce")]
    pub fn generate(
        max_wait_time: u64,
        _clock: &dyn TrustedClock,
        _entropy: &dyn EntropySource,
    ) -> Self {
        Self {
            max_wait_time,
            gen_time: 0,
            nonce: DEV_SYNC_NONCE,
            synced: AtomicBool::new(false),
        }
    }

    /// A pre-synced epoch with the development nonce and an unbounded wait
    /// window. Never use in production.
    #[cfg(feature = "dev-sync-nonce")]
    pub fn dev_synced() -> Self {
        Self {
            max_wait_time: u64::MAX,
            gen_time: 0,
            nonce: DEV_SYNC_NONCE,
            synced: AtomicBool::new(true),
        }
    }

    /// Mark the epoch synced, provided the matching event was observed at
    /// `recv_time` within `max_wait_time` of the nonce being drawn.
    /// Late or pre-dated observations are ignored.
    pub fn set_synced(&self, recv_time: u64) {
        match recv_time.checked_sub(self.gen_time) {
            Some(delta) if delta <= self.max_wait_time => {
                self.synced.store(true, Ordering::Release);
                info!(delta_sec = delta, at = recv_time, "sync epoch proven live");
            }
            _ => {}
        }
    }

    /// Whether the epoch has been proven live.
    pub fn is_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// The 32-byte epoch nonce.
    pub fn nonce(&self) -> &[u8; SYNC_NONCE_LEN] {
        &self.nonce
    }

    /// Trusted time the nonce was drawn.
    pub fn gen_time(&self) -> u64 {
        self.gen_time
    }
}
