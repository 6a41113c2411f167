// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Platform collaborators the monitor core consumes but never implements
//! itself: a trusted clock and a source of random bytes.
//!
//! In a hardened deployment both come from the trusted execution
//! environment; the [`SystemClock`] and [`OsEntropy`] implementations here
//! are for ordinary hosts and tests.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;

/// A clock whose readings the monitor is willing to trust.
///
/// Every timeout in the monitor (`max_wait_time`, `sync_max_wait_time`) is
/// a delta against this clock.
pub trait TrustedClock: Send + Sync {
    /// Current time in seconds since the Unix epoch.
    fn now_in_sec(&self) -> u64;
}

/// A source of cryptographically secure random bytes.
pub trait EntropySource: Send + Sync {
    /// Fill `buf` with random bytes.
    fn fill_bytes(&self, buf: &mut [u8]);
}

/// [`TrustedClock`] backed by the host's wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TrustedClock for SystemClock {
    fn now_in_sec(&self) -> u64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs(),
            // pre-epoch clocks only happen on badly misconfigured hosts;
            // saturate rather than panic
            Err(_) => 0,
        }
    }
}

/// [`EntropySource`] backed by the operating system RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }
}
