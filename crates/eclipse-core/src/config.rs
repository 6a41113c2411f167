// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::MONITOR_SVN;

/// Security-critical configuration of a monitor instance.
///
/// Deserialization fails if any field is absent; there are deliberately no
/// serde defaults here, since a silently defaulted security parameter is
/// worse than a refused config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Secure version number the config was written for.
    pub svn: u32,
    /// Name of the monitored chain, e.g. `"ethereum"`.
    pub chain_name: String,
    /// Number of blocks in each checkpoint window.
    pub checkpoint_size: u64,
    /// Numerator of the minimum-difficulty fraction, against a fixed
    /// denominator of 128: `min_diff = (median >> 7) * min_diff_percent`.
    pub min_diff_percent: u8,
    /// Maximum time in seconds to wait for a new child block. A fork tip
    /// older than this stops accepting children and is marked inactive.
    pub max_wait_time: u64,
    /// Maximum time in seconds for the sync message to appear on-chain
    /// after the nonce was drawn. A later observation does not count and a
    /// re-sync is needed.
    pub sync_max_wait_time: u64,
}

impl MonitorConfig {
    /// Configuration used for Ethereum main-net deployments.
    pub fn ethereum_mainnet() -> Self {
        Self {
            svn: MONITOR_SVN,
            chain_name: "ethereum".to_owned(),
            checkpoint_size: 430,
            // 103/128, roughly 80% of the window median
            min_diff_percent: 103,
            max_wait_time: 400,
            sync_max_wait_time: 13,
        }
    }
}
