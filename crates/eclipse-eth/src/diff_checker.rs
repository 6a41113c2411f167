// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Difficulty and timing policy for runtime headers.
//!
//! While the validator checks that a header's difficulty is *exactly* what
//! the fork rules prescribe, this policy guards against an eclipse
//! attacker serving a slow, low-work private chain: every accepted header
//! must arrive within `max_wait_time` of its parent and carry at least a
//! configured fraction of the last confirmed window's median difficulty.
//! For post-Merge block numbers both checks degrade to always-true.

use eclipse_core::MonitorConfig;

use crate::{
    checkpoint::CheckpointMgr,
    daa::DaaCalculator,
    error::DaaError,
    fork_tree::ForkTree,
    header::HeaderEntry,
    params::Network,
};

/// Proof-of-work difficulty policy.
#[derive(Debug)]
pub struct PowDiffChecker {
    min_diff_percent: u8,
    max_wait_time: u64,
    min_diff: u64,
    network: Network,
}

impl PowDiffChecker {
    /// Policy from the monitor configuration.
    pub fn new(config: &MonitorConfig, network: Network) -> Self {
        Self {
            min_diff_percent: config.min_diff_percent,
            max_wait_time: config.max_wait_time,
            min_diff: 0,
            network,
        }
    }

    /// Recalibrate the difficulty floor from a freshly completed window:
    /// `min_diff = (median >> 7) * min_diff_percent`, i.e. roughly
    /// `median * percent / 128`.
    pub fn on_checkpoint_update(&mut self, median: u64) {
        self.min_diff = (median >> 7).saturating_mul(self.min_diff_percent as u64);
    }

    /// The current difficulty floor.
    pub fn min_diff(&self) -> u64 {
        self.min_diff
    }

    /// Accept `current` under `parent` only if it was received after the
    /// parent, within the wait window, and carries enough work.
    pub fn check_difficulty(&self, parent: &HeaderEntry, current: &HeaderEntry) -> bool {
        current.trusted_time() > parent.trusted_time()
            && current.trusted_time() - parent.trusted_time() <= self.max_wait_time
            && current.difficulty() >= self.min_diff
    }

    /// Decide whether a tip could still produce an acceptable child at
    /// time `now`: the wait window must be open and the *projected*
    /// next-block difficulty must clear the floor.
    pub fn check_est_difficulty(
        &self,
        parent: &HeaderEntry,
        now: u64,
    ) -> Result<bool, DaaError> {
        let delta = now.saturating_sub(parent.trusted_time());
        if delta > self.max_wait_time {
            return Ok(false);
        }

        let estimator = DaaCalculator::estimator_for_block(self.network, parent.number() + 1)?;
        let mut next = HeaderEntry::synthetic();
        next.set_number(parent.number() + 1);
        next.set_time(now);

        Ok(estimator.expected(parent, &next) >= self.min_diff)
    }
}

/// Network-aware policy: proof-of-work rules before Paris, stubbed-out
/// acceptance after.
#[derive(Debug)]
pub struct DiffChecker {
    pow: PowDiffChecker,
    network: Network,
}

impl DiffChecker {
    /// Policy from the monitor configuration.
    pub fn new(config: &MonitorConfig, network: Network) -> Self {
        Self {
            pow: PowDiffChecker::new(config, network),
            network,
        }
    }

    /// Recalibrate after a checkpoint roll. Windows that end past Paris
    /// carry no proof-of-work signal and leave the floor untouched.
    pub fn on_checkpoint_update(&mut self, checkpoint: &CheckpointMgr, tree: &ForkTree) {
        let Ok((_, end)) = checkpoint.block_num_range() else {
            return;
        };
        if self.network.is_paris(end) {
            return;
        }
        if let Some(median) = checkpoint.diff_median(tree) {
            self.pow.on_checkpoint_update(median);
        }
    }

    /// Per-header difficulty/timing policy.
    pub fn check_difficulty(&self, parent: &HeaderEntry, current: &HeaderEntry) -> bool {
        if self.network.is_paris(current.number()) {
            return true;
        }
        self.pow.check_difficulty(parent, current)
    }

    /// Stall policy for active tips.
    pub fn check_est_difficulty(&self, parent: &HeaderEntry, now: u64) -> Result<bool, DaaError> {
        if self.network.is_paris(parent.number() + 1) {
            return Ok(true);
        }
        self.pow.check_est_difficulty(parent, now)
    }
}
