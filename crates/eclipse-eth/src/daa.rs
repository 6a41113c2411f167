// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Difficulty-adjustment algorithms across protocol forks.
//!
//! A calculator derives the difficulty a child block *must* carry from its
//! parent. The fork rules follow go-ethereum's
//! `consensus/ethash/consensus.go`; arithmetic is 64-bit unsigned with
//! saturation at the documented floors.
//!
//! Calculators are plain parameter structs dispatched through a small enum
//! so the per-header hot path stays free of virtual calls.

use crate::{
    error::DaaError,
    header::HeaderEntry,
    params::{
        Network, DIFFICULTY_BOUND_DIVISOR_SHIFT, DURATION_LIMIT, EXP_DIFF_PERIOD,
        MINIMUM_DIFFICULTY,
    },
};

/// Parameters of the Ethash family of difficulty rules (Homestead and
/// every bomb-delay revision after it).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EthashDaa {
    /// Whether the parent's uncle flag moves the adjustment base from 1
    /// to 2 (Byzantium and later).
    pub consider_uncle: bool,
    /// Divisor applied to the timestamp delta (10 for Homestead, 9 for
    /// Byzantium and later).
    pub delta_divisor: u64,
    /// Whether the downward adjustment is clamped at 99 steps. The
    /// estimator variant drops the clamp so a stalled tip keeps losing
    /// projected difficulty.
    pub has_max_check: bool,
    /// Ice-age bomb delay in blocks, if the fork defines one.
    pub bomb_delay: Option<u64>,
}

impl EthashDaa {
    /// Gray Glacier rules (EIP-5133).
    pub const EIP5133: Self = Self {
        consider_uncle: true,
        delta_divisor: 9,
        has_max_check: true,
        bomb_delay: Some(11_400_000),
    };

    /// Gray Glacier rules without the −99 clamp, used for next-block
    /// estimation.
    pub const EIP5133_ESTIMATED: Self = Self {
        has_max_check: false,
        ..Self::EIP5133
    };

    /// Arrow Glacier rules (EIP-4345).
    pub const EIP4345: Self = Self {
        bomb_delay: Some(10_700_000),
        ..Self::EIP5133
    };

    /// London rules (EIP-3554).
    pub const EIP3554: Self = Self {
        bomb_delay: Some(9_700_000),
        ..Self::EIP5133
    };

    /// Muir Glacier rules (EIP-2384).
    pub const EIP2384: Self = Self {
        bomb_delay: Some(9_000_000),
        ..Self::EIP5133
    };

    /// Constantinople rules.
    pub const CONSTANTINOPLE: Self = Self {
        bomb_delay: Some(5_000_000),
        ..Self::EIP5133
    };

    /// Byzantium rules.
    pub const BYZANTIUM: Self = Self {
        bomb_delay: Some(3_000_000),
        ..Self::EIP5133
    };

    /// Homestead rules: ten-second divisor, uncles ignored, no bomb delay.
    pub const HOMESTEAD: Self = Self {
        consider_uncle: false,
        delta_divisor: 10,
        has_max_check: true,
        bomb_delay: None,
    };

    /// Difficulty the child of `parent` must carry at `current_time`.
    pub fn expected(&self, parent: &HeaderEntry, current: &HeaderEntry) -> u64 {
        self.expected_from_parts(
            parent.number(),
            parent.time(),
            parent.difficulty(),
            parent.has_uncle(),
            current.time(),
        )
    }

    /// Same as [`Self::expected`] over bare header fields.
    pub fn expected_from_parts(
        &self,
        parent_number: u64,
        parent_time: u64,
        parent_difficulty: u64,
        parent_has_uncle: bool,
        current_time: u64,
    ) -> u64 {
        // (timestamp - parent.timestamp) // divisor
        let steps = current_time.saturating_sub(parent_time) / self.delta_divisor;

        // (2 if parent has uncles else 1) - steps, tracked as magnitude
        // plus direction to stay in unsigned arithmetic
        let base = if self.consider_uncle && parent_has_uncle {
            2
        } else {
            1
        };
        let reducing = steps > base;
        let mut x = if reducing { steps - base } else { base - steps };

        if self.has_max_check && reducing && x > 99 {
            x = 99;
        }

        let unit = parent_difficulty >> DIFFICULTY_BOUND_DIVISOR_SHIFT;
        let x = unit.saturating_mul(x);

        let mut diff = if !self.has_max_check && reducing && x > parent_difficulty {
            // unclamped estimation can fall through the floor entirely
            MINIMUM_DIFFICULTY
        } else if reducing {
            parent_difficulty - x
        } else {
            parent_difficulty.saturating_add(x)
        };

        if diff < MINIMUM_DIFFICULTY {
            diff = MINIMUM_DIFFICULTY;
        }

        // ice-age bomb, counted from a delayed "fake" block number
        let fake_number = match self.bomb_delay {
            Some(delay) => parent_number.saturating_sub(delay - 1),
            None => parent_number + 1,
        };
        let period = fake_number / EXP_DIFF_PERIOD;
        if period > 1 {
            diff = diff.saturating_add(bomb(period));
        }
        diff
    }
}

/// Frontier difficulty rule: fixed step toward the 13-second target.
fn frontier_expected(
    parent_number: u64,
    parent_time: u64,
    parent_difficulty: u64,
    current_time: u64,
) -> u64 {
    let adjust = parent_difficulty >> DIFFICULTY_BOUND_DIVISOR_SHIFT;
    let delta = current_time.saturating_sub(parent_time);

    let mut diff = if delta < DURATION_LIMIT {
        parent_difficulty.saturating_add(adjust)
    } else {
        parent_difficulty - adjust
    };

    if diff < MINIMUM_DIFFICULTY {
        diff = MINIMUM_DIFFICULTY;
    }

    let period = (parent_number + 1) / EXP_DIFF_PERIOD;
    if period > 1 {
        diff = diff.saturating_add(bomb(period));
    }
    diff
}

/// `2^(period - 2)` for `period >= 2`, saturating.
fn bomb(period: u64) -> u64 {
    1u64
        .checked_shl((period - 2).min(u32::MAX as u64) as u32)
        .unwrap_or(u64::MAX)
}

/// A difficulty calculator selected for one specific block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DaaCalculator {
    /// Pre-Homestead rule.
    Frontier,
    /// Homestead-or-later Ethash rule.
    Ethash(EthashDaa),
    /// Clique test-net stub: echoes the claimed difficulty.
    Clique,
    /// Clique test-net estimation stub: in-turn difficulty.
    CliqueEstimate,
}

impl DaaCalculator {
    /// Select the calculator validating block `number` on `network`.
    ///
    /// Blocks at or past Paris have no difficulty algorithm; asking for
    /// one is a programming error.
    pub fn for_block(network: Network, number: u64) -> Result<Self, DaaError> {
        let forks = network.schedule();
        if forks.is_paris(number) {
            return Err(DaaError::PostParis(number));
        }
        match network {
            Network::Goerli => Ok(Self::Clique),
            Network::Mainnet => Ok(if forks.is_gray_glacier(number) {
                Self::Ethash(EthashDaa::EIP5133)
            } else if forks.is_arrow_glacier(number) {
                Self::Ethash(EthashDaa::EIP4345)
            } else if forks.is_london(number) {
                Self::Ethash(EthashDaa::EIP3554)
            } else if forks.is_muir_glacier(number) {
                Self::Ethash(EthashDaa::EIP2384)
            } else if forks.is_constantinople(number) {
                Self::Ethash(EthashDaa::CONSTANTINOPLE)
            } else if forks.is_byzantium(number) {
                Self::Ethash(EthashDaa::BYZANTIUM)
            } else if forks.is_homestead(number) {
                Self::Ethash(EthashDaa::HOMESTEAD)
            } else {
                Self::Frontier
            }),
        }
    }

    /// Select the calculator *estimating* the difficulty of a block that
    /// does not exist yet, given only the current time.
    ///
    /// Rules before EIP-5133 need the parent's uncle flag of the unborn
    /// block's own parent generation, so estimation is only defined from
    /// Gray Glacier on (and as a fixed stub on Clique nets).
    pub fn estimator_for_block(network: Network, number: u64) -> Result<Self, DaaError> {
        let forks = network.schedule();
        if forks.is_paris(number) {
            return Err(DaaError::PostParis(number));
        }
        match network {
            Network::Goerli => Ok(Self::CliqueEstimate),
            Network::Mainnet => {
                if forks.is_gray_glacier(number) {
                    Ok(Self::Ethash(EthashDaa::EIP5133_ESTIMATED))
                } else {
                    Err(DaaError::EstimatorUnavailable(number))
                }
            }
        }
    }

    /// Expected difficulty of `current` given `parent`.
    pub fn expected(&self, parent: &HeaderEntry, current: &HeaderEntry) -> u64 {
        match self {
            Self::Frontier => frontier_expected(
                parent.number(),
                parent.time(),
                parent.difficulty(),
                current.time(),
            ),
            Self::Ethash(params) => params.expected(parent, current),
            Self::Clique => current.difficulty(),
            Self::CliqueEstimate => 2,
        }
    }
}
