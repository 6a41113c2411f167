// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Protocol parameters and per-network fork schedules.
//!
//! Constants follow go-ethereum's `params/protocol_params.go` and
//! `params/config.go`.

/// `parent_difficulty / 2048` expressed as a bit shift.
pub const DIFFICULTY_BOUND_DIVISOR_SHIFT: u32 = 11;

/// The floor every difficulty calculation clamps to.
pub const MINIMUM_DIFFICULTY: u64 = 131_072;

/// Frontier block-time target boundary in seconds.
pub const DURATION_LIMIT: u64 = 13;

/// Ice-age bomb period in blocks.
pub const EXP_DIFF_PERIOD: u64 = 100_000;

/// Activation heights of the forks the difficulty rules care about.
/// `None` means the fork never activates on that network.
#[derive(Clone, Copy, Debug)]
pub struct ForkSchedule {
    /// Homestead activation block.
    pub homestead: Option<u64>,
    /// Byzantium activation block.
    pub byzantium: Option<u64>,
    /// Constantinople activation block.
    pub constantinople: Option<u64>,
    /// Muir Glacier activation block.
    pub muir_glacier: Option<u64>,
    /// London activation block.
    pub london: Option<u64>,
    /// Arrow Glacier activation block.
    pub arrow_glacier: Option<u64>,
    /// Gray Glacier activation block.
    pub gray_glacier: Option<u64>,
    /// Paris (the Merge) activation block.
    pub paris: Option<u64>,
}

impl ForkSchedule {
    fn active(fork: Option<u64>, number: u64) -> bool {
        matches!(fork, Some(at) if number >= at)
    }

    /// Whether `number` is a Homestead-or-later block.
    pub fn is_homestead(&self, number: u64) -> bool {
        Self::active(self.homestead, number)
    }

    /// Whether `number` is a Byzantium-or-later block.
    pub fn is_byzantium(&self, number: u64) -> bool {
        Self::active(self.byzantium, number)
    }

    /// Whether `number` is a Constantinople-or-later block.
    pub fn is_constantinople(&self, number: u64) -> bool {
        Self::active(self.constantinople, number)
    }

    /// Whether `number` is a Muir-Glacier-or-later block.
    pub fn is_muir_glacier(&self, number: u64) -> bool {
        Self::active(self.muir_glacier, number)
    }

    /// Whether `number` is a London-or-later block.
    pub fn is_london(&self, number: u64) -> bool {
        Self::active(self.london, number)
    }

    /// Whether `number` is an Arrow-Glacier-or-later block.
    pub fn is_arrow_glacier(&self, number: u64) -> bool {
        Self::active(self.arrow_glacier, number)
    }

    /// Whether `number` is a Gray-Glacier-or-later block.
    pub fn is_gray_glacier(&self, number: u64) -> bool {
        Self::active(self.gray_glacier, number)
    }

    /// Whether `number` is a post-Merge block.
    pub fn is_paris(&self, number: u64) -> bool {
        Self::active(self.paris, number)
    }
}

/// Ethereum main-net fork schedule.
pub const MAINNET: ForkSchedule = ForkSchedule {
    homestead: Some(1_150_000),
    byzantium: Some(4_370_000),
    constantinople: Some(7_280_000),
    muir_glacier: Some(9_200_000),
    london: Some(12_965_000),
    arrow_glacier: Some(13_773_000),
    gray_glacier: Some(15_050_000),
    paris: Some(15_537_394),
};

/// Goerli test-net fork schedule. Goerli runs Clique, so most of the
/// difficulty forks are irrelevant there.
pub const GOERLI: ForkSchedule = ForkSchedule {
    homestead: Some(0),
    byzantium: Some(0),
    constantinople: Some(0),
    muir_glacier: None,
    london: Some(5_062_605),
    arrow_glacier: None,
    gray_glacier: None,
    paris: Some(7_382_819),
};

/// The networks the monitor knows how to verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Network {
    /// Ethereum main net (Ethash, then PoS after Paris).
    Mainnet,
    /// Goerli test net (Clique).
    Goerli,
}

impl Network {
    /// The fork schedule of this network.
    pub fn schedule(&self) -> &'static ForkSchedule {
        match self {
            Network::Mainnet => &MAINNET,
            Network::Goerli => &GOERLI,
        }
    }

    /// Whether `number` is a post-Merge block on this network.
    pub fn is_paris(&self, number: u64) -> bool {
        self.schedule().is_paris(number)
    }
}
