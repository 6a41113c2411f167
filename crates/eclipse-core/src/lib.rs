// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Chain-agnostic foundation of the eclipse-attack monitor.
//!
//! A monitor instance consumes block headers delivered over an untrusted
//! channel and decides whether its local view of the chain is consistent
//! with the rest of the network. This crate holds the parts that do not
//! depend on any particular chain: the phase machine states, the monitor
//! configuration, the attestable security state, the sync-epoch record,
//! and the platform collaborator traits (trusted clock, entropy source).
//!
//! The chain-specific verification engine lives in `eclipse-eth`.

pub mod config;
pub mod error;
pub mod phases;
pub mod platform;
pub mod report;
pub mod sync;

pub use config::MonitorConfig;
pub use error::CoreError;
pub use phases::Phase;
pub use platform::{EntropySource, OsEntropy, SystemClock, TrustedClock};
pub use report::{MonitorId, MonitorSecState};
pub use sync::SyncState;

/// Secure version number of this monitor implementation.
///
/// Upper byte is the major revision, lower two bytes the minor revision.
pub const MONITOR_SVN: u32 = 0x01 << 16;
