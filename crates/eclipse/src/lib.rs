// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Umbrella crate for the eclipse-attack monitor.
//!
//! Re-exports the chain-agnostic foundation (`eclipse-core`) and the
//! Ethereum verification engine (`eclipse-eth`). Most embedders only
//! need [`Monitor`], a [`MonitorConfig`], and the platform trait
//! implementations for their environment.

/// Chain-agnostic monitor foundation.
pub use eclipse_core as core;

/// Ethereum verification engine.
pub use eclipse_eth as eth;

pub use eclipse_core::{MonitorConfig, MonitorId, MonitorSecState, Phase, SyncState};
pub use eclipse_eth::{EventDescription, EventManager, HeaderEntry, Monitor, Network};
