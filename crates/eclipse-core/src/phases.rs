// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

/// Lifecycle phases of a monitor instance.
///
/// A monitor starts in `BootstrapI`, loading historical headers from the
/// genesis block (or a configured start block) forward. Once the planned
/// bootstrap range is complete it moves to `BootstrapII`, where it keeps
/// consuming live headers while waiting for the right moment to emit a
/// fresh sync nonce. Emitting the nonce moves it to `Sync`; the embedder
/// promotes it to `Runtime` once it considers the monitor re-synchronized.
/// Header processing in `Sync` and `Runtime` is identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Loading historical headers up to the planned bootstrap end block.
    BootstrapI,
    /// Live headers are attached to the fork tree; sync nonce not yet drawn.
    BootstrapII,
    /// A sync nonce has been published; waiting for it to appear on-chain.
    Sync,
    /// Fully operational, as decided by the embedder.
    Runtime,
}
