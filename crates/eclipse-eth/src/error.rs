// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::B256;
use thiserror::Error;

/// Errors from parsing a raw RLP block header.
#[derive(Error, Debug)]
pub enum HeaderError {
    /// The outer RLP item is not a list.
    #[error("header RLP is not a list")]
    NotAList,

    /// Trailing bytes after the header list.
    #[error("header RLP has trailing bytes")]
    TrailingBytes,

    /// Too few fields for any known header layout.
    #[error("header has {0} fields, at least 15 expected")]
    TooFewFields(usize),

    /// A header field was a nested list.
    #[error("header field {0} is a nested list")]
    NestedListField(usize),

    /// A fixed-length field had the wrong length.
    #[error("header field {index} is {got} bytes, expected {expected}")]
    FieldLength {
        /// Position of the field in the header list.
        index: usize,
        /// Observed length.
        got: usize,
        /// Required length.
        expected: usize,
    },

    /// An integer field was wider than 64 bits.
    #[error("header field {0} is {1} bytes, integers are at most 8")]
    IntegerTooWide(usize, usize),

    /// Low-level RLP decoding error.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
}

/// Errors from the difficulty-adjustment calculators.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaaError {
    /// Blocks since the Paris fork no longer carry a meaningful difficulty.
    #[error("block #{0} is past the Paris fork and has no difficulty algorithm")]
    PostParis(u64),

    /// The next-block estimator needs the EIP-5133 rules; earlier rules
    /// depend on the parent's uncle flag, which does not exist yet for a
    /// block that has not been produced.
    #[error("difficulty estimation before Gray Glacier is not possible (block #{0})")]
    EstimatorUnavailable(u64),
}

/// Reasons a header fails single-header validation against its parent.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The block number is not the parent's plus one.
    #[error("block number {got} does not follow parent #{parent}")]
    NonSequentialNumber {
        /// Parent block number.
        parent: u64,
        /// Claimed block number.
        got: u64,
    },

    /// The claimed parent hash does not match the parent header's hash.
    #[error("parent hash mismatch at block #{0}")]
    ParentHashMismatch(u64),

    /// The claimed difficulty does not match the fork rules.
    #[error("block #{number} difficulty {got} != expected {expected}")]
    DifficultyMismatch {
        /// Block number being validated.
        number: u64,
        /// Claimed difficulty.
        got: u64,
        /// Difficulty derived from the parent per fork rules.
        expected: u64,
    },

    /// A post-Paris block must carry zero difficulty.
    #[error("post-Paris block #{0} must have zero difficulty")]
    NonZeroPosDifficulty(u64),

    /// Fork-rule selection failed.
    #[error(transparent)]
    Daa(#[from] DaaError),
}

/// Errors from decoding receipts.
#[derive(Error, Debug)]
pub enum ReceiptError {
    /// The receipt body is not an RLP list.
    #[error("receipt RLP body is not a list")]
    NotAList,

    /// The receipt list does not have the expected four fields.
    #[error("receipt has {0} fields, 4 expected")]
    FieldCount(usize),

    /// A log entry was not the `[address, topics, data]` triple.
    #[error("log entry has an unexpected shape")]
    LogShape,

    /// A log address was not 20 bytes.
    #[error("log address has invalid length {0}")]
    LogAddressLength(usize),

    /// A log topic was not 32 bytes.
    #[error("log topic has invalid length {0}")]
    LogTopicLength(usize),

    /// Low-level RLP decoding error.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
}

/// Errors from decoding transactions.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The transaction body is not an RLP list.
    #[error("transaction RLP body is not a list")]
    NotAList,

    /// The body has too few fields for its envelope version.
    #[error("transaction has {got} fields, at least {expected} expected")]
    FieldCount {
        /// Observed field count.
        got: usize,
        /// Minimum field count for the envelope version.
        expected: usize,
    },

    /// A field expected to be a byte string was a list.
    #[error("transaction field {0} is a nested list")]
    NestedListField(usize),

    /// Low-level RLP decoding error.
    #[error(transparent)]
    Rlp(#[from] alloy_rlp::Error),
}

/// Errors surfaced while matching events against a block.
#[derive(Error, Debug)]
pub enum EventError {
    /// The receipts trie root rebuilt from raw receipts does not match the
    /// header. Either the receipts or the header are fabricated; this is
    /// treated as evidence of tampering.
    #[error("receipts root mismatch at block #{number}: header {expected}, computed {computed}")]
    ReceiptsRootMismatch {
        /// Block number of the offending header.
        number: u64,
        /// Root claimed by the header.
        expected: B256,
        /// Root computed from the materialized receipts.
        computed: B256,
    },

    /// The caller-provided receipts getter failed.
    #[error("failed to fetch receipts for block #{0}")]
    ReceiptsFetch(u64, #[source] Box<dyn std::error::Error + Send + Sync>),

    /// A raw receipt could not be decoded.
    #[error(transparent)]
    Receipt(#[from] ReceiptError),
}

/// Phase-misuse errors from the checkpoint manager. These indicate a bug in
/// the embedding code, not bad chain data.
#[derive(Error, Debug)]
pub enum CheckpointError {
    /// `add_header` is only legal during the first bootstrap phase.
    #[error("checkpoint manager already left the bootstrap phase")]
    AlreadyRuntime,

    /// `end_bootstrap` requires an empty candidate window.
    #[error("candidate window still holds {0} headers")]
    CandidateNotEmpty(usize),

    /// No header has been accepted yet.
    #[error("no header has been added to this checkpoint")]
    Empty,

    /// A node id handed to the checkpoint manager no longer exists in the
    /// fork tree.
    #[error("fork-tree node is gone")]
    StaleNode,
}

/// Top-level monitor errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Header failed to parse.
    #[error(transparent)]
    Header(#[from] HeaderError),

    /// A bootstrap header failed validation. During bootstrap this is
    /// fatal: the monitor builds from a trusted snapshot and cannot skip.
    #[error("bootstrap header rejected: {0}")]
    BootstrapValidation(#[source] ValidationError),

    /// Event matching failed, including the receipts-root tamper check.
    #[error(transparent)]
    Event(#[from] EventError),

    /// Checkpoint phase misuse.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// Fork-rule selection failed during runtime maintenance.
    #[error(transparent)]
    Daa(#[from] DaaError),

    /// A fork-tree node referenced by the monitor maps no longer exists.
    #[error("fork-tree bookkeeping out of sync: stale node id")]
    StaleNode,

    /// The event manager was dropped while the monitor still needed it.
    #[error("event manager is not available")]
    EventManagerGone,
}
