// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ethereum verification engine of the eclipse-attack monitor.
//!
//! The engine consumes raw RLP block headers from an untrusted channel and
//! decides, per header and per candidate chain tip, whether the local view
//! of the chain is consistent with the rest of the network: parent links
//! and difficulty are re-derived per fork rules, accepted headers roll
//! through checkpoint windows, competing tips live in a fork tree until
//! one branch accumulates enough descendants, and contract events are only
//! believed after the block's receipts trie root has been rebuilt from raw
//! receipts and checked against the header.
//!
//! The entry point is [`monitor::Monitor`]; everything else is the
//! machinery it orchestrates.

pub mod bloom;
pub mod checkpoint;
pub mod daa;
pub mod diff_checker;
pub mod error;
pub mod event;
pub mod fork_tree;
pub mod header;
pub mod monitor;
pub mod params;
pub mod receipt;
pub mod sync_msg;
pub mod transaction;
pub mod trie;
pub mod validator;

mod rlp;

pub use bloom::BloomFilter;
pub use checkpoint::CheckpointMgr;
pub use daa::DaaCalculator;
pub use diff_checker::DiffChecker;
pub use error::{
    CheckpointError, DaaError, EventError, HeaderError, MonitorError, ReceiptError,
    TransactionError, ValidationError,
};
pub use event::{CallbackId, EventDescription, EventManager};
pub use fork_tree::{ForkTree, NodeId};
pub use header::HeaderEntry;
pub use monitor::Monitor;
pub use params::Network;
pub use receipt::{LogEntry, Receipt, ReceiptSet};
pub use sync_msg::SyncMsgMgr;
pub use transaction::{Transaction, TransactionSet};
pub use trie::PatriciaTrie;
pub use validator::Validator;
