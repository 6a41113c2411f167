// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Trie node kinds and their canonical RLP forms.
//!
//! Raw encodings follow the Ethereum spec: Leaf `[prefixedPath, value]`,
//! Extension `[prefixedPath, nextRef]`, Branch `[ref0..ref15, value]`. A
//! child reference is the child's raw list inlined when its RLP is shorter
//! than 32 bytes, and the Keccak-256 of that RLP otherwise.

use alloy_primitives::{keccak256, B256};

use crate::rlp::RlpItem;

use super::nibbles::{nibbles_to_bytes, to_prefixed, Nibble};

const BRANCH_WIDTH: usize = 16;

/// One node of the in-memory trie.
#[derive(Clone, Debug)]
pub enum TrieNode {
    /// Terminal node holding a value at the end of a path.
    Leaf {
        /// Remaining key path in nibbles.
        path: Vec<Nibble>,
        /// Stored value bytes.
        value: Vec<u8>,
    },
    /// Shared path segment pointing at a single child.
    Extension {
        /// Shared key path in nibbles.
        path: Vec<Nibble>,
        /// The child node.
        next: Box<TrieNode>,
    },
    /// Sixteen-way fan-out with an optional value of its own.
    Branch {
        /// One slot per nibble.
        branches: [Option<Box<TrieNode>>; BRANCH_WIDTH],
        /// Value stored when a key ends exactly at this node.
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    /// An empty branch node.
    pub fn empty_branch() -> Self {
        TrieNode::Branch {
            branches: Default::default(),
            value: None,
        }
    }

    /// The node's raw RLP structure.
    pub fn raw(&self) -> RlpItem {
        match self {
            TrieNode::Leaf { path, value } => RlpItem::List(vec![
                RlpItem::Bytes(nibbles_to_bytes(&to_prefixed(path, true))),
                RlpItem::Bytes(value.clone()),
            ]),
            TrieNode::Extension { path, next } => RlpItem::List(vec![
                RlpItem::Bytes(nibbles_to_bytes(&to_prefixed(path, false))),
                next.reference(),
            ]),
            TrieNode::Branch { branches, value } => {
                let mut items = Vec::with_capacity(BRANCH_WIDTH + 1);
                for branch in branches {
                    items.push(match branch {
                        Some(child) => child.reference(),
                        None => RlpItem::Bytes(Vec::new()),
                    });
                }
                items.push(RlpItem::Bytes(value.clone().unwrap_or_default()));
                RlpItem::List(items)
            }
        }
    }

    /// How a parent refers to this node: inline below 32 encoded bytes,
    /// by hash from 32 bytes on.
    fn reference(&self) -> RlpItem {
        let raw = self.raw();
        if raw.rlp_length() >= 32 {
            RlpItem::Bytes(keccak256(raw.encoded()).to_vec())
        } else {
            raw
        }
    }

    /// Keccak-256 of the node's RLP encoding.
    pub fn hash(&self) -> B256 {
        keccak256(self.raw().encoded())
    }
}
