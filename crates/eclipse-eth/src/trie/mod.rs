// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A write-only Merkle-Patricia trie.
//!
//! The monitor only ever needs to rebuild a root hash from a known set of
//! `(rlp(index), value)` pairs, so this trie supports `put` and `hash` and
//! nothing else. Inserting the receipts (or transactions) of a block in
//! order and hashing yields the header's `receiptsRoot`
//! (`transactionsRoot`).

pub mod nibbles;
pub mod node;

use alloy_primitives::{b256, B256};

use self::{
    nibbles::{bytes_to_nibbles, prefix_matched_len, Nibble},
    node::TrieNode,
};

/// Keccak-256 of the RLP of an empty byte string: the root of an empty
/// trie.
pub const EMPTY_ROOT_HASH: B256 =
    b256!("56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421");

/// An insert-only Patricia trie over owned byte keys and values.
#[derive(Debug, Default)]
pub struct PatriciaTrie {
    root: Option<Box<TrieNode>>,
}

impl PatriciaTrie {
    /// An empty trie.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key`. Re-inserting a key replaces its value.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        let nibbles = bytes_to_nibbles(key);
        self.root = Some(put_key(self.root.take(), &nibbles, value));
    }

    /// Root hash of the trie, or [`EMPTY_ROOT_HASH`] when nothing has been
    /// inserted.
    pub fn hash(&self) -> B256 {
        match &self.root {
            Some(root) => root.hash(),
            None => EMPTY_ROOT_HASH,
        }
    }
}

fn put_key(slot: Option<Box<TrieNode>>, nibbles: &[Nibble], value: &[u8]) -> Box<TrieNode> {
    let Some(node) = slot else {
        return Box::new(TrieNode::Leaf {
            path: nibbles.to_vec(),
            value: value.to_vec(),
        });
    };

    match *node {
        TrieNode::Leaf {
            path,
            value: old_value,
        } => put_into_leaf(path, old_value, nibbles, value),
        TrieNode::Branch {
            mut branches,
            value: branch_value,
        } => {
            if nibbles.is_empty() {
                Box::new(TrieNode::Branch {
                    branches,
                    value: Some(value.to_vec()),
                })
            } else {
                let idx = nibbles[0] as usize;
                branches[idx] = Some(put_key(branches[idx].take(), &nibbles[1..], value));
                Box::new(TrieNode::Branch {
                    branches,
                    value: branch_value,
                })
            }
        }
        TrieNode::Extension { path, next } => put_into_extension(path, next, nibbles, value),
    }
}

/// Replace a leaf with a branch (possibly behind an extension) that holds
/// both the old and the new value.
fn put_into_leaf(
    leaf_path: Vec<Nibble>,
    leaf_value: Vec<u8>,
    nibbles: &[Nibble],
    value: &[u8],
) -> Box<TrieNode> {
    let matched = prefix_matched_len(nibbles, &leaf_path);

    if matched == nibbles.len() && matched == leaf_path.len() {
        // exact same path: replace the value
        return Box::new(TrieNode::Leaf {
            path: leaf_path,
            value: value.to_vec(),
        });
    }

    let mut branches: [Option<Box<TrieNode>>; 16] = Default::default();
    let mut branch_value = None;

    if matched == leaf_path.len() {
        branch_value = Some(leaf_value);
    } else {
        let nib = leaf_path[matched] as usize;
        branches[nib] = Some(Box::new(TrieNode::Leaf {
            path: leaf_path[matched + 1..].to_vec(),
            value: leaf_value,
        }));
    }

    if matched == nibbles.len() {
        branch_value = Some(value.to_vec());
    } else {
        let nib = nibbles[matched] as usize;
        branches[nib] = Some(Box::new(TrieNode::Leaf {
            path: nibbles[matched + 1..].to_vec(),
            value: value.to_vec(),
        }));
    }

    let branch = Box::new(TrieNode::Branch {
        branches,
        value: branch_value,
    });

    if matched > 0 {
        Box::new(TrieNode::Extension {
            path: leaf_path[..matched].to_vec(),
            next: branch,
        })
    } else {
        branch
    }
}

/// Descend through an extension, splitting it when the new path diverges
/// inside the shared segment.
fn put_into_extension(
    ext_path: Vec<Nibble>,
    next: Box<TrieNode>,
    nibbles: &[Nibble],
    value: &[u8],
) -> Box<TrieNode> {
    let matched = prefix_matched_len(nibbles, &ext_path);

    if matched == ext_path.len() {
        // stays inside the extension; recurse into the child
        let next = put_key(Some(next), &nibbles[matched..], value);
        return Box::new(TrieNode::Extension {
            path: ext_path,
            next,
        });
    }

    // diverges inside the shared segment: split into a branch
    let shared = &ext_path[..matched];
    let ext_nibble = ext_path[matched] as usize;
    let ext_remaining = &ext_path[matched + 1..];

    let mut branches: [Option<Box<TrieNode>>; 16] = Default::default();
    branches[ext_nibble] = Some(if ext_remaining.is_empty() {
        next
    } else {
        Box::new(TrieNode::Extension {
            path: ext_remaining.to_vec(),
            next,
        })
    });

    let new_nibble = nibbles[matched] as usize;
    branches[new_nibble] = Some(Box::new(TrieNode::Leaf {
        path: nibbles[matched + 1..].to_vec(),
        value: value.to_vec(),
    }));

    let branch = Box::new(TrieNode::Branch {
        branches,
        value: None,
    });

    if shared.is_empty() {
        branch
    } else {
        Box::new(TrieNode::Extension {
            path: shared.to_vec(),
            next: branch,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rlp::RlpItem;
    use alloy_primitives::keccak256;

    #[test]
    fn empty_trie_has_canonical_hash() {
        assert_eq!(PatriciaTrie::new().hash(), EMPTY_ROOT_HASH);
        // the constant is keccak(rlp(""))
        assert_eq!(EMPTY_ROOT_HASH, keccak256([0x80u8]));
    }

    #[test]
    fn single_entry_root_matches_manual_leaf_encoding() {
        let mut trie = PatriciaTrie::new();
        trie.put(&[0x01, 0x02], b"some value");

        // hand-built: leaf [hex-prefix(path, leaf), value]
        let manual = RlpItem::List(vec![
            RlpItem::Bytes(vec![0x20, 0x01, 0x02]),
            RlpItem::Bytes(b"some value".to_vec()),
        ]);
        assert_eq!(trie.hash(), keccak256(manual.encoded()));
    }

    #[test]
    fn replacing_a_key_changes_nothing_but_the_value() {
        let mut a = PatriciaTrie::new();
        a.put(&[0x01], b"old");
        a.put(&[0x01], b"new");

        let mut b = PatriciaTrie::new();
        b.put(&[0x01], b"new");

        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let keys: [&[u8]; 4] = [&[0x01], &[0x02], &[0x11, 0x00], &[0x11, 0x55]];
        let mut forward = PatriciaTrie::new();
        for k in keys {
            forward.put(k, k);
        }
        let mut backward = PatriciaTrie::new();
        for k in keys.iter().rev() {
            backward.put(k, k);
        }
        assert_eq!(forward.hash(), backward.hash());
    }

    #[test]
    fn diverging_leaf_builds_branch_under_extension() {
        // keys share the first nibble, so the root must be an extension
        let mut trie = PatriciaTrie::new();
        trie.put(&[0x11], b"a");
        trie.put(&[0x12], b"b");

        // manual structure: Extension(path=[1]) -> Branch with leaves at
        // nibbles 1 and 2, each with empty remaining path
        let leaf_a = RlpItem::List(vec![
            RlpItem::Bytes(vec![0x20]),
            RlpItem::Bytes(b"a".to_vec()),
        ]);
        let leaf_b = RlpItem::List(vec![
            RlpItem::Bytes(vec![0x20]),
            RlpItem::Bytes(b"b".to_vec()),
        ]);
        let mut branch_items: Vec<RlpItem> = (0..16).map(|_| RlpItem::Bytes(vec![])).collect();
        branch_items[1] = leaf_a;
        branch_items[2] = leaf_b;
        branch_items.push(RlpItem::Bytes(vec![]));
        let branch = RlpItem::List(branch_items);
        // branch encodes below 32 bytes? it holds two 3-byte leaves, so
        // it is 23 bytes and gets inlined
        let ext = RlpItem::List(vec![RlpItem::Bytes(vec![0x11]), branch]);

        assert_eq!(trie.hash(), keccak256(ext.encoded()));
    }

    #[test]
    fn key_ending_inside_branch_sets_branch_value() {
        let mut trie = PatriciaTrie::new();
        trie.put(&[0x12, 0x34], b"long");
        trie.put(&[0x12], b"short");
        // order-independence double-checks the branch-value path
        let mut other = PatriciaTrie::new();
        other.put(&[0x12], b"short");
        other.put(&[0x12, 0x34], b"long");
        assert_eq!(trie.hash(), other.hash());
    }
}
