// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The fork tree of candidate chain tips.
//!
//! Nodes live in a generational arena and refer to each other by
//! [`NodeId`]; the child list owns the edge (each node appears in exactly
//! one parent's child list) while the parent link is a plain back index.
//! Every child entry tracks how many transitive descendants that child
//! has, so "some branch of this node has accumulated N confirmations" is
//! a single scan of the child list.

use std::sync::Arc;

use alloy_primitives::B256;
use eclipse_core::SyncState;

use crate::header::HeaderEntry;

/// Generational handle to a node in a [`ForkTree`].
///
/// Slots are reused after removal, but the generation tag keeps stale ids
/// from resolving to a new occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

/// Edge bookkeeping of one child branch.
#[derive(Clone, Copy, Debug)]
pub struct ChildInfo {
    /// Number of transitive descendants of `id`, not counting `id` itself.
    pub desc_count: u64,
    /// The child node.
    pub id: NodeId,
}

/// One node of the fork tree.
#[derive(Debug)]
pub struct ForkNode {
    parent: Option<NodeId>,
    children: Vec<ChildInfo>,
    /// The header, until the checkpoint manager takes ownership of it.
    header: Option<HeaderEntry>,
    /// Block hash, kept alongside so bookkeeping survives header release.
    hash: B256,
    /// The freshest sync epoch known when this branch was extended.
    sync_state: Arc<SyncState>,
}

impl ForkNode {
    /// The node's block hash.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// The node's header, unless the checkpoint manager took it.
    pub fn header(&self) -> Option<&HeaderEntry> {
        self.header.as_ref()
    }

    /// The sync epoch captured when the node was inserted.
    pub fn sync_state(&self) -> &Arc<SyncState> {
        &self.sync_state
    }

    /// Child edges with their descendant counts.
    pub fn children(&self) -> &[ChildInfo] {
        &self.children
    }

    /// Parent link; `None` for roots and released nodes.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

struct Slot {
    generation: u32,
    node: Option<ForkNode>,
}

/// Arena of fork nodes.
#[derive(Default)]
pub struct ForkTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl std::fmt::Debug for ForkTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForkTree").field("len", &self.len).finish()
    }
}

impl ForkTree {
    /// An empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a parentless node.
    pub fn insert_root(&mut self, header: HeaderEntry, sync_state: Arc<SyncState>) -> NodeId {
        let hash = header.hash();
        self.insert(ForkNode {
            parent: None,
            children: Vec::new(),
            header: Some(header),
            hash,
            sync_state,
        })
    }

    /// Attach a child under `parent` and propagate the new descendant to
    /// every ancestor's edge bookkeeping.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        header: HeaderEntry,
        sync_state: Arc<SyncState>,
    ) -> Option<NodeId> {
        self.get(parent)?;
        let hash = header.hash();
        let child = self.insert(ForkNode {
            parent: Some(parent),
            children: Vec::new(),
            header: Some(header),
            hash,
            sync_state,
        });
        self.node_mut(parent)?
            .children
            .push(ChildInfo { desc_count: 0, id: child });

        // walk to the root, bumping the edge that leads toward the new leaf
        let mut current = parent;
        while let Some(ancestor) = self.get(current).and_then(ForkNode::parent) {
            if let Some(node) = self.node_mut(ancestor) {
                if let Some(edge) = node.children.iter_mut().find(|c| c.id == current) {
                    edge.desc_count += 1;
                }
            }
            current = ancestor;
        }

        Some(child)
    }

    /// Borrow a node.
    pub fn get(&self, id: NodeId) -> Option<&ForkNode> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    /// Borrow a node's header, if it still owns one.
    pub fn header(&self, id: NodeId) -> Option<&HeaderEntry> {
        self.get(id)?.header()
    }

    /// Move a node's header out, leaving the node in place.
    pub fn take_header(&mut self, id: NodeId) -> Option<HeaderEntry> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()?.header.take()
    }

    /// Detach the first child of `parent` whose branch has at least
    /// `desc_count` descendants, severing its parent link. The detached
    /// branch stays in the arena, now rooted at the returned node.
    pub fn release_child_with_desc(&mut self, parent: NodeId, desc_count: u64) -> Option<NodeId> {
        let children = &mut self.node_mut(parent)?.children;
        let position = children.iter().position(|c| c.desc_count >= desc_count)?;
        let released = children.remove(position).id;
        if let Some(node) = self.node_mut(released) {
            node.parent = None;
        }
        Some(released)
    }

    /// Remove a node and its entire subtree, returning the block hashes of
    /// every removed node so callers can purge their lookup maps.
    ///
    /// Meant for detached (parentless) branches; if the node still hangs
    /// off a parent, its edge is removed but the ancestors' descendant
    /// counts are left as they were.
    pub fn remove_subtree(&mut self, id: NodeId) -> Vec<B256> {
        if let Some(parent) = self.get(id).and_then(ForkNode::parent) {
            if let Some(node) = self.node_mut(parent) {
                node.children.retain(|c| c.id != id);
            }
        }
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.slots.get_mut(current.index as usize) else {
                continue;
            };
            if slot.generation != current.generation {
                continue;
            }
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(current.index);
            self.len -= 1;
            removed.push(node.hash);
            stack.extend(node.children.iter().map(|c| c.id));
        }
        removed
    }

    fn insert(&mut self, node: ForkNode) -> NodeId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            NodeId {
                index,
                generation: 0,
            }
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut ForkNode> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }
}
