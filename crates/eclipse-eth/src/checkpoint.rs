// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Rolling checkpoint windows of accepted headers.
//!
//! During the first bootstrap phase headers are appended directly; at
//! runtime the manager is fed confirmed fork-tree nodes instead, holding
//! the most recent one as the *anchor* (the root the fork tree grows
//! from) until its successor arrives. Whenever the candidate window fills
//! up it becomes the current window and the caller is told to run its
//! completion chain.

use std::sync::Arc;

use alloy_primitives::B256;
use eclipse_core::{MonitorConfig, SyncState};

use crate::{
    error::CheckpointError,
    fork_tree::{ForkTree, NodeId},
    header::HeaderEntry,
};

/// Outcome of feeding one confirmed node to the manager.
#[derive(Debug)]
pub struct NodeAccepted {
    /// Whether this acceptance completed a checkpoint window.
    pub completed: bool,
    /// Block hashes of fork-tree nodes pruned while the previous anchor
    /// was promoted; the caller must drop them from its lookup maps.
    pub pruned: Vec<B256>,
}

/// Manager of the current and in-progress checkpoint windows.
#[derive(Debug)]
pub struct CheckpointMgr {
    checkpoint_size: usize,
    curr_window: Vec<HeaderEntry>,
    candidate: Vec<HeaderEntry>,
    last_node: Option<NodeId>,
    last_node_is_candidate: bool,
}

impl CheckpointMgr {
    /// A manager sized from the monitor configuration.
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            checkpoint_size: config.checkpoint_size as usize,
            curr_window: Vec::new(),
            candidate: Vec::new(),
            last_node: None,
            last_node_is_candidate: false,
        }
    }

    /// Number of headers currently counted toward the candidate window.
    pub fn num_candidates(&self) -> usize {
        let last = usize::from(self.last_node.is_some() && self.last_node_is_candidate);
        self.candidate.len() + last
    }

    /// Whether nothing has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.last_node.is_none() && self.candidate.is_empty() && self.curr_window.is_empty()
    }

    /// The anchor node, once the bootstrap phase has ended.
    pub fn last_node_id(&self) -> Option<NodeId> {
        self.last_node
    }

    /// Append a header during the first bootstrap phase. Headers must
    /// arrive oldest first; parent linkage is the caller's concern.
    /// Returns whether this append completed a window.
    pub fn add_header(&mut self, header: HeaderEntry) -> Result<bool, CheckpointError> {
        if self.last_node.is_some() {
            return Err(CheckpointError::AlreadyRuntime);
        }

        self.candidate.push(header);
        if self.num_candidates() >= self.checkpoint_size {
            self.curr_window = std::mem::take(&mut self.candidate);
            return Ok(true);
        }
        Ok(false)
    }

    /// Accept a confirmed fork-tree node at runtime.
    ///
    /// The incoming node becomes the new anchor; the previous anchor's
    /// header is promoted into the candidate or current window and the
    /// rest of its branch (abandoned siblings) is pruned from the tree.
    /// The caller must have detached `node` from the previous anchor
    /// beforehand.
    pub fn add_node(
        &mut self,
        node: NodeId,
        tree: &mut ForkTree,
    ) -> Result<NodeAccepted, CheckpointError> {
        let mut pruned = Vec::new();
        let completing = self.num_candidates() + 1 >= self.checkpoint_size;

        if let Some(previous) = self.last_node.take() {
            let header = tree
                .take_header(previous)
                .ok_or(CheckpointError::StaleNode)?;
            if completing || self.last_node_is_candidate {
                self.candidate.push(header);
            } else {
                self.curr_window.push(header);
            }
            pruned = tree.remove_subtree(previous);
        }

        if completing {
            self.curr_window = std::mem::take(&mut self.candidate);
        }

        self.last_node = Some(node);
        self.last_node_is_candidate = !completing;

        Ok(NodeAccepted {
            completed: completing,
            pruned,
        })
    }

    /// Leave the bootstrap phase: the newest header of the current window
    /// becomes the fork-tree root (the anchor), carrying the given sync
    /// epoch.
    pub fn end_bootstrap(
        &mut self,
        tree: &mut ForkTree,
        sync_state: Arc<SyncState>,
    ) -> Result<NodeId, CheckpointError> {
        if self.last_node.is_some() {
            return Err(CheckpointError::AlreadyRuntime);
        }
        if !self.candidate.is_empty() {
            return Err(CheckpointError::CandidateNotEmpty(self.candidate.len()));
        }
        let header = self.curr_window.pop().ok_or(CheckpointError::Empty)?;
        let id = tree.insert_root(header, sync_state);
        self.last_node = Some(id);
        self.last_node_is_candidate = false;
        Ok(id)
    }

    /// The most recently accepted header: the anchor if there is one,
    /// else the newest candidate, else the newest confirmed header.
    pub fn last_header<'a>(&'a self, tree: &'a ForkTree) -> Result<&'a HeaderEntry, CheckpointError> {
        if let Some(id) = self.last_node {
            return tree.header(id).ok_or(CheckpointError::StaleNode);
        }
        self.candidate
            .last()
            .or_else(|| self.curr_window.last())
            .ok_or(CheckpointError::Empty)
    }

    /// Headers of the current (last completed) window in order, including
    /// the anchor when it belongs to that window.
    pub fn current_window<'a>(&'a self, tree: &'a ForkTree) -> Vec<&'a HeaderEntry> {
        let mut headers: Vec<&HeaderEntry> = self.curr_window.iter().collect();
        if let Some(id) = self.last_node {
            if !self.last_node_is_candidate {
                if let Some(header) = tree.header(id) {
                    headers.push(header);
                }
            }
        }
        headers
    }

    /// Block-number range `[start, start + checkpoint_size - 1]` covered
    /// by the current window.
    pub fn block_num_range(&self) -> Result<(u64, u64), CheckpointError> {
        let first = self.curr_window.first().ok_or(CheckpointError::Empty)?;
        let start = first.number();
        Ok((start, start + self.checkpoint_size as u64 - 1))
    }

    /// Difficulty "median" of the current window.
    ///
    /// This is deliberately the selection-nth value at position
    /// `len / 2` of the sorted difficulties, not the statistical median:
    /// for an even-sized window the upper of the two middle elements is
    /// returned. The difficulty policy is calibrated against exactly this
    /// value.
    pub fn diff_median(&self, tree: &ForkTree) -> Option<u64> {
        let mut diffs: Vec<u64> = self
            .current_window(tree)
            .iter()
            .map(|h| h.difficulty())
            .collect();
        if diffs.is_empty() {
            return None;
        }
        let mid = diffs.len() / 2;
        let (_, median, _) = diffs.select_nth_unstable(mid);
        Some(*median)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{test_support::build_header, EMPTY_UNCLES_HASH};
    use eclipse_core::platform::{EntropySource, TrustedClock};

    struct FixedClock;
    impl TrustedClock for FixedClock {
        fn now_in_sec(&self) -> u64 {
            1_000
        }
    }
    struct ZeroEntropy;
    impl EntropySource for ZeroEntropy {
        fn fill_bytes(&self, buf: &mut [u8]) {
            buf.fill(0);
        }
    }

    fn sync_state() -> Arc<SyncState> {
        Arc::new(SyncState::generate(13, &FixedClock, &ZeroEntropy))
    }

    fn config(size: u64) -> MonitorConfig {
        MonitorConfig {
            checkpoint_size: size,
            ..MonitorConfig::ethereum_mainnet()
        }
    }

    fn header(number: u64, difficulty: u64) -> HeaderEntry {
        let raw = build_header(
            B256::with_last_byte(number as u8),
            EMPTY_UNCLES_HASH,
            number,
            number * 13,
            difficulty,
            &[0u8; 256],
            B256::ZERO,
        );
        HeaderEntry::from_rlp(&raw, 0).unwrap()
    }

    #[test]
    fn bootstrap_window_completes_at_size() {
        let mut mgr = CheckpointMgr::new(&config(4));
        assert!(mgr.is_empty());
        for n in 0..3 {
            assert!(!mgr.add_header(header(n, 1)).unwrap());
        }
        assert!(mgr.add_header(header(3, 1)).unwrap());
        assert_eq!(mgr.num_candidates(), 0);
        assert_eq!(mgr.block_num_range().unwrap(), (0, 3));
    }

    #[test]
    fn add_header_after_bootstrap_is_phase_misuse() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(2));
        mgr.add_header(header(0, 1)).unwrap();
        mgr.add_header(header(1, 1)).unwrap();
        mgr.end_bootstrap(&mut tree, sync_state()).unwrap();
        assert!(matches!(
            mgr.add_header(header(2, 1)),
            Err(CheckpointError::AlreadyRuntime)
        ));
    }

    #[test]
    fn end_bootstrap_requires_clean_candidate() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(4));
        mgr.add_header(header(0, 1)).unwrap();
        assert!(matches!(
            mgr.end_bootstrap(&mut tree, sync_state()),
            Err(CheckpointError::CandidateNotEmpty(1))
        ));
    }

    #[test]
    fn end_bootstrap_promotes_window_tail() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(4));
        for n in 0..4 {
            mgr.add_header(header(n, 1)).unwrap();
        }
        let anchor = mgr.end_bootstrap(&mut tree, sync_state()).unwrap();
        assert_eq!(tree.header(anchor).unwrap().number(), 3);
        // the anchor still counts toward the current window view
        let window: Vec<u64> = mgr
            .current_window(&tree)
            .iter()
            .map(|h| h.number())
            .collect();
        assert_eq!(window, vec![0, 1, 2, 3]);
    }

    #[test]
    fn runtime_roll_after_checkpoint_size_nodes() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(4));
        for n in 0..4 {
            mgr.add_header(header(n, 1)).unwrap();
        }
        let mut anchor = mgr.end_bootstrap(&mut tree, sync_state()).unwrap();

        // exactly checkpoint_size accepted nodes trigger exactly one roll
        let mut completions = 0;
        for n in 4..8 {
            let child = tree.add_child(anchor, header(n, 1), sync_state()).unwrap();
            let released = tree.release_child_with_desc(anchor, 0).unwrap();
            assert_eq!(released, child);
            let outcome = mgr.add_node(released, &mut tree).unwrap();
            completions += usize::from(outcome.completed);
            anchor = released;
        }
        assert_eq!(completions, 1);
        let window: Vec<u64> = mgr
            .current_window(&tree)
            .iter()
            .map(|h| h.number())
            .collect();
        assert_eq!(window, vec![4, 5, 6, 7]);
    }

    #[test]
    fn nth_element_median_semantics() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(4));
        for (n, diff) in [(0u64, 40u64), (1, 10), (2, 30), (3, 20)] {
            mgr.add_header(header(n, diff)).unwrap();
        }
        // sorted: [10, 20, 30, 40]; position 4/2 = 2 selects 30, not the
        // statistical median 25
        assert_eq!(mgr.diff_median(&tree), Some(30));
    }

    #[test]
    fn median_of_odd_window() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(3));
        for (n, diff) in [(0u64, 50u64), (1, 10), (2, 30)] {
            mgr.add_header(header(n, diff)).unwrap();
        }
        assert_eq!(mgr.diff_median(&tree), Some(30));
    }

    #[test]
    fn last_header_prefers_anchor() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(2));
        assert!(matches!(
            mgr.last_header(&tree),
            Err(CheckpointError::Empty)
        ));
        mgr.add_header(header(0, 1)).unwrap();
        assert_eq!(mgr.last_header(&tree).unwrap().number(), 0);
        mgr.add_header(header(1, 1)).unwrap();
        mgr.end_bootstrap(&mut tree, sync_state()).unwrap();
        assert_eq!(mgr.last_header(&tree).unwrap().number(), 1);
    }

    #[test]
    fn abandoned_siblings_are_pruned_on_roll() {
        let mut tree = ForkTree::new();
        let mut mgr = CheckpointMgr::new(&config(4));
        for n in 0..4 {
            mgr.add_header(header(n, 1)).unwrap();
        }
        let anchor = mgr.end_bootstrap(&mut tree, sync_state()).unwrap();

        // two competing children; only `kept` gets descendants
        let kept = tree.add_child(anchor, header(4, 1), sync_state()).unwrap();
        let dead = tree.add_child(anchor, header(104, 1), sync_state()).unwrap();
        let dead_hash = tree.get(dead).unwrap().hash();

        let released = tree.release_child_with_desc(anchor, 0).unwrap();
        assert_eq!(released, kept);
        let outcome = mgr.add_node(released, &mut tree).unwrap();
        assert!(outcome.pruned.contains(&dead_hash));
        assert!(tree.get(dead).is_none());
        assert!(tree.get(kept).is_some());
    }
}
