// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The monitor phase machine.
//!
//! Headers flow in through [`Monitor::update`]. During the first
//! bootstrap phase they are chained directly into checkpoint windows,
//! building from the genesis (or a configured start block) forward. After
//! that every header is attached to the fork tree by parent hash,
//! validated against fork rules and the difficulty/timing policy, scanned
//! for subscribed contract events through the verified receipt path, and
//! eventually confirmed once its branch accumulates a full checkpoint
//! window of descendants.
//!
//! State transitions are single-threaded: `update`, the phase-end calls,
//! and both header callbacks form one logical task; the embedder must
//! serialize entries.

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{Address, B256};
use eclipse_core::{
    platform::{EntropySource, TrustedClock},
    MonitorConfig, MonitorId, MonitorSecState, Phase, SyncState,
};
use tracing::{debug, error, info};

use crate::{
    checkpoint::CheckpointMgr,
    diff_checker::DiffChecker,
    error::MonitorError,
    event::{EventManager, ReceiptsGetterError},
    fork_tree::{ForkTree, NodeId},
    header::HeaderEntry,
    params::Network,
    sync_msg::SyncMsgMgr,
    validator::Validator,
};

/// Callback fired for validated and for confirmed headers.
pub type HeaderCallback = Box<dyn FnMut(&HeaderEntry)>;

/// Materializes the raw receipts of a block. Called at most once per
/// header, and only when the header's bloom matched a subscription; may be
/// slow, so callers that need a non-blocking `update` should back it with
/// a cache.
pub type ReceiptsGetter = Box<dyn FnMut(u64) -> Result<Vec<Vec<u8>>, ReceiptsGetterError>>;

/// The eclipse-attack monitor for one chain.
pub struct Monitor {
    config: MonitorConfig,
    id: MonitorId,
    sec_state: MonitorSecState,
    phase: Phase,
    clock: Box<dyn TrustedClock>,
    entropy: Box<dyn EntropySource>,

    on_header_validated: HeaderCallback,
    on_header_confirmed: HeaderCallback,
    receipts_getter: ReceiptsGetter,

    validator: Validator,
    diff_checker: DiffChecker,
    checkpoint: CheckpointMgr,
    tree: ForkTree,

    event_mgr: Arc<EventManager>,
    sync_msg: SyncMsgMgr,

    /// Tips inserted while the monitor was not (yet) synced.
    offline_nodes: HashMap<B256, NodeId>,
    /// Tips inserted under a proven-live sync epoch.
    active_nodes: HashMap<B256, NodeId>,

    start_block_num: u64,
    bootstrap_i_end: Option<u64>,
    planned_sync_block: Option<u64>,
}

impl std::fmt::Debug for Monitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("phase", &self.phase)
            .field("sec_state", &self.sec_state)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Build a monitor. The session ID is drawn immediately; the first
    /// sync epoch is drawn and registered with the event manager.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: MonitorConfig,
        network: Network,
        clock: Box<dyn TrustedClock>,
        entropy: Box<dyn EntropySource>,
        sync_contract_addr: Address,
        sync_event_signature: B256,
        receipts_getter: ReceiptsGetter,
        on_header_validated: HeaderCallback,
        on_header_confirmed: HeaderCallback,
    ) -> Self {
        let id = MonitorId::generate(entropy.as_ref());
        let sec_state = MonitorSecState::new(config.svn);
        let event_mgr = Arc::new(EventManager::new());
        let sync_msg = SyncMsgMgr::new(
            &id,
            &config,
            clock.as_ref(),
            entropy.as_ref(),
            sync_contract_addr,
            sync_event_signature,
            &event_mgr,
        );

        Self {
            checkpoint: CheckpointMgr::new(&config),
            diff_checker: DiffChecker::new(&config, network),
            validator: Validator::new(network),
            config,
            id,
            sec_state,
            phase: Phase::BootstrapI,
            clock,
            entropy,
            on_header_validated,
            on_header_confirmed,
            receipts_getter,
            tree: ForkTree::new(),
            event_mgr,
            sync_msg,
            offline_nodes: HashMap::new(),
            active_nodes: HashMap::new(),
            start_block_num: 0,
            bootstrap_i_end: None,
            planned_sync_block: None,
        }
    }

    /// Feed one raw header to the monitor.
    pub fn update(&mut self, header_bytes: &[u8]) -> Result<(), MonitorError> {
        let block_number = if self.phase == Phase::BootstrapI {
            self.update_on_bootstrap(header_bytes)?
        } else {
            // every later phase treats headers identically
            self.update_on_runtime(header_bytes)?
        };

        self.phase_change_check(block_number)?;

        if self.phase != Phase::BootstrapI {
            self.runtime_maintenance()?;
        }
        Ok(())
    }

    /// Recompute the bootstrap plan against the network's latest block
    /// number, optionally re-basing the start block.
    ///
    /// The first bootstrap phase ends two whole checkpoint windows short
    /// of the latest block, so the monitor goes live against a recent but
    /// already-stable region of the chain.
    pub fn refresh_bootstrap_plan(&mut self, latest: u64, start: Option<u64>) {
        if let Some(start) = start {
            self.start_block_num = start;
        }
        let mut log_plan = false;

        match self.phase {
            Phase::BootstrapI => {
                self.bootstrap_i_end = calc_bootstrap_end(
                    latest,
                    self.start_block_num,
                    self.config.checkpoint_size,
                );
                self.planned_sync_block = Some(latest);
                log_plan = true;
            }
            Phase::BootstrapII => {
                if self.planned_sync_block != Some(latest) {
                    log_plan = true;
                }
                self.planned_sync_block = Some(latest);
            }
            _ => {}
        }

        if log_plan {
            info!(
                start = self.start_block_num,
                latest,
                checkpoint_size = self.config.checkpoint_size,
                bootstrap_end = ?self.bootstrap_i_end,
                planned_sync = ?self.planned_sync_block,
                "bootstrap plan refreshed"
            );
        }
    }

    /// End the first bootstrap phase: the newest accepted header becomes
    /// the fork-tree anchor and live headers are accepted from here on.
    /// Driven automatically when the planned end block is reached.
    pub fn end_bootstrap_i(&mut self) -> Result<(), MonitorError> {
        let sync_state = self.sync_msg.last_sync_state();
        let anchor = self.checkpoint.end_bootstrap(&mut self.tree, sync_state)?;
        let hash = self
            .tree
            .get(anchor)
            .ok_or(MonitorError::StaleNode)?
            .hash();
        self.offline_nodes.insert(hash, anchor);
        self.phase = Phase::BootstrapII;
        debug!("first bootstrap phase ended");
        Ok(())
    }

    /// Draw a fresh sync epoch and move to the sync phase. The returned
    /// state's nonce must be published through the sync contract by the
    /// embedder. Driven automatically when the planned sync block is
    /// reached.
    pub fn refresh_sync_msg(&mut self) -> Result<Arc<SyncState>, MonitorError> {
        self.phase = Phase::Sync;
        debug!("second bootstrap phase ended");
        self.sync_msg
            .new_sync_state(&self.id, self.clock.as_ref(), self.entropy.as_ref())
    }

    /// Declare the monitor operational. Header processing is unchanged;
    /// the phase is informational for the embedder and verifiers.
    pub fn end_sync(&mut self) {
        self.phase = Phase::Runtime;
        debug!("entering runtime phase");
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// This instance's identity.
    pub fn monitor_id(&self) -> &MonitorId {
        &self.id
    }

    /// Attestable security state.
    pub fn sec_state(&self) -> &MonitorSecState {
        &self.sec_state
    }

    /// The event manager, for registering contract-event subscriptions.
    pub fn event_manager(&self) -> Arc<EventManager> {
        Arc::clone(&self.event_mgr)
    }

    /// The sync epoch most recently drawn.
    pub fn sync_state(&self) -> Arc<SyncState> {
        self.sync_msg.last_sync_state()
    }

    /// Start block of the bootstrap plan.
    pub fn start_block_num(&self) -> u64 {
        self.start_block_num
    }

    /// Planned final block of the first bootstrap phase.
    pub fn bootstrap_i_end_num(&self) -> Option<u64> {
        self.bootstrap_i_end
    }

    /// Planned block at which the sync nonce is drawn.
    pub fn planned_sync_num(&self) -> Option<u64> {
        self.planned_sync_block
    }

    fn update_on_bootstrap(&mut self, header_bytes: &[u8]) -> Result<u64, MonitorError> {
        // historical headers carry no trusted receive time
        let header = HeaderEntry::from_rlp(header_bytes, 0)?;
        let number = header.number();

        if self.checkpoint.is_empty() {
            // the very first header is the trust root
            self.sec_state.genesis_hash = header.hash();
            info!(block = number, hash = %header.hash(), "genesis block recorded");
        } else {
            let last = self.checkpoint.last_header(&self.tree)?;
            self.validator
                .common_validate(last, &header)
                .map_err(MonitorError::BootstrapValidation)?;
        }

        (self.on_header_validated)(&header);

        if self.checkpoint.add_header(header)? {
            self.on_checkpoint_complete()?;
        }
        Ok(number)
    }

    fn update_on_runtime(&mut self, header_bytes: &[u8]) -> Result<u64, MonitorError> {
        let now = self.clock.now_in_sec();
        let header = HeaderEntry::from_rlp(header_bytes, now)?;
        let number = header.number();
        let parent_hash = header.parent_hash();

        // offline tips first, then live ones
        let parent = self
            .offline_nodes
            .get(&parent_hash)
            .or_else(|| self.active_nodes.get(&parent_hash))
            .copied();

        match parent {
            Some(parent_id) => self.attach_child(parent_id, header)?,
            None => {
                error!(
                    block = number,
                    hash = %header.hash(),
                    "cannot find the parent of block"
                );
            }
        }
        Ok(number)
    }

    fn attach_child(
        &mut self,
        parent_id: NodeId,
        header: HeaderEntry,
    ) -> Result<(), MonitorError> {
        let sync_state = self.sync_msg.last_sync_state();
        let is_live = sync_state.is_synced();

        let parent = self.tree.header(parent_id).ok_or(MonitorError::StaleNode)?;

        if let Err(reason) = self.validator.common_validate(parent, &header) {
            error!(
                block = header.number(),
                hash = %header.hash(),
                %reason,
                "validation failed on block"
            );
            return Ok(());
        }
        if !self.diff_checker.check_difficulty(parent, &header) {
            error!(
                block = header.number(),
                hash = %header.hash(),
                "difficulty policy rejected block"
            );
            return Ok(());
        }

        (self.on_header_validated)(&header);

        let hash = header.hash();
        let child = self
            .tree
            .add_child(parent_id, header, sync_state)
            .ok_or(MonitorError::StaleNode)?;

        if is_live {
            self.active_nodes.insert(hash, child);
        } else {
            self.offline_nodes.insert(hash, child);
        }

        // scan the accepted header for subscribed events; the receipts
        // trie root guards the answer
        if let Some(header) = self.tree.header(child) {
            let getter = &mut self.receipts_getter;
            self.event_mgr.check_events(header, |number| getter(number))?;
        }
        Ok(())
    }

    fn runtime_maintenance(&mut self) -> Result<(), MonitorError> {
        // promote a branch that gathered a full window of descendants
        if let Some(anchor) = self.checkpoint.last_node_id() {
            let confirmed = self
                .tree
                .release_child_with_desc(anchor, self.config.checkpoint_size);
            if let Some(confirmed) = confirmed {
                let anchor_hash = self.tree.get(anchor).map(|n| n.hash());
                let confirmed_hash = self.tree.get(confirmed).map(|n| n.hash());
                for hash in [anchor_hash, confirmed_hash].into_iter().flatten() {
                    self.offline_nodes.remove(&hash);
                    self.active_nodes.remove(&hash);
                }

                let outcome = self.checkpoint.add_node(confirmed, &mut self.tree)?;
                for hash in &outcome.pruned {
                    self.offline_nodes.remove(hash);
                    self.active_nodes.remove(hash);
                }
                if outcome.completed {
                    self.on_checkpoint_complete()?;
                }
            }
        }

        // expire live tips that can no longer produce an acceptable
        // child; collect first, then delete
        let now = self.clock.now_in_sec();
        let mut expired = Vec::new();
        for (hash, id) in &self.active_nodes {
            match self.tree.header(*id) {
                Some(header) => {
                    if !self.diff_checker.check_est_difficulty(header, now)? {
                        expired.push(*hash);
                    }
                }
                None => expired.push(*hash),
            }
        }
        for hash in &expired {
            debug!(hash = %hash, "active tip expired");
            self.active_nodes.remove(hash);
        }
        Ok(())
    }

    fn phase_change_check(&mut self, block_number: u64) -> Result<(), MonitorError> {
        match self.phase {
            Phase::BootstrapI => {
                if Some(block_number) == self.bootstrap_i_end {
                    self.end_bootstrap_i()?;
                }
            }
            Phase::BootstrapII => {
                if Some(block_number) == self.planned_sync_block {
                    self.refresh_sync_msg()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn on_checkpoint_complete(&mut self) -> Result<(), MonitorError> {
        // 1. pin the new window tail into the attestable state
        let last = self.checkpoint.last_header(&self.tree)?;
        self.sec_state.checkpoint_hash = last.hash();
        self.sec_state.checkpoint_num = last.number_bytes().to_vec();

        // 2. count the completed window
        self.sec_state.checkpoint_iter += 1;

        // 3. recalibrate the difficulty floor
        self.diff_checker
            .on_checkpoint_update(&self.checkpoint, &self.tree);

        // 4. report every header of the window, in order
        let window = self.checkpoint.current_window(&self.tree);
        let first = window.first().map(|h| h.number()).unwrap_or_default();
        let last_num = window.last().map(|h| h.number()).unwrap_or_default();
        let total = window.len();
        let callback = &mut self.on_header_confirmed;
        for header in window {
            callback(header);
        }
        debug!(
            from = first,
            to = last_num,
            total,
            "confirmed checkpoint window"
        );
        Ok(())
    }
}

/// End block of the first bootstrap phase:
/// `start + (max(0, (latest - start + 1) / size - 2)) * size - 1`.
/// `None` when the plan leaves no whole window to load (bootstrap then
/// never ends on its own).
fn calc_bootstrap_end(latest: u64, start: u64, checkpoint_size: u64) -> Option<u64> {
    let num_blocks = latest.saturating_sub(start) + 1;
    let intervals = (num_blocks / checkpoint_size).saturating_sub(2);
    if intervals == 0 {
        return None;
    }
    Some(start + intervals * checkpoint_size - 1)
}
