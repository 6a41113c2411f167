// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Contract-event subscriptions and per-block event matching.
//!
//! Matching is a two-stage funnel. The header's logs bloom is probed with
//! the pre-hashed address and topics of every subscription; only if some
//! subscription probes positive are the block's receipts materialized, and
//! believed only once their rebuilt trie root equals the header's
//! `receiptsRoot`. A bloom-positive block whose receipts do not hash to
//! the header root is treated as evidence of tampering.
//!
//! The registration map is guarded by a mutex that is *never* held while a
//! callback runs, so callbacks are free to register or cancel listeners —
//! the sync listener cancels itself this way.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use alloy_primitives::{keccak256, Address, B256};
use tracing::debug;

use crate::{
    error::EventError,
    header::HeaderEntry,
    receipt::{LogEntry, ReceiptSet},
};

/// Handle identifying one event subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallbackId(u64);

/// Callback invoked for every matching log of a verified block.
pub type EventCallback = Box<dyn Fn(&HeaderEntry, &LogEntry, CallbackId) + Send + Sync>;

/// Error type a receipts getter may return.
pub type ReceiptsGetterError = Box<dyn std::error::Error + Send + Sync>;

/// One event subscription: the contract, the wanted topic prefix, and the
/// Keccak digests of both for bloom probing.
pub struct EventDescription {
    /// Emitting contract address.
    pub contract_addr: Address,
    /// Topic prefix the log must carry.
    pub topics: Vec<B256>,
    /// Keccak-256 of the address and of each topic, probed against blooms.
    hashes: Vec<B256>,
    callback: EventCallback,
}

impl EventDescription {
    /// Describe an event and the callback to fire when it is observed.
    pub fn new(contract_addr: Address, topics: Vec<B256>, callback: EventCallback) -> Self {
        let mut hashes = Vec::with_capacity(1 + topics.len());
        hashes.push(keccak256(contract_addr.as_slice()));
        for topic in &topics {
            hashes.push(keccak256(topic.as_slice()));
        }
        Self {
            contract_addr,
            topics,
            hashes,
            callback,
        }
    }
}

impl std::fmt::Debug for EventDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDescription")
            .field("contract_addr", &self.contract_addr)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

/// Thread-safe event subscription registry.
#[derive(Debug, Default)]
pub struct EventManager {
    descriptions: Mutex<HashMap<CallbackId, Arc<EventDescription>>>,
    next_id: AtomicU64,
}

impl EventManager {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription, returning its cancellation handle.
    pub fn listen(&self, description: EventDescription) -> CallbackId {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().insert(id, Arc::new(description));
        id
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn cancel(&self, id: CallbackId) {
        self.lock().remove(&id);
    }

    /// Number of live subscriptions.
    pub fn num_listeners(&self) -> usize {
        self.lock().len()
    }

    /// Match a verified header's block against every subscription.
    ///
    /// `receipts_getter` is called at most once, and only when at least
    /// one subscription passes the bloom pre-filter. All callbacks run
    /// after the registration lock is released.
    pub fn check_events<G>(
        &self,
        header: &HeaderEntry,
        receipts_getter: G,
    ) -> Result<(), EventError>
    where
        G: FnOnce(u64) -> Result<Vec<Vec<u8>>, ReceiptsGetterError>,
    {
        // plan entries keep the description alive past the lock
        let mut plans: Vec<(CallbackId, Arc<EventDescription>, Vec<LogEntry>)> = Vec::new();

        {
            let descriptions = self.lock();

            let bloom = header.bloom();
            let bloomed: Vec<_> = descriptions
                .iter()
                .filter(|(_, desc)| bloom.contains_all(desc.hashes.iter()))
                .collect();

            // blooms have no false negatives, so a miss is final
            if bloomed.is_empty() {
                return Ok(());
            }

            debug!(
                positives = bloomed.len(),
                block = header.number(),
                "bloom pre-filter passed"
            );

            let raw_receipts = receipts_getter(header.number())
                .map_err(|e| EventError::ReceiptsFetch(header.number(), e))?;
            let receipts = ReceiptSet::from_raw_list(&raw_receipts)?;

            // the root must check out before any log in here is believed;
            // this also makes a bloom false positive trustworthy evidence
            // that the event is absent
            if receipts.root() != header.receipts_root() {
                return Err(EventError::ReceiptsRootMismatch {
                    number: header.number(),
                    expected: header.receipts_root(),
                    computed: receipts.root(),
                });
            }

            for (id, desc) in bloomed {
                let logs = receipts.search_events(&desc.contract_addr, &desc.topics);
                if !logs.is_empty() {
                    debug!(
                        matches = logs.len(),
                        block = header.number(),
                        "events matched in verified receipts"
                    );
                    plans.push((*id, Arc::clone(desc), logs.into_iter().cloned().collect()));
                }
            }
        }

        // registration lock released: callbacks may listen/cancel freely
        for (id, desc, logs) in &plans {
            for log in logs {
                (desc.callback)(header, log, *id);
            }
        }

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CallbackId, Arc<EventDescription>>> {
        // a poisoned registry is still structurally intact; keep serving
        self.descriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
