// Copyright 2025 Semiotic AI, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The synchronization nonce protocol.
//!
//! The monitor proves it is not eclipsed by binding its liveness to the
//! chain: it draws a random nonce, the embedder publishes the nonce
//! through the sync contract, and the monitor watches for the resulting
//! event `(syncContract, [eventSignature, sessionId, nonce])`. Observing
//! the event within the configured window — through the fully verified
//! receipt path — proves the monitor's view is at most that window behind
//! the real chain.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use alloy_primitives::{hex, Address, B256};
use eclipse_core::{
    platform::{EntropySource, TrustedClock},
    MonitorConfig, MonitorId, SyncState,
};
use tracing::{debug, info};

use crate::{
    error::MonitorError,
    event::{CallbackId, EventDescription, EventManager},
};

struct Registration {
    current: Arc<SyncState>,
    callback_id: CallbackId,
}

/// Manager of the current sync epoch and its event listener.
pub struct SyncMsgMgr {
    session_topic: B256,
    sync_max_wait_time: u64,
    contract_addr: Address,
    event_signature: B256,
    event_mgr: Weak<EventManager>,
    registration: Mutex<Registration>,
}

impl std::fmt::Debug for SyncMsgMgr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncMsgMgr")
            .field("contract_addr", &self.contract_addr)
            .field("event_signature", &self.event_signature)
            .finish_non_exhaustive()
    }
}

impl SyncMsgMgr {
    /// Create the manager, draw the first sync epoch, and register its
    /// listener with the event manager.
    pub fn new(
        monitor_id: &MonitorId,
        config: &MonitorConfig,
        clock: &dyn TrustedClock,
        entropy: &dyn EntropySource,
        contract_addr: Address,
        event_signature: B256,
        event_mgr: &Arc<EventManager>,
    ) -> Self {
        // the 16-byte session id rides left-aligned in a 32-byte topic
        let mut session_topic = B256::ZERO;
        session_topic.0[..monitor_id.session_id().len()]
            .copy_from_slice(monitor_id.session_id());

        let current = Arc::new(SyncState::generate(
            config.sync_max_wait_time,
            clock,
            entropy,
        ));
        let callback_id = register_listener(
            event_mgr,
            contract_addr,
            event_signature,
            session_topic,
            &current,
        );
        log_new_epoch(monitor_id, &current);

        Self {
            session_topic,
            sync_max_wait_time: config.sync_max_wait_time,
            contract_addr,
            event_signature,
            event_mgr: Arc::downgrade(event_mgr),
            registration: Mutex::new(Registration {
                current,
                callback_id,
            }),
        }
    }

    /// The sync epoch most recently published.
    pub fn last_sync_state(&self) -> Arc<SyncState> {
        Arc::clone(&self.lock().current)
    }

    /// Start a new sync epoch: cancel the previous listener, draw a fresh
    /// nonce, and register a listener bound to it. Returns the new epoch
    /// so the embedder can publish the nonce on-chain.
    #[cfg(not(feature = "dev-disable-sync-refresh"))]
    pub fn new_sync_state(
        &self,
        monitor_id: &MonitorId,
        clock: &dyn TrustedClock,
        entropy: &dyn EntropySource,
    ) -> Result<Arc<SyncState>, MonitorError> {
        let mut registration = self.lock();

        let event_mgr = self.event_mgr.upgrade().ok_or(MonitorError::EventManagerGone)?;
        event_mgr.cancel(registration.callback_id);

        let state = Arc::new(SyncState::generate(self.sync_max_wait_time, clock, entropy));
        registration.callback_id = register_listener(
            &event_mgr,
            self.contract_addr,
            self.event_signature,
            self.session_topic,
            &state,
        );
        registration.current = Arc::clone(&state);
        log_new_epoch(monitor_id, &state);

        Ok(state)
    }

    /// Development build: sync refresh disabled, the initial epoch lives
    /// forever.
    #[cfg(feature = "dev-disable-sync-refresh")]
    pub fn new_sync_state(
        &self,
        _monitor_id: &MonitorId,
        _clock: &dyn TrustedClock,
        _entropy: &dyn EntropySource,
    ) -> Result<Arc<SyncState>, MonitorError> {
        Ok(self.last_sync_state())
    }

    fn lock(&self) -> MutexGuard<'_, Registration> {
        self.registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Register the self-cancelling sync-event listener for one epoch.
fn register_listener(
    event_mgr: &Arc<EventManager>,
    contract_addr: Address,
    event_signature: B256,
    session_topic: B256,
    state: &Arc<SyncState>,
) -> CallbackId {
    let nonce_topic = B256::from_slice(state.nonce());
    let state = Arc::clone(state);
    let weak_mgr = Arc::downgrade(event_mgr);

    event_mgr.listen(EventDescription::new(
        contract_addr,
        vec![event_signature, session_topic, nonce_topic],
        Box::new(move |header, _log, callback_id| {
            if !state.is_synced() {
                state.set_synced(header.trusted_time());
                debug!(block = header.number(), "sync message observed on-chain");
            }
            // fires once: unregister ourselves
            if let Some(mgr) = weak_mgr.upgrade() {
                mgr.cancel(callback_id);
            }
        }),
    ))
}

fn log_new_epoch(monitor_id: &MonitorId, state: &SyncState) {
    info!(
        session_id = %hex::encode(monitor_id.session_id()),
        nonce = %hex::encode(state.nonce()),
        "sync message generated"
    );
}
