//! Auto-save Manager
//!
//! Buffers field edits and persists them without blocking the caller,
//! without data loss, and without overlapping writes. One manager exists
//! per wizard session; it is constructed at initialization and drained at
//! teardown.
//!
//! Protocol:
//! - `enqueue` merges into the pending buffer (last-write-wins per field)
//!   and restarts a short debounce timer; a coarser forced-flush timer
//!   bounds worst-case staleness during long uninterrupted editing.
//! - `flush_now` cancels the debounce and flushes immediately; callers that
//!   must not proceed until data is durable await it.
//! - At most one flush is in flight; a second request waits behind the gate
//!   and flushes whatever accumulated meanwhile.
//! - A failed flush re-merges its patch underneath newer edits and waits
//!   for the next debounce or forced boundary; no retry storm.
//!
//! Status changes are broadcast on a `watch` channel on every transition,
//! including each successful flush, so hosts subscribe instead of polling.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::draft::{DraftPatch, FieldPath, FieldValue};
use crate::gateway::{PersistenceGateway, SaveError, SessionKey};

/// Timer settings for the save-buffering protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSaveConfig {
    /// Quiet period after the last edit before a flush, in milliseconds.
    pub debounce_ms: u64,
    /// Maximum staleness under continuous editing, in milliseconds.
    pub max_interval_ms: u64,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 2_000,
            max_interval_ms: 30_000,
        }
    }
}

impl AutoSaveConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Current persistence state, as exposed to the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    /// Nothing pending and nothing saved yet.
    Idle,
    Saving,
    Saved { at: DateTime<Utc> },
    Error { message: String },
}

struct BufferState {
    pending: DraftPatch,
    debounce: Option<JoinHandle<()>>,
    forced: Option<JoinHandle<()>>,
    last_saved: Option<DateTime<Utc>>,
    enabled: bool,
}

struct Inner {
    session: SessionKey,
    gateway: Arc<dyn PersistenceGateway>,
    config: AutoSaveConfig,
    buffer: Mutex<BufferState>,
    /// Serializes flushes: exactly one in flight per session.
    flush_gate: AsyncMutex<()>,
    status_tx: watch::Sender<SaveStatus>,
}

/// Cheap-to-clone handle; timer tasks hold clones of the same manager.
#[derive(Clone)]
pub struct AutoSaveManager {
    inner: Arc<Inner>,
}

impl AutoSaveManager {
    pub fn new(
        session: SessionKey,
        gateway: Arc<dyn PersistenceGateway>,
        config: AutoSaveConfig,
    ) -> Self {
        let (status_tx, _) = watch::channel(SaveStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                session,
                gateway,
                config,
                buffer: Mutex::new(BufferState {
                    pending: DraftPatch::new(),
                    debounce: None,
                    forced: None,
                    last_saved: None,
                    enabled: true,
                }),
                flush_gate: AsyncMutex::new(()),
                status_tx,
            }),
        }
    }

    /// Observe status transitions (saving, saved-at, error).
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn status(&self) -> SaveStatus {
        self.inner.status_tx.borrow().clone()
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.inner.buffer.lock().last_saved
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.buffer.lock().pending.is_empty()
    }

    /// Buffer one field edit and (re)arm the timers. Must be called from
    /// within a tokio runtime.
    pub fn enqueue(&self, field: FieldPath, value: FieldValue) {
        let mut state = self.inner.buffer.lock();
        if !state.enabled {
            return;
        }
        state.pending.insert(field, value);

        if let Some(handle) = state.debounce.take() {
            handle.abort();
        }
        // The task clears its own handle after the sleep and before the
        // flush, so an abort() can only ever cancel the sleeping phase,
        // never a flush that has already snapshotted the buffer.
        let manager = self.clone();
        let delay = self.inner.config.debounce();
        state.debounce = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.inner.buffer.lock().debounce = None;
            let _ = manager.flush().await;
        }));

        // Forced flush arms once per dirty period; it bounds staleness while
        // continuous edits keep resetting the debounce.
        self.arm_forced(&mut state);
    }

    fn arm_forced(&self, state: &mut BufferState) {
        if state.forced.is_some() || !state.enabled {
            return;
        }
        let manager = self.clone();
        let interval = self.inner.config.max_interval();
        state.forced = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            manager.inner.buffer.lock().forced = None;
            let _ = manager.flush().await;
        }));
    }

    /// Cancel the debounce and flush immediately. Resolves when the flush
    /// completes; on failure the buffer is left intact for the next boundary.
    pub async fn flush_now(&self) -> Result<(), SaveError> {
        if let Some(handle) = self.inner.buffer.lock().debounce.take() {
            handle.abort();
        }
        self.flush().await
    }

    /// Cancel timers and drain any remaining edits. The manager accepts no
    /// further edits afterwards.
    pub async fn shutdown(&self) {
        {
            let mut state = self.inner.buffer.lock();
            state.enabled = false;
            if let Some(handle) = state.debounce.take() {
                handle.abort();
            }
            if let Some(handle) = state.forced.take() {
                handle.abort();
            }
        }
        if let Err(error) = self.flush().await {
            warn!(session = %self.inner.session, %error, "final auto-save drain failed");
        }
    }

    async fn flush(&self) -> Result<(), SaveError> {
        // Queue behind any in-flight flush; the buffer is snapshotted only
        // after the gate opens so this flush picks up edits made meanwhile.
        let _gate = self.inner.flush_gate.lock().await;

        let patch = {
            let mut state = self.inner.buffer.lock();
            if state.pending.is_empty() {
                return Ok(());
            }
            std::mem::take(&mut state.pending)
        };

        self.inner.status_tx.send_replace(SaveStatus::Saving);
        match self
            .inner
            .gateway
            .save(&self.inner.session, &patch)
            .await
        {
            Ok(()) => {
                let at = Utc::now();
                {
                    let mut state = self.inner.buffer.lock();
                    state.last_saved = Some(at);
                    if state.pending.is_empty() {
                        if let Some(handle) = state.forced.take() {
                            handle.abort();
                        }
                    }
                }
                debug!(session = %self.inner.session, fields = patch.len(), "auto-save flushed");
                self.inner.status_tx.send_replace(SaveStatus::Saved { at });
                Ok(())
            }
            Err(error) => {
                // Re-merge underneath anything enqueued during the attempt;
                // newer values win per field. The forced timer is re-armed
                // so the retained buffer gets a retry boundary even if the
                // user never edits again.
                {
                    let mut state = self.inner.buffer.lock();
                    for (field, value) in patch {
                        state.pending.entry(field).or_insert(value);
                    }
                    self.arm_forced(&mut state);
                }
                warn!(session = %self.inner.session, %error, "auto-save flush failed; buffer retained");
                self.inner.status_tx.send_replace(SaveStatus::Error {
                    message: error.to_string(),
                });
                Err(error)
            }
        }
    }
}
