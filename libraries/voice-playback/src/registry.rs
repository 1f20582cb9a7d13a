//! Tenant state and the process-wide tenant registry
//!
//! Each tenant's [`TenantPlaybackState`] is owned by exactly one worker task.
//! The [`PlaybackRegistry`] maps tenant ids to the inbound channel of that
//! worker; it is the only way to reach a tenant's state, so every mutation
//! (command or stream-end event) is serialized through the worker.

use crate::error::{PlaybackError, Result};
use crate::queue::TenantQueue;
use crate::types::{PlaybackPhase, StreamHandle, TenantId, Track};
use crate::worker::TenantMessage;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// The running stream of a tenant
///
/// Track and handle live together so that "current track set" and "live
/// stream handle registered" can never disagree.
#[derive(Debug, Clone)]
struct ActiveStream {
    track: Arc<Track>,
    handle: StreamHandle,
}

/// Playback state of one tenant
#[derive(Debug, Clone)]
pub struct TenantPlaybackState {
    active: Option<ActiveStream>,
    paused: bool,
    queue: TenantQueue,
}

impl TenantPlaybackState {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            active: None,
            paused: false,
            queue: TenantQueue::new(queue_capacity),
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        if self.active.is_some() {
            PlaybackPhase::Playing
        } else {
            PlaybackPhase::Idle
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Track of the running stream
    pub fn current(&self) -> Option<&Arc<Track>> {
        self.active.as_ref().map(|active| &active.track)
    }

    /// Handle of the running stream
    pub fn handle(&self) -> Option<StreamHandle> {
        self.active.as_ref().map(|active| active.handle)
    }

    pub fn queue(&self) -> &TenantQueue {
        &self.queue
    }

    pub(crate) fn queue_mut(&mut self) -> &mut TenantQueue {
        &mut self.queue
    }

    pub(crate) fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Register a freshly started stream
    pub(crate) fn begin(&mut self, track: Arc<Track>, handle: StreamHandle) {
        self.active = Some(ActiveStream { track, handle });
        self.paused = false;
    }

    /// Forget the running stream, returning its track
    pub(crate) fn finish(&mut self) -> Option<Arc<Track>> {
        self.paused = false;
        self.active.take().map(|active| active.track)
    }

    /// Back to idle with an empty queue; loop mode is kept
    pub(crate) fn reset(&mut self) {
        self.finish();
        self.queue.clear();
    }

    /// Nothing worth keeping: idle, empty queue, default loop mode
    pub fn is_retirable(&self) -> bool {
        self.active.is_none() && self.queue.is_empty() && !self.queue.loop_enabled()
    }
}

/// Process-wide map of tenant id -> tenant worker
#[derive(Debug)]
pub struct PlaybackRegistry {
    tenants: Mutex<HashMap<TenantId, mpsc::UnboundedSender<TenantMessage>>>,
    /// Worker tasks that may still be running
    tasks: Mutex<Vec<JoinHandle<()>>>,
    max_tenants: usize,
}

impl PlaybackRegistry {
    pub fn new(max_tenants: usize) -> Self {
        Self {
            tenants: Mutex::new(HashMap::new()),
            tasks: Mutex::new(Vec::new()),
            max_tenants,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TenantId, mpsc::UnboundedSender<TenantMessage>>> {
        // Map operations cannot leave it half-updated, so a poisoned lock is still usable
        self.tenants.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a message to the tenant's worker, spawning it first if needed
    ///
    /// The send happens under the map lock, which is what lets an idle worker
    /// retire without losing a message (see [`Self::retire`]).
    pub(crate) fn dispatch<F>(&self, tenant: TenantId, message: TenantMessage, spawn: F) -> Result<()>
    where
        F: FnOnce() -> mpsc::UnboundedSender<TenantMessage>,
    {
        let mut tenants = self.lock();
        let live = tenants.len();

        let sender = match tenants.entry(tenant) {
            Entry::Occupied(entry) if !entry.get().is_closed() => entry.into_mut(),
            Entry::Occupied(mut entry) => {
                warn!(%tenant, "Tenant worker exited unexpectedly, starting a fresh one");
                entry.insert(spawn());
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                if live >= self.max_tenants {
                    return Err(PlaybackError::TenantLimitReached(self.max_tenants));
                }
                debug!(%tenant, "Creating tenant worker");
                entry.insert(spawn())
            }
        };

        sender
            .send(message)
            .map_err(|_| PlaybackError::WorkerUnavailable(tenant))
    }

    /// Send a message only if the tenant already has a worker
    pub(crate) fn deliver(&self, tenant: TenantId, message: TenantMessage) -> bool {
        self.lock()
            .get(&tenant)
            .is_some_and(|sender| sender.send(message).is_ok())
    }

    /// Unregister a worker that wants to exit
    ///
    /// Returns a message that raced in before the lock was taken; the worker
    /// must handle it and keep running. `None` means the entry is gone and no
    /// further message can reach this worker.
    pub(crate) fn retire(
        &self,
        tenant: TenantId,
        inbox: &mut mpsc::UnboundedReceiver<TenantMessage>,
    ) -> Option<TenantMessage> {
        let mut tenants = self.lock();
        if let Ok(message) = inbox.try_recv() {
            return Some(message);
        }
        tenants.remove(&tenant);
        None
    }

    /// Remember a worker task so shutdown can wait for it
    pub(crate) fn track(&self, task: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(task);
    }

    /// Drop every worker sender and hand back the worker tasks
    ///
    /// Workers drain their inbox and exit once their sender is gone.
    pub(crate) fn clear(&self) -> Vec<JoinHandle<()>> {
        self.lock().clear();
        std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of tenants with a live worker
    pub fn tenant_count(&self) -> usize {
        self.lock().len()
    }

    pub fn contains(&self, tenant: TenantId) -> bool {
        self.lock().contains_key(&tenant)
    }
}
