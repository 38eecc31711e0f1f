use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::player::Player;

use super::broadcaster::BroadcasterHandle;

/// The shared mutable state of the session core: the id→handle map and the
/// single broadcaster-task slot. Both live under one lock so the broadcaster
/// cannot observe a half-removed session, and an emptiness check and a slot
/// change are always atomic with each other.
struct State {
    sessions: HashMap<String, Arc<dyn Player>>,
    broadcaster: Option<BroadcasterHandle>,
}

/// Thread-safe registry of named playback sessions.
///
/// The lock is short-held: nothing here calls into a backend or awaits.
/// Callers take a snapshot and act on it outside the lock.
pub struct SessionRegistry {
    state: Mutex<State>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State { sessions: HashMap::new(), broadcaster: None }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means another thread panicked mid-update;
        // the map itself is still coherent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomic create-or-get. `make` runs under the lock, so concurrent
    /// `ensure` calls for the same id can never construct two handles.
    pub fn ensure(
        &self,
        id: &str,
        make: impl FnOnce() -> Arc<dyn Player>,
    ) -> (Arc<dyn Player>, bool) {
        let mut state = self.locked();
        if let Some(existing) = state.sessions.get(id) {
            return (existing.clone(), false);
        }
        let player = make();
        state.sessions.insert(id.to_string(), player.clone());
        (player, true)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn Player>> {
        self.locked().sessions.get(id).cloned()
    }

    /// Remove and hand back ownership for release. Absent id is a no-op.
    pub fn remove(&self, id: &str) -> Option<Arc<dyn Player>> {
        self.locked().sessions.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.locked().sessions.is_empty()
    }

    /// Stable snapshot of all (id, handle) pairs. Visitors act on the
    /// snapshot, so removing a session mid-visit is safe.
    pub fn snapshot(&self) -> Vec<(String, Arc<dyn Player>)> {
        self.locked()
            .sessions
            .iter()
            .map(|(id, player)| (id.clone(), player.clone()))
            .collect()
    }

    /// Empty the registry, handing every handle back for release.
    pub(crate) fn drain(&self) -> Vec<(String, Arc<dyn Player>)> {
        std::mem::take(&mut self.locked().sessions).into_iter().collect()
    }

    /// Claim the broadcaster slot. Returns false when a task already holds
    /// it, making broadcaster start idempotent.
    pub(crate) fn claim_broadcaster(&self, handle: BroadcasterHandle) -> bool {
        let mut state = self.locked();
        if state.broadcaster.is_some() {
            return false;
        }
        state.broadcaster = Some(handle);
        true
    }

    /// If no sessions remain, vacate the broadcaster slot and report true;
    /// the calling task then exits. Checked atomically with emptiness so a
    /// concurrent `play` either keeps this task alive or finds the slot
    /// free and starts a new one.
    pub(crate) fn release_broadcaster_if_idle(&self) -> bool {
        let mut state = self.locked();
        if state.sessions.is_empty() {
            state.broadcaster = None;
            return true;
        }
        false
    }

    pub(crate) fn take_broadcaster(&self) -> Option<BroadcasterHandle> {
        self.locked().broadcaster.take()
    }

    pub(crate) fn broadcaster_active(&self) -> bool {
        self.locked().broadcaster.is_some()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
