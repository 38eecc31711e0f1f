//! The progress broadcaster: one periodic task that, while any session is
//! live, polls every handle and emits duration/position events. It stops
//! itself on the first tick that finds the registry empty, and the manager
//! can cancel it outright on teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::player::Player;
use crate::protocol::OutboundEvent;
use crate::sink::EventSink;

use super::registry::SessionRegistry;

/// Owner-side handle to the running broadcast task. Stored in the
/// registry's broadcaster slot; dropping it does not stop the task, the
/// cancel flag does.
pub(crate) struct BroadcasterHandle {
    cancel: Arc<AtomicBool>,
}

impl BroadcasterHandle {
    pub(crate) fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Start the broadcast task unless one is already running. Idempotent:
/// the registry's slot decides, under the registry lock.
pub(crate) fn ensure_running(
    registry: &Arc<SessionRegistry>,
    sink: &Arc<dyn EventSink>,
    interval_ms: u64,
) {
    let cancel = Arc::new(AtomicBool::new(false));
    if !registry.claim_broadcaster(BroadcasterHandle { cancel: cancel.clone() }) {
        return;
    }
    log::debug!("Progress broadcaster starting ({} ms period)", interval_ms);
    tokio::spawn(run(registry.clone(), sink.clone(), interval_ms, cancel));
}

async fn run(
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn EventSink>,
    interval_ms: u64,
    cancel: Arc<AtomicBool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if cancel.load(Ordering::Relaxed) {
            log::debug!("Progress broadcaster cancelled");
            return;
        }
        // Empty registry at tick start: vacate the slot and stop.
        if registry.release_broadcaster_if_idle() {
            log::debug!("No sessions left, progress broadcaster stopping");
            return;
        }
        for (id, player) in registry.snapshot() {
            if !player.is_playing() {
                continue;
            }
            sink.emit(OutboundEvent::Duration {
                player_id: id.clone(),
                millis: player.duration_ms(),
            })
            .await;
            sink.emit(OutboundEvent::CurrentPosition {
                player_id: id,
                millis: player.position_ms(),
            })
            .await;
        }
    }
}
