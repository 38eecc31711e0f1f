//! The session manager: owns the registry, translates control calls into
//! Player Handle operations, consumes backend signals, and keeps the
//! progress broadcaster alive exactly while sessions exist.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::BridgeConfig;
use crate::player::{Player, PlayerFactory, PlayerSignal};
use crate::protocol::{EndReason, OutboundEvent};
use crate::sink::EventSink;

use super::broadcaster;
use super::registry::SessionRegistry;

/// Outcome of a control call. Control operations never fail hard: an
/// unknown id or an unready handle is a recoverable no-op, but the caller
/// (and the tests) can see which one happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Ok,
    /// The session exists but its handle is not ready yet; the call was
    /// dropped (ready or no-op, never queued).
    Ignored,
    NotFound,
}

pub struct SessionManager {
    registry: Arc<SessionRegistry>,
    factory: Arc<dyn PlayerFactory>,
    sink: Arc<dyn EventSink>,
    signal_tx: mpsc::UnboundedSender<PlayerSignal>,
    interval_ms: u64,
}

impl SessionManager {
    pub fn new(
        config: &BridgeConfig,
        factory: Arc<dyn PlayerFactory>,
        sink: Arc<dyn EventSink>,
    ) -> Arc<Self> {
        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let registry = Arc::new(SessionRegistry::new());
        let manager = Arc::new(Self {
            registry: registry.clone(),
            factory,
            sink: sink.clone(),
            signal_tx,
            interval_ms: config.progress_interval_ms,
        });
        // The signal loop holds the registry and sink, not the manager, so
        // dropping the manager closes the channel and ends the loop.
        tokio::spawn(run_signal_loop(
            registry,
            sink,
            config.progress_interval_ms,
            signal_rx,
        ));
        manager
    }

    /// Create-or-resume. First `play` for an unseen id constructs a handle
    /// and begins async open; a repeat for a live id resumes it.
    pub async fn play(&self, id: &str, url: &str) -> CommandStatus {
        let (player, was_created) = self
            .registry
            .ensure(id, || self.factory.create(id, self.signal_tx.clone()));

        let status = if was_created {
            log::info!("Session {}: opening {}", id, url);
            player.open(url);
            CommandStatus::Ok
        } else if player.is_ready() {
            player.start();
            CommandStatus::Ok
        } else {
            log::debug!("Session {}: play before ready, dropped", id);
            CommandStatus::Ignored
        };

        // Any play call that finds the broadcaster absent restarts it.
        broadcaster::ensure_running(&self.registry, &self.sink, self.interval_ms);
        status
    }

    pub async fn pause(&self, id: &str) -> CommandStatus {
        match self.registry.get(id) {
            None => CommandStatus::NotFound,
            Some(player) if !player.is_ready() => CommandStatus::Ignored,
            Some(player) => {
                player.pause();
                CommandStatus::Ok
            }
        }
    }

    /// Release and remove, then report completion. Reuses the same removal
    /// contract as natural end-of-media, tagged `StoppedByCaller`.
    pub async fn stop(&self, id: &str) -> CommandStatus {
        match self.registry.remove(id) {
            None => CommandStatus::NotFound,
            Some(player) => {
                player.release();
                log::info!("Session {}: stopped by caller", id);
                self.sink
                    .emit(OutboundEvent::Complete {
                        player_id: id.to_string(),
                        reason: EndReason::StoppedByCaller,
                    })
                    .await;
                CommandStatus::Ok
            }
        }
    }

    /// Seek and immediately report the requested position, whether or not
    /// the backend has physically gotten there. Responsive UI feedback
    /// beats physical accuracy here; the position report goes out even
    /// when the id is unknown, the status alone says so.
    pub async fn seek(&self, id: &str, position_ms: u64) -> CommandStatus {
        let status = match self.registry.get(id) {
            None => CommandStatus::NotFound,
            Some(player) => {
                player.seek(position_ms);
                CommandStatus::Ok
            }
        };
        self.sink
            .emit(OutboundEvent::CurrentPosition {
                player_id: id.to_string(),
                millis: position_ms,
            })
            .await;
        status
    }

    /// Pass the level through unchanged; the backend applies it to both
    /// channels.
    pub async fn volume(&self, id: &str, level: f32) -> CommandStatus {
        match self.registry.get(id) {
            None => CommandStatus::NotFound,
            Some(player) => {
                player.set_volume(level);
                CommandStatus::Ok
            }
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Whether the progress broadcaster currently occupies its slot.
    pub fn is_polling(&self) -> bool {
        self.registry.broadcaster_active()
    }

    /// Explicit teardown: cancel the broadcast task and release every
    /// session. No completion events are emitted; this is the bridge going
    /// away, not playback finishing.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.registry.take_broadcaster() {
            handle.cancel();
        }
        for (id, player) in self.registry.drain() {
            player.release();
            log::info!("Session {}: released on shutdown", id);
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        // An abandoned manager must not leak the periodic task.
        if let Some(handle) = self.registry.take_broadcaster() {
            handle.cancel();
        }
    }
}

/// Consumes backend signals. Completion may race a caller `stop`; whoever
/// removes the id first wins and the loser's path is a safe no-op, so the
/// completion event fires exactly once.
async fn run_signal_loop(
    registry: Arc<SessionRegistry>,
    sink: Arc<dyn EventSink>,
    interval_ms: u64,
    mut signal_rx: mpsc::UnboundedReceiver<PlayerSignal>,
) {
    while let Some(signal) = signal_rx.recv().await {
        match signal {
            PlayerSignal::Ready { id } => {
                if let Some(player) = registry.get(&id) {
                    player.start();
                    broadcaster::ensure_running(&registry, &sink, interval_ms);
                } else {
                    log::debug!("Ready signal for departed session {}", id);
                }
            }
            PlayerSignal::Completed { id } => {
                if let Some(player) = registry.remove(&id) {
                    player.release();
                    log::info!("Session {}: playback complete", id);
                    sink.emit(OutboundEvent::Complete {
                        player_id: id,
                        reason: EndReason::Completed,
                    })
                    .await;
                }
            }
            PlayerSignal::Failed { id, message } => {
                log::warn!("Session {}: backend failure: {}", id, message);
                if let Some(player) = registry.remove(&id) {
                    player.release();
                    sink.emit(OutboundEvent::Error { player_id: id, message }).await;
                }
            }
        }
    }
}
