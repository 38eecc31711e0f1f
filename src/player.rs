//! The capability seam between the session core and a native playback
//! backend. The core never touches a decoder or an output device directly;
//! it drives a `Player` and listens for `PlayerSignal`s.

use std::sync::Arc;
use tokio::sync::mpsc;

/// Asynchronous notifications from a backend to the session manager.
///
/// Preparation and end-of-media happen on backend threads; these signals
/// re-enter the session core through one channel so all registry mutations
/// stay on the manager's side of the seam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerSignal {
    /// Source preparation finished; the handle accepts control calls now.
    Ready { id: String },
    /// Playback reached end-of-media.
    Completed { id: String },
    /// Preparation or playback failed. Surfaced as an error event so the
    /// caller never sees a session that silently stalls.
    Failed { id: String, message: String },
}

/// A uniform asynchronous open/control interface over one native playback
/// engine instance.
///
/// Control calls issued before `Ready` are dropped, not queued: `start` and
/// `pause` on an unready handle must be silent no-ops (the manager reports
/// them as `Ignored`). `set_volume` is the exception, it is recorded at any
/// time and applied when the backend comes up.
pub trait Player: Send + Sync {
    /// Begin asynchronous source preparation. Never blocks the caller;
    /// fires `Ready` or `Failed` through the signal channel when done.
    fn open(&self, url: &str);

    fn start(&self);
    fn pause(&self);

    /// Instruct the backend to seek. Dropped if unready. The position
    /// event the caller sees is emitted by the manager, synchronously with
    /// the request, regardless of when the backend actually gets there.
    fn seek(&self, position_ms: u64);

    /// Volume in `[0.0, 1.0]`, applied to both stereo channels. Values are
    /// passed through unchanged, not clamped.
    fn set_volume(&self, volume: f32);

    /// Current position in milliseconds; 0 when the backend does not know.
    fn position_ms(&self) -> u64;

    /// Total duration in milliseconds; 0 when the backend does not know.
    fn duration_ms(&self) -> u64;

    fn is_ready(&self) -> bool;
    fn is_playing(&self) -> bool;

    /// Stop and free backend resources. Idempotent; safe before `open`.
    fn release(&self);
}

/// Constructs one `Player` per session.
///
/// `create` runs under the registry lock so it must be cheap: wire up
/// channels and shared state only, no native calls (those belong in `open`).
pub trait PlayerFactory: Send + Sync {
    fn create(&self, id: &str, signals: mpsc::UnboundedSender<PlayerSignal>) -> Arc<dyn Player>;
}
