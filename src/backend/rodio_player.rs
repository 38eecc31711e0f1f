//! rodio-backed Player Handle.
//!
//! Each session gets a dedicated OS thread owning the output stream and
//! sink (neither is `Send`), fed through a command channel. Control-side
//! reads (position, duration, readiness) go through shared atomics the
//! engine thread refreshes on every pass. Real-time audio stays off the
//! tokio workers; only the source fetch runs as an async task.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use rodio::{Decoder, OutputStream, Sink, Source};
use tokio::sync::mpsc;
use url::Url;

use crate::player::{Player, PlayerSignal};

enum EngineCommand {
    Start,
    Pause,
    Seek(u64),
    SetVolume(f32),
    Release,
}

/// State shared between the control side and the engine thread.
struct PlayerShared {
    ready: AtomicBool,
    playing: AtomicBool,
    released: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
    /// f32 bits; recorded before the engine exists so a pre-ready volume
    /// call is applied when the sink comes up.
    volume_bits: AtomicU32,
}

impl PlayerShared {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            volume_bits: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    fn volume(&self) -> f32 {
        f32::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    fn set_volume(&self, volume: f32) {
        self.volume_bits.store(volume.to_bits(), Ordering::Relaxed);
    }
}

pub struct RodioPlayer {
    id: String,
    shared: Arc<PlayerShared>,
    cmd_tx: Sender<EngineCommand>,
    // Taken by the first open(); the engine thread consumes it.
    cmd_rx: std::sync::Mutex<Option<Receiver<EngineCommand>>>,
    signals: mpsc::UnboundedSender<PlayerSignal>,
}

impl RodioPlayer {
    pub fn new(id: &str, signals: mpsc::UnboundedSender<PlayerSignal>) -> Self {
        let (cmd_tx, cmd_rx) = unbounded();
        Self {
            id: id.to_string(),
            shared: Arc::new(PlayerShared::new()),
            cmd_tx,
            cmd_rx: std::sync::Mutex::new(Some(cmd_rx)),
            signals,
        }
    }

    fn send(&self, cmd: EngineCommand) {
        let _ = self.cmd_tx.send(cmd);
    }
}

impl Player for RodioPlayer {
    fn open(&self, url: &str) {
        let Some(cmd_rx) = self.cmd_rx.lock().unwrap_or_else(|e| e.into_inner()).take() else {
            log::warn!("Session {}: open called twice, ignored", self.id);
            return;
        };

        let id = self.id.clone();
        let url = url.to_string();
        let shared = self.shared.clone();
        let signals = self.signals.clone();

        tokio::spawn(async move {
            let data = match fetch_source(&url).await {
                Ok(data) => data,
                Err(e) => {
                    let _ = signals.send(PlayerSignal::Failed {
                        id,
                        message: format!("{:#}", e),
                    });
                    return;
                }
            };
            if shared.released.load(Ordering::Relaxed) {
                return;
            }
            let thread_id = id.clone();
            let thread_signals = signals.clone();
            if let Err(e) = std::thread::Builder::new()
                .name(format!("player-{}", id))
                .spawn(move || run_engine(thread_id, data, shared, cmd_rx, thread_signals))
            {
                log::error!("Session {}: failed to spawn engine thread: {}", id, e);
                let _ = signals.send(PlayerSignal::Failed {
                    id,
                    message: format!("engine thread spawn failed: {}", e),
                });
            }
        });
    }

    fn start(&self) {
        if self.shared.ready.load(Ordering::Relaxed) {
            self.send(EngineCommand::Start);
        }
    }

    fn pause(&self) {
        if self.shared.ready.load(Ordering::Relaxed) {
            self.send(EngineCommand::Pause);
        }
    }

    fn seek(&self, position_ms: u64) {
        if self.shared.ready.load(Ordering::Relaxed) {
            self.send(EngineCommand::Seek(position_ms));
        }
    }

    fn set_volume(&self, volume: f32) {
        self.shared.set_volume(volume);
        if self.shared.ready.load(Ordering::Relaxed) {
            self.send(EngineCommand::SetVolume(volume));
        }
    }

    fn position_ms(&self) -> u64 {
        self.shared.position_ms.load(Ordering::Relaxed)
    }

    fn duration_ms(&self) -> u64 {
        self.shared.duration_ms.load(Ordering::Relaxed)
    }

    fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Relaxed)
    }

    fn is_playing(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
            && !self.shared.released.load(Ordering::Relaxed)
    }

    fn release(&self) {
        if !self.shared.released.swap(true, Ordering::Relaxed) {
            self.shared.playing.store(false, Ordering::Relaxed);
            self.send(EngineCommand::Release);
        }
    }
}

/// Resolve a source to raw bytes: http(s) via reqwest, file URLs and bare
/// paths from disk.
async fn fetch_source(url: &str) -> Result<Bytes> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
            let response = reqwest::get(parsed)
                .await
                .with_context(|| format!("Failed to fetch {}", url))?
                .error_for_status()
                .with_context(|| format!("Bad response for {}", url))?;
            Ok(response.bytes().await.context("Failed to read response body")?)
        }
        Ok(parsed) if parsed.scheme() == "file" => {
            let path = parsed
                .to_file_path()
                .map_err(|_| anyhow!("Invalid file URL: {}", url))?;
            let data = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Bytes::from(data))
        }
        // Anything else is treated as a local path.
        _ => {
            let data = tokio::fs::read(url)
                .await
                .with_context(|| format!("Failed to read {}", url))?;
            Ok(Bytes::from(data))
        }
    }
}

fn run_engine(
    id: String,
    data: Bytes,
    shared: Arc<PlayerShared>,
    cmd_rx: Receiver<EngineCommand>,
    signals: mpsc::UnboundedSender<PlayerSignal>,
) {
    let result = engine_loop(&id, data, &shared, &cmd_rx, &signals);
    shared.ready.store(false, Ordering::Relaxed);
    shared.playing.store(false, Ordering::Relaxed);
    if let Err(e) = result {
        let _ = signals.send(PlayerSignal::Failed { id, message: format!("{:#}", e) });
    }
}

fn engine_loop(
    id: &str,
    data: Bytes,
    shared: &PlayerShared,
    cmd_rx: &Receiver<EngineCommand>,
    signals: &mpsc::UnboundedSender<PlayerSignal>,
) -> Result<()> {
    let (_stream, stream_handle) =
        OutputStream::try_default().context("Failed to open audio output")?;
    let sink = Sink::try_new(&stream_handle).context("Failed to create audio sink")?;
    let decoder = Decoder::new(Cursor::new(data)).context("Failed to decode source")?;

    // 0 when the container does not report a duration.
    let duration_ms = decoder
        .total_duration()
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    shared.duration_ms.store(duration_ms, Ordering::Relaxed);

    sink.set_volume(shared.volume());
    // rodio starts playing on append; ready implies started.
    sink.append(decoder);
    shared.ready.store(true, Ordering::Relaxed);
    shared.playing.store(true, Ordering::Relaxed);
    let _ = signals.send(PlayerSignal::Ready { id: id.to_string() });
    log::info!("Session {}: playing ({} ms)", id, duration_ms);

    loop {
        match cmd_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(EngineCommand::Start) => sink.play(),
            Ok(EngineCommand::Pause) => sink.pause(),
            Ok(EngineCommand::Seek(position_ms)) => {
                match sink.try_seek(Duration::from_millis(position_ms)) {
                    Ok(()) => shared.position_ms.store(position_ms, Ordering::Relaxed),
                    Err(e) => log::warn!("Session {}: seek failed: {:?}", id, e),
                }
            }
            Ok(EngineCommand::SetVolume(volume)) => sink.set_volume(volume),
            Ok(EngineCommand::Release) | Err(RecvTimeoutError::Disconnected) => {
                sink.stop();
                log::info!("Session {}: engine released", id);
                return Ok(());
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        shared
            .position_ms
            .store(sink.get_pos().as_millis() as u64, Ordering::Relaxed);
        shared
            .playing
            .store(!sink.is_paused() && !sink.empty(), Ordering::Relaxed);

        if sink.empty() {
            let _ = signals.send(PlayerSignal::Completed { id: id.to_string() });
            return Ok(());
        }
    }
}
