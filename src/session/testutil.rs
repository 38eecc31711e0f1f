//! Scriptable fakes for exercising the session core without a real
//! playback backend.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::player::{Player, PlayerFactory, PlayerSignal};
use crate::protocol::OutboundEvent;

pub struct FakePlayer {
    id: String,
    signals: mpsc::UnboundedSender<PlayerSignal>,
    auto_ready: bool,
    ready: AtomicBool,
    playing: AtomicBool,
    released: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
    opened: Mutex<Vec<String>>,
    seeks: Mutex<Vec<u64>>,
    volumes: Mutex<Vec<f32>>,
}

impl FakePlayer {
    pub fn new(id: &str, signals: mpsc::UnboundedSender<PlayerSignal>, auto_ready: bool) -> Self {
        Self {
            id: id.to_string(),
            signals,
            auto_ready,
            ready: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
            opened: Mutex::new(Vec::new()),
            seeks: Mutex::new(Vec::new()),
            volumes: Mutex::new(Vec::new()),
        }
    }

    /// Script readiness by hand when the fake was built without auto-ready.
    pub fn make_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
        let _ = self.signals.send(PlayerSignal::Ready { id: self.id.clone() });
    }

    pub fn complete(&self) {
        self.playing.store(false, Ordering::Relaxed);
        let _ = self.signals.send(PlayerSignal::Completed { id: self.id.clone() });
    }

    pub fn fail(&self, message: &str) {
        let _ = self.signals.send(PlayerSignal::Failed {
            id: self.id.clone(),
            message: message.to_string(),
        });
    }

    pub fn set_duration(&self, millis: u64) {
        self.duration_ms.store(millis, Ordering::Relaxed);
    }

    pub fn set_position(&self, millis: u64) {
        self.position_ms.store(millis, Ordering::Relaxed);
    }

    pub fn opened_urls(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<u64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn volumes(&self) -> Vec<f32> {
        self.volumes.lock().unwrap().clone()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

impl Player for FakePlayer {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
        if self.auto_ready {
            self.make_ready();
        }
    }

    fn start(&self) {
        if self.ready.load(Ordering::Relaxed) && !self.released.load(Ordering::Relaxed) {
            self.playing.store(true, Ordering::Relaxed);
        }
    }

    fn pause(&self) {
        if self.ready.load(Ordering::Relaxed) {
            self.playing.store(false, Ordering::Relaxed);
        }
    }

    fn seek(&self, position_ms: u64) {
        if self.ready.load(Ordering::Relaxed) {
            self.seeks.lock().unwrap().push(position_ms);
            self.position_ms.store(position_ms, Ordering::Relaxed);
        }
    }

    fn set_volume(&self, volume: f32) {
        self.volumes.lock().unwrap().push(volume);
    }

    fn position_ms(&self) -> u64 {
        self.position_ms.load(Ordering::Relaxed)
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms.load(Ordering::Relaxed)
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed) && !self.released.load(Ordering::Relaxed)
    }

    fn release(&self) {
        self.released.store(true, Ordering::Relaxed);
        self.playing.store(false, Ordering::Relaxed);
    }
}

pub struct FakeFactory {
    auto_ready: bool,
    created: Mutex<Vec<Arc<FakePlayer>>>,
}

impl FakeFactory {
    pub fn new(auto_ready: bool) -> Self {
        Self { auto_ready, created: Mutex::new(Vec::new()) }
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn player(&self, id: &str) -> Arc<FakePlayer> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .unwrap_or_else(|| panic!("no fake player created for {}", id))
    }
}

impl PlayerFactory for FakeFactory {
    fn create(&self, id: &str, signals: mpsc::UnboundedSender<PlayerSignal>) -> Arc<dyn Player> {
        let player = Arc::new(FakePlayer::new(id, signals, self.auto_ready));
        self.created.lock().unwrap().push(player.clone());
        player
    }
}

/// Pull everything currently buffered out of an event receiver.
pub fn drain(rx: &mut mpsc::Receiver<OutboundEvent>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
