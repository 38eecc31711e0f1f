//! End-to-end session scenarios against a scripted backend: readiness,
//! progress cadence, pause isolation, stop, and broadcaster lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use audiobridge::{
    BridgeConfig, ChannelSink, CommandStatus, OutboundEvent, Player, PlayerFactory, PlayerSignal,
    SessionManager,
};

struct ScriptedPlayer {
    id: String,
    signals: mpsc::UnboundedSender<PlayerSignal>,
    ready: AtomicBool,
    playing: AtomicBool,
    released: AtomicBool,
    position_ms: AtomicU64,
    duration_ms: AtomicU64,
}

impl Player for ScriptedPlayer {
    fn open(&self, _url: &str) {
        // Preparation succeeds immediately; the Ready signal still travels
        // through the manager's signal loop like a real backend's would.
        self.ready.store(true, Ordering::Relaxed);
        self.duration_ms.store(90_000, Ordering::Relaxed);
        let _ = self.signals.send(PlayerSignal::Ready { id: self.id.clone() });
    }

    fn start(&self) {
        if self.ready.load(Ordering::Relaxed) && !self.released.load(Ordering::Relaxed) {
            self.playing.store(true, Ordering::Relaxed);
        }
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::Relaxed);
    }

    fn seek(&self, position_ms: u64) {
        self.position_ms.store(position_ms, Ordering::Relaxed);
    }

    fn set_volume(&self, _volume: f32) {}

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

#[derive(Default)]
struct ScriptedFactory;

impl PlayerFactory for ScriptedFactory {
    fn create(&self, id: &str, signals: mpsc::UnboundedSender<PlayerSignal>) -> Arc<dyn Player> {
        Arc::new(ScriptedPlayer {
            id: id.to_string(),
            signals,
            ready: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            released: AtomicBool::new(false),
            position_ms: AtomicU64::new(0),
            duration_ms: AtomicU64::new(0),
        })
    }
}

fn setup() -> (Arc<SessionManager>, mpsc::Receiver<OutboundEvent>) {
    let (sink, rx) = ChannelSink::new(256);
    let manager = SessionManager::new(
        &BridgeConfig::default(),
        Arc::new(ScriptedFactory),
        Arc::new(sink),
    );
    (manager, rx)
}

fn drain(rx: &mut mpsc::Receiver<OutboundEvent>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test(start_paused = true)]
async fn progress_events_flow_within_one_period() {
    let (manager, mut rx) = setup();

    assert_eq!(manager.play("a", "http://x/track.mp3").await, CommandStatus::Ok);
    // One broadcaster period after readiness, duration and position for
    // "a" must have been reported.
    tokio::time::sleep(Duration::from_millis(250)).await;

    let events = drain(&mut rx);
    assert!(events.contains(&OutboundEvent::Duration { player_id: "a".into(), millis: 90_000 }));
    assert!(
        events
            .iter()
            .any(|e| matches!(e, OutboundEvent::CurrentPosition { player_id, .. } if player_id == "a"))
    );
}

#[tokio::test(start_paused = true)]
async fn pause_silences_one_session_without_touching_others() {
    let (manager, mut rx) = setup();
    manager.play("a", "one.mp3").await;
    manager.play("b", "two.mp3").await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    drain(&mut rx);

    assert_eq!(manager.pause("a").await, CommandStatus::Ok);
    tokio::time::sleep(Duration::from_millis(600)).await;

    let events = drain(&mut rx);
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.player_id() == "b"));
}

#[tokio::test(start_paused = true)]
async fn stop_emits_one_completion_and_leaves_other_sessions_polling() {
    let (manager, mut rx) = setup();
    manager.play("a", "one.mp3").await;
    manager.play("b", "two.mp3").await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    drain(&mut rx);

    assert_eq!(manager.stop("a").await, CommandStatus::Ok);
    tokio::time::sleep(Duration::from_millis(600)).await;

    let events = drain(&mut rx);
    let completions: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, OutboundEvent::Complete { .. }))
        .collect();
    assert_eq!(completions.len(), 1);
    assert_eq!(completions[0].player_id(), "a");
    assert_eq!(
        completions[0].arguments(),
        serde_json::json!({"playerId": "a", "value": true})
    );

    // "a" is gone, "b" keeps getting polled.
    assert!(manager.registry().get("a").is_none());
    assert!(events.iter().any(|e| e.player_id() == "b"));
    assert!(manager.is_polling());
}

#[tokio::test(start_paused = true)]
async fn broadcaster_self_stops_when_registry_empties() {
    let (manager, mut rx) = setup();
    manager.play("a", "one.mp3").await;
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(manager.is_polling());

    manager.stop("a").await;
    // Within one tick of the last removal the task must have let go.
    tokio::time::sleep(Duration::from_millis(450)).await;
    assert!(!manager.is_polling());

    drain(&mut rx);
    tokio::time::sleep(Duration::from_secs(2)).await;
    // Idle broadcaster emits nothing at all.
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test(start_paused = true)]
async fn idle_bridge_emits_nothing() {
    let (manager, mut rx) = setup();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut rx).is_empty());
    assert!(!manager.is_polling());
}
