//! backend - Player Handle adapters over native playback engines.
//!
//! The session core only sees the `Player` seam; this module supplies the
//! default rodio-based implementation.

mod rodio_player;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::player::{Player, PlayerFactory, PlayerSignal};

pub use rodio_player::RodioPlayer;

/// Builds one `RodioPlayer` per session.
pub struct RodioPlayerFactory;

impl PlayerFactory for RodioPlayerFactory {
    fn create(&self, id: &str, signals: mpsc::UnboundedSender<PlayerSignal>) -> Arc<dyn Player> {
        Arc::new(RodioPlayer::new(id, signals))
    }
}
