//! audiobridge - cross-platform audio playback control bridge.
//!
//! Exposes play/pause/stop/seek/volume over named sessions, each backed by
//! its own native playback handle, with periodic progress events flowing
//! back to the caller. The reusable core is the session layer; the
//! dispatcher and the rodio backend sit at its boundaries.

pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod player;
pub mod protocol;
pub mod session;
pub mod sink;

pub use backend::RodioPlayerFactory;
pub use config::BridgeConfig;
pub use dispatcher::{CommandDispatcher, DispatchOutcome};
pub use player::{Player, PlayerFactory, PlayerSignal};
pub use protocol::{EndReason, InboundCommand, OutboundEvent};
pub use session::{CommandStatus, SessionManager, SessionRegistry};
pub use sink::{ChannelSink, EventSink};
