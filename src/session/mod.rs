//! session - concurrency-safe registry of named playback sessions.
//!
//! The registry maps caller-chosen ids to Player Handles, the manager
//! drives them and consumes backend signals, and the broadcaster polls
//! live sessions for progress on a fixed cadence.

mod broadcaster;
mod manager;
mod registry;

pub use manager::{CommandStatus, SessionManager};
pub use registry::SessionRegistry;

#[cfg(test)]
pub(crate) mod testutil;
