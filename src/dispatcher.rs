use std::sync::Arc;

use serde_json::json;

use crate::protocol::InboundCommand;
use crate::session::SessionManager;

/// What the dispatcher tells the caller. Recognized methods acknowledge
/// acceptance immediately; the underlying operation may still be in
/// flight, the ack never means it finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Ack,
    NotImplemented(String),
    MissingField(&'static str),
}

/// Thin boundary shim translating `{method, playerId, ...}` maps into
/// session-manager calls. No session logic lives here.
pub struct CommandDispatcher {
    manager: Arc<SessionManager>,
}

impl CommandDispatcher {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self { manager }
    }

    /// Handles one inbound text frame. Returns `None` for payloads that
    /// are not command JSON at all; otherwise a JSON reply string.
    pub async fn handle_message(&self, payload: &str) -> Option<String> {
        let cmd: InboundCommand = match serde_json::from_str(payload) {
            Ok(cmd) => cmd,
            Err(_) => return None,
        };

        let reply = match self.dispatch(&cmd).await {
            DispatchOutcome::Ack => json!({ "result": true }),
            DispatchOutcome::NotImplemented(method) => {
                json!({ "error": format!("not implemented: {}", method) })
            }
            DispatchOutcome::MissingField(field) => {
                json!({ "error": format!("missing field: {}", field) })
            }
        };
        Some(reply.to_string())
    }

    pub async fn dispatch(&self, cmd: &InboundCommand) -> DispatchOutcome {
        // The method decides first: an unknown method is "not implemented"
        // no matter which arguments came along.
        let status = match (cmd.method.as_str(), cmd.player_id.as_deref()) {
            ("play" | "pause" | "stop" | "seek" | "volume", None) => {
                return DispatchOutcome::MissingField("playerId");
            }
            ("play", Some(id)) => {
                let Some(url) = cmd.url.as_deref() else {
                    return DispatchOutcome::MissingField("url");
                };
                self.manager.play(id, url).await
            }
            ("pause", Some(id)) => self.manager.pause(id).await,
            ("stop", Some(id)) => self.manager.stop(id).await,
            ("seek", Some(id)) => {
                let Some(position) = cmd.position else {
                    return DispatchOutcome::MissingField("position");
                };
                self.manager.seek(id, position).await
            }
            ("volume", Some(id)) => {
                let Some(volume) = cmd.volume else {
                    return DispatchOutcome::MissingField("volume");
                };
                self.manager.volume(id, volume).await
            }
            (other, _) => return DispatchOutcome::NotImplemented(other.to_string()),
        };

        // Absent-id and unready no-ops are still acknowledged.
        log::debug!("Dispatched {}: {:?}", cmd.method, status);
        DispatchOutcome::Ack
    }
}
