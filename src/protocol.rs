use serde::Deserialize;
use serde_json::{Value, json};

/// Inbound control command, decoded from `{method, playerId, ...}`.
///
/// Everything beyond `method` is optional because each method needs a
/// different subset; the dispatcher validates per method.
#[derive(Deserialize, Debug, Clone)]
pub struct InboundCommand {
    pub method: String,
    #[serde(rename = "playerId")]
    pub player_id: Option<String>,
    pub url: Option<String>,
    pub position: Option<u64>,
    pub volume: Option<f32>,
}

/// Why a session ended. The wire value is `true` for both variants so the
/// event contract stays unchanged, but callers holding the enum can tell
/// a drained track from a caller-issued stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    Completed,
    StoppedByCaller,
}

/// Outbound notification to the caller: a method name plus a
/// `{playerId, value}` argument map.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    Duration { player_id: String, millis: u64 },
    CurrentPosition { player_id: String, millis: u64 },
    Complete { player_id: String, reason: EndReason },
    Error { player_id: String, message: String },
}

impl OutboundEvent {
    pub fn method(&self) -> &'static str {
        match self {
            OutboundEvent::Duration { .. } => "audio.onDuration",
            OutboundEvent::CurrentPosition { .. } => "audio.onCurrentPosition",
            OutboundEvent::Complete { .. } => "audio.onComplete",
            OutboundEvent::Error { .. } => "audio.onError",
        }
    }

    pub fn player_id(&self) -> &str {
        match self {
            OutboundEvent::Duration { player_id, .. }
            | OutboundEvent::CurrentPosition { player_id, .. }
            | OutboundEvent::Complete { player_id, .. }
            | OutboundEvent::Error { player_id, .. } => player_id,
        }
    }

    pub fn arguments(&self) -> Value {
        let value = match self {
            OutboundEvent::Duration { millis, .. } => json!(millis),
            OutboundEvent::CurrentPosition { millis, .. } => json!(millis),
            // Both end reasons report `true`; see `EndReason`.
            OutboundEvent::Complete { .. } => json!(true),
            OutboundEvent::Error { message, .. } => json!(message),
        };
        json!({ "playerId": self.player_id(), "value": value })
    }
}
