use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::OutboundEvent;

/// Abstract outbound notification channel to the caller.
///
/// The broadcaster and the completion path both emit through this seam, so
/// a host can forward events over whatever transport it speaks.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: OutboundEvent);
}

/// Default sink backed by a bounded tokio channel, matching how the rest
/// of the process consumes events in a `select!` loop.
pub struct ChannelSink {
    tx: mpsc::Sender<OutboundEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<OutboundEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&self, event: OutboundEvent) {
        if let Err(e) = self.tx.send(event).await {
            log::warn!("Event receiver gone, dropping event: {}", e);
        }
    }
}
