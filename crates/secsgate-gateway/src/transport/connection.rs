use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::mpsc;

use secsgate_core::error::Result;
use secsgate_core::item::Capabilities;
use secsgate_core::message::{CorrelationToken, Message};

/// Lifecycle and receipt notifications emitted by a connection.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    /// Any inbound message; replies are matched by token.
    Received(Message),
}

/// A live connection to one peer.
#[async_trait]
pub trait Connection: Send + Sync {
    fn name(&self) -> &str;

    /// Encoders this connection implements natively.
    fn capabilities(&self) -> Capabilities;

    /// Fresh token, unique among this connection's in-flight requests.
    fn next_token(&self) -> CorrelationToken;

    async fn send(&self, msg: &Message) -> Result<()>;

    /// Hand out the event stream. Yields `Some` once; later calls get `None`.
    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>>;
}

/// Monotonic u32 token source that wraps and never yields 0.
#[derive(Debug)]
pub struct TokenSequence {
    next: AtomicU32,
}

impl Default for TokenSequence {
    fn default() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }
}

impl TokenSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> CorrelationToken {
        loop {
            let t = self.next.fetch_add(1, Ordering::Relaxed);
            if t != 0 {
                return CorrelationToken(t);
            }
        }
    }
}
