//! In-process simulated peer.
//!
//! Stands in for a real equipment link. In `echo` mode every primary that
//! expects a reply is answered with `S{s}F{f+1}` carrying the same token and
//! items after a configurable delay. `silent` never answers, which is handy
//! for exercising timeouts.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::item::Capabilities;
use secsgate_core::message::{CorrelationToken, Message};

use crate::config::schema::{ConnectionConfig, ReplyMode};
use crate::transport::connection::{Connection, ConnectionEvent, TokenSequence};

const SENT_LOG_CAP: usize = 64;

pub struct LoopbackConnection {
    name: String,
    caps: Capabilities,
    reply: ReplyMode,
    reply_delay: Duration,
    tokens: TokenSequence,
    events_tx: mpsc::UnboundedSender<ConnectionEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<ConnectionEvent>>>,
    closed: AtomicBool,
    sent_log: Mutex<VecDeque<Message>>,
}

impl LoopbackConnection {
    /// Create an open connection; a `Connected` event is queued immediately.
    pub fn new(
        name: impl Into<String>,
        caps: Capabilities,
        reply: ReplyMode,
        reply_delay: Duration,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let _ = events_tx.send(ConnectionEvent::Connected);
        Self {
            name: name.into(),
            caps,
            reply,
            reply_delay,
            tokens: TokenSequence::new(),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
            closed: AtomicBool::new(false),
            sent_log: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(cfg: &ConnectionConfig) -> Self {
        Self::new(
            cfg.name.clone(),
            cfg.capabilities,
            cfg.reply,
            Duration::from_millis(cfg.reply_delay_ms),
        )
    }

    /// Refuse further sends and report `Disconnected`.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            let _ = self.events_tx.send(ConnectionEvent::Disconnected);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Deliver a message as if the peer had sent it.
    pub fn inject(&self, msg: Message) {
        let _ = self.events_tx.send(ConnectionEvent::Received(msg));
    }

    /// Most recent outbound messages, oldest first.
    pub fn recent_sent(&self) -> Vec<Message> {
        self.sent_log
            .lock()
            .map(|log| log.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn record(&self, msg: &Message) {
        if let Ok(mut log) = self.sent_log.lock() {
            if log.len() == SENT_LOG_CAP {
                log.pop_front();
            }
            log.push_back(msg.clone());
        }
    }
}

/// Secondary for `msg`: same header and token, function + 1, no W-bit.
fn echo_reply(msg: &Message) -> Message {
    Message {
        device: msg.device,
        stream: msg.stream,
        function: msg.function.wrapping_add(1),
        reply_expected: false,
        items: msg.items.clone(),
        token: msg.token,
    }
}

#[async_trait]
impl Connection for LoopbackConnection {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn next_token(&self) -> CorrelationToken {
        self.tokens.next()
    }

    async fn send(&self, msg: &Message) -> Result<()> {
        if self.is_closed() {
            return Err(SecsGateError::Transport("connection closed".into()));
        }
        self.record(msg);
        debug!(conn = %self.name, token = %msg.token, msg = %msg.label(), "loopback send");

        if msg.reply_expected && self.reply == ReplyMode::Echo {
            let reply = echo_reply(msg);
            let tx = self.events_tx.clone();
            let delay = self.reply_delay;
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let _ = tx.send(ConnectionEvent::Received(reply));
            });
        }
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::UnboundedReceiver<ConnectionEvent>> {
        self.events_rx.lock().ok().and_then(|mut g| g.take())
    }
}
