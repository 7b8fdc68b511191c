use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::item::Capabilities;
use secsgate_core::message::{CorrelationToken, Message};

use crate::correlation::table::CorrelationTable;
use crate::transport::{Connection, ConnectionEvent};

/// Result of a successful send.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SendOutcome {
    /// Dispatched without waiting for a reply.
    Sent { request: Message },
    /// Dispatched and answered.
    Replied {
        request: Message,
        reply: Message,
        #[serde(rename = "latencyMs")]
        latency_ms: u64,
    },
}

/// Connection adapter: one connection, its correlation table, and the task
/// that feeds inbound replies into that table.
pub struct Link {
    conn: Arc<dyn Connection>,
    table: Arc<CorrelationTable>,
    connected: Arc<AtomicBool>,
    unmatched: Arc<AtomicU64>,
}

impl Link {
    /// Take over `conn`'s event stream. Must be called inside a Tokio runtime.
    pub fn new(conn: Arc<dyn Connection>) -> Self {
        let table = Arc::new(CorrelationTable::new());
        let connected = Arc::new(AtomicBool::new(false));
        let unmatched = Arc::new(AtomicU64::new(0));

        match conn.take_events() {
            Some(rx) => {
                tokio::spawn(pump(
                    conn.name().to_owned(),
                    rx,
                    Arc::clone(&table),
                    Arc::clone(&connected),
                    Arc::clone(&unmatched),
                ));
            }
            None => {
                warn!(conn = %conn.name(), "event stream already taken; replies will never correlate");
            }
        }

        Self {
            conn,
            table,
            connected,
            unmatched,
        }
    }

    pub fn name(&self) -> &str {
        self.conn.name()
    }

    pub fn capabilities(&self) -> Capabilities {
        self.conn.capabilities()
    }

    pub fn next_token(&self) -> CorrelationToken {
        self.conn.next_token()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    pub fn is_pending(&self, token: CorrelationToken) -> bool {
        self.table.contains(token)
    }

    pub fn pending_count(&self) -> usize {
        self.table.len()
    }

    pub fn unmatched_replies(&self) -> u64 {
        self.unmatched.load(Ordering::Relaxed)
    }

    /// Dispatch `message`; when `wait` is set, also wait up to `timeout` for
    /// the reply carrying the same token.
    ///
    /// A failed dispatch leaves no table entry behind. A timeout is reported
    /// as `SecsGateError::Timeout`, distinct from `Transport`.
    pub async fn send_and_await(
        &self,
        message: Message,
        wait: bool,
        timeout: Duration,
    ) -> Result<SendOutcome> {
        if !wait {
            self.conn.send(&message).await?;
            debug!(conn = %self.name(), token = %message.token, msg = %message.label(), "sent");
            return Ok(SendOutcome::Sent { request: message });
        }

        let token = message.token;
        let (guard, mut rx) = self.table.register(token, message.label())?;
        let started = Instant::now();
        let expiry = tokio::time::sleep(timeout);
        tokio::pin!(expiry);

        if let Err(e) = self.conn.send(&message).await {
            guard.cancel();
            warn!(conn = %self.name(), token = %token, error = %e, "dispatch failed; registration rolled back");
            return Err(e);
        }
        debug!(conn = %self.name(), token = %token, msg = %message.label(), "sent; awaiting reply");

        let timed_out = || SecsGateError::Timeout {
            token: token.0,
            timeout_ms: timeout.as_millis() as u64,
        };
        // timer first: when both are ready, removal from the table decides
        let reply = tokio::select! {
            biased;
            () = &mut expiry => {
                if guard.expire() {
                    return Err(timed_out());
                }
                // the reply claimed the entry first and is already in the channel
                rx.await.map_err(|_| timed_out())?
            }
            res = &mut rx => match res {
                Ok(reply) => {
                    guard.disarm();
                    reply
                }
                Err(_) => {
                    return Err(SecsGateError::Internal(format!(
                        "pending request {token} dropped without a reply"
                    )));
                }
            },
        };

        Ok(SendOutcome::Replied {
            request: message,
            reply,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// Sole consumer of a connection's events.
async fn pump(
    name: String,
    mut rx: mpsc::UnboundedReceiver<ConnectionEvent>,
    table: Arc<CorrelationTable>,
    connected: Arc<AtomicBool>,
    unmatched: Arc<AtomicU64>,
) {
    while let Some(ev) = rx.recv().await {
        match ev {
            ConnectionEvent::Connected => {
                connected.store(true, Ordering::Relaxed);
                info!(conn = %name, "connection up");
            }
            ConnectionEvent::Disconnected => {
                connected.store(false, Ordering::Relaxed);
                warn!(conn = %name, pending = table.len(), "connection down");
            }
            ConnectionEvent::Received(msg) if msg.is_reply() => {
                let token = msg.token;
                let label = msg.label();
                if !table.resolve(token, msg) {
                    unmatched.fetch_add(1, Ordering::Relaxed);
                    warn!(conn = %name, token = %token, msg = %label, "reply matched no pending request");
                }
            }
            ConnectionEvent::Received(msg) => {
                debug!(conn = %name, token = %msg.token, msg = %msg.label(), "unsolicited primary ignored");
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    debug!(conn = %name, "event stream closed");
}
