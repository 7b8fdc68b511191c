use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use secsgate_core::error::{Result, SecsGateError};
use secsgate_core::message::{CorrelationToken, Message};

/// A request waiting for its reply.
struct PendingRequest {
    sender: oneshot::Sender<Message>,
    created_at: Instant,
    /// `SxFy` label, for logs.
    label: String,
}

/// Pending requests of one connection, keyed by correlation token.
///
/// Every entry leaves the table exactly once, through `resolve`, `expire`, or
/// its guard's drop. Whichever removes it first wins; the others see `false`.
#[derive(Default)]
pub struct CorrelationTable {
    pending: DashMap<CorrelationToken, PendingRequest>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a waiter for `token`. Fails if the token is already pending.
    pub fn register(
        self: &Arc<Self>,
        token: CorrelationToken,
        label: impl Into<String>,
    ) -> Result<(PendingGuard, oneshot::Receiver<Message>)> {
        let (tx, rx) = oneshot::channel();
        match self.pending.entry(token) {
            Entry::Occupied(_) => {
                return Err(SecsGateError::Internal(format!(
                    "correlation token {token} already pending"
                )));
            }
            Entry::Vacant(v) => {
                v.insert(PendingRequest {
                    sender: tx,
                    created_at: Instant::now(),
                    label: label.into(),
                });
            }
        }
        debug!(token = %token, "registered pending request");

        let guard = PendingGuard {
            table: Arc::clone(self),
            token,
            armed: true,
        };
        Ok((guard, rx))
    }

    /// Hand `reply` to the waiter for `token`.
    ///
    /// Returns false if no live entry exists (late, duplicate, or unsolicited).
    pub fn resolve(&self, token: CorrelationToken, reply: Message) -> bool {
        let Some((_, pending)) = self.pending.remove(&token) else {
            return false;
        };
        let elapsed = pending.created_at.elapsed();
        match pending.sender.send(reply) {
            Ok(()) => {
                debug!(
                    token = %token,
                    msg = %pending.label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "resolved pending request"
                );
                true
            }
            Err(_) => {
                debug!(token = %token, msg = %pending.label, "waiter gone before reply");
                false
            }
        }
    }

    /// Remove `token` because its timer fired. False if it already resolved.
    pub fn expire(&self, token: CorrelationToken) -> bool {
        match self.pending.remove(&token) {
            Some((_, pending)) => {
                warn!(
                    token = %token,
                    msg = %pending.label,
                    elapsed_ms = pending.created_at.elapsed().as_millis() as u64,
                    "pending request timed out"
                );
                true
            }
            None => false,
        }
    }

    fn remove(&self, token: CorrelationToken) -> bool {
        self.pending.remove(&token).is_some()
    }

    pub fn contains(&self, token: CorrelationToken) -> bool {
        self.pending.contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Owns one table entry on behalf of its waiter; dropping it while still
/// armed removes the entry.
pub struct PendingGuard {
    table: Arc<CorrelationTable>,
    token: CorrelationToken,
    armed: bool,
}

impl PendingGuard {
    pub fn token(&self) -> CorrelationToken {
        self.token
    }

    /// Timer fired: try to claim the entry as timed out.
    pub fn expire(mut self) -> bool {
        self.armed = false;
        self.table.expire(self.token)
    }

    /// Roll back a registration whose dispatch failed.
    pub fn cancel(mut self) -> bool {
        self.armed = false;
        self.table.remove(self.token)
    }

    /// The entry was resolved; nothing left to clean up.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.armed && self.table.remove(self.token) {
            debug!(token = %self.token, "pending request abandoned by caller");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(token: u32) -> Message {
        Message {
            device: 1,
            stream: 1,
            function: 2,
            reply_expected: false,
            items: Vec::new(),
            token: CorrelationToken(token),
        }
    }

    #[tokio::test]
    async fn register_and_resolve() {
        let table = Arc::new(CorrelationTable::new());
        let (guard, rx) = table.register(CorrelationToken(1), "S1F1").unwrap();
        assert!(table.contains(CorrelationToken(1)));

        assert!(table.resolve(CorrelationToken(1), reply(1)));
        guard.disarm();

        let got = rx.await.unwrap();
        assert_eq!(got.token, CorrelationToken(1));
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let table = Arc::new(CorrelationTable::new());
        let _first = table.register(CorrelationToken(9), "S1F1").unwrap();
        let err = table.register(CorrelationToken(9), "S1F1").err().unwrap();
        assert_eq!(err.client_code().as_str(), "INTERNAL");
        assert_eq!(table.len(), 1);
    }

    #[tokio::test]
    async fn resolve_after_expire_is_a_noop() {
        let table = Arc::new(CorrelationTable::new());
        let (guard, _rx) = table.register(CorrelationToken(3), "S1F3").unwrap();

        assert!(guard.expire());
        assert!(!table.resolve(CorrelationToken(3), reply(3)));
        assert!(!table.contains(CorrelationToken(3)));
    }

    #[tokio::test]
    async fn expire_after_resolve_loses() {
        let table = Arc::new(CorrelationTable::new());
        let (guard, mut rx) = table.register(CorrelationToken(4), "S1F3").unwrap();

        assert!(table.resolve(CorrelationToken(4), reply(4)));
        assert!(!guard.expire());
        assert_eq!(rx.try_recv().unwrap().token, CorrelationToken(4));
    }

    #[tokio::test]
    async fn dropped_guard_removes_entry() {
        let table = Arc::new(CorrelationTable::new());
        {
            let (_guard, _rx) = table.register(CorrelationToken(5), "S2F41").unwrap();
            assert_eq!(table.len(), 1);
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn cancel_rolls_back() {
        let table = Arc::new(CorrelationTable::new());
        let (guard, _rx) = table.register(CorrelationToken(6), "S1F1").unwrap();
        assert!(guard.cancel());
        assert!(!table.contains(CorrelationToken(6)));
    }
}
