//! Transport layer (connections to the peer).
//!
//! The core only needs a [`Connection`]: something that can hand out
//! correlation tokens, accept a [`Message`](secsgate_core::message::Message),
//! and report inbound traffic as [`ConnectionEvent`]s. Framing and the
//! session handshake live behind that trait.

pub mod connection;
pub mod loopback;

pub use connection::{Connection, ConnectionEvent, TokenSequence};
pub use loopback::LoopbackConnection;
