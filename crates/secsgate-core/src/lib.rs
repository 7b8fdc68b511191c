//! secsgate core: template, placeholder, and item-building primitives.
//!
//! This crate turns JSON message templates (stream/function header plus a tree
//! of typed item descriptors) into concrete messages. It carries no transport
//! or runtime dependencies so the same pipeline can back the HTTP gateway, a
//! CLI, or tests.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Item building is total: malformed values degrade to a textual encoding
//! instead of failing.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod item;
pub mod message;
pub mod template;

/// Shared result type.
pub use error::{Result, SecsGateError};
