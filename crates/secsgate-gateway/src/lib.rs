//! secsgate gateway library entry.
//!
//! This crate wires config, connections, the correlation layer, the send
//! orchestrator, and the HTTP API into a runnable gateway. It is consumed by
//! the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod router;
pub mod store;
pub mod transport;
