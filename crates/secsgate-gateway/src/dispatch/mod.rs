//! Send orchestration.
//!
//! Re-exports the orchestrator and its request types so HTTP handlers and
//! embedders can depend on this module directly.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, SendRequest, TemplateRef};
