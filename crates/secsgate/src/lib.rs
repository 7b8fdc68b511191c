//! Top-level facade crate for secsgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use secsgate_core::*;
}

pub mod gateway {
    pub use secsgate_gateway::*;
}
