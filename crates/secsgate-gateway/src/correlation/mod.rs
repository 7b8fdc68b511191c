//! Request/reply correlation.
//!
//! - [`CorrelationTable`]: token -> waiting request, removal is the single
//!   serialization point between "reply arrived" and "timed out".
//! - [`Link`]: owns one connection plus its table, pumps the connection's
//!   events into the table, and implements send-and-await.

mod link;
mod table;

pub use link::{Link, SendOutcome};
pub use table::{CorrelationTable, PendingGuard};
