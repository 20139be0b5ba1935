//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection limits)
//!     → connection.rs (read one request, run the pipeline, write, close)
//!
//! Connection States:
//!     Accepted → Reading → Responding → Closed
//! ```
//!
//! # Design Decisions
//! - Bounded accept prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Exactly one request per connection (no keep-alive)

pub mod connection;
pub mod listener;

pub use connection::{ConnectionError, ConnectionId, ConnectionSettings, ConnectionTracker};
pub use listener::{Listener, ListenerError};
