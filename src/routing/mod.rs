//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Parsed Request (method, path)
//!     → router.rs (health check short-circuit, route lookup)
//!     → matcher.rs (evaluate prefix conditions)
//!     → Return: matched Handler or RouteError::NotFound
//!
//! Route Registration (at startup):
//!     register(method, prefix, handler)
//!     → reject duplicate (method, prefix)
//!     → Freeze inside Arc<Router>
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod router;

pub use router::{RouteEntry, RouteError, Router, HEALTH_CHECK_PATH};
