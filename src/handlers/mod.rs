//! Route handlers.
//!
//! # Data Flow
//! ```text
//! Parsed Request
//!     → routing::Router::dispatch (selects a Handler)
//!     → Handler::handle
//!     → Response (serialised by http::response::build)
//! ```
//!
//! # Design Decisions
//! - One concrete type per route, all behind the `Handler` trait
//! - Handlers never fail: every outcome is expressed as a Response
//! - Handlers may block (filesystem); the connection task runs them off the reactor

pub mod echo;
pub mod files;
pub mod health;
pub mod user_agent;

use std::path::PathBuf;

pub use echo::Echo;
pub use files::{FileCreate, FileRead};
pub use health::HealthCheck;
pub use user_agent::UserAgent;

use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::vocabulary::Method;
use crate::routing::{RouteError, Router};

/// Turns a request into a response.
pub trait Handler: Send + Sync + std::fmt::Debug {
    fn handle(&self, request: &Request) -> Response;
}

/// Register the standard routes.
///
/// The `/files/` routes are only registered when a base directory is given.
pub fn register_defaults(router: &mut Router, files_dir: Option<PathBuf>) -> Result<(), RouteError> {
    router.register(Method::Get, echo::PREFIX, Echo)?;
    router.register(Method::Get, user_agent::PATH, UserAgent)?;

    if let Some(dir) = files_dir {
        router.register(Method::Get, files::PREFIX, FileRead::new(dir.clone()))?;
        router.register(Method::Post, files::PREFIX, FileCreate::new(dir))?;
    }
    Ok(())
}
