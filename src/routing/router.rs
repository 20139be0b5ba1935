//! Route registry and dispatch.
//!
//! # Responsibilities
//! - Store registered routes
//! - Reject duplicate (method, prefix) registrations
//! - Look up the handler for a request, or report an explicit no-match
//!
//! # Design Decisions
//! - Built once at startup, then shared immutably (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - Longest prefix wins; equal specificity keeps the earliest registration
//! - `/` is answered by the built-in health check before the registry is consulted

use thiserror::Error;

use crate::handlers::{Handler, HealthCheck};
use crate::http::request::Request;
use crate::http::vocabulary::Method;
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Path served by the built-in health check.
pub const HEALTH_CHECK_PATH: &str = "/";

static HEALTH_CHECK: HealthCheck = HealthCheck;

/// Errors from registering or dispatching routes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route {method} {prefix} is already registered")]
    Duplicate { method: Method, prefix: String },

    #[error("no route for {method} {path}")]
    NotFound { method: Method, path: String },
}

/// A registered route.
#[derive(Debug)]
pub struct RouteEntry {
    method: Method,
    matcher: PathPrefixMatcher,
    handler: Box<dyn Handler>,
}

impl RouteEntry {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }
}

/// The route registry.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<RouteEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `method` requests whose path starts with `prefix`.
    pub fn register(
        &mut self,
        method: Method,
        prefix: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Result<(), RouteError> {
        let prefix = prefix.into();
        if self
            .routes
            .iter()
            .any(|route| route.method == method && route.prefix() == prefix)
        {
            return Err(RouteError::Duplicate { method, prefix });
        }

        tracing::debug!(method = %method, prefix = %prefix, "Route registered");
        self.routes.push(RouteEntry {
            method,
            matcher: PathPrefixMatcher::new(prefix),
            handler: Box::new(handler),
        });
        Ok(())
    }

    /// Find the handler for a request.
    pub fn dispatch(&self, request: &Request) -> Result<&dyn Handler, RouteError> {
        if request.path() == HEALTH_CHECK_PATH {
            return Ok(&HEALTH_CHECK);
        }

        let mut best: Option<&RouteEntry> = None;
        for route in self
            .routes
            .iter()
            .filter(|route| route.method == request.method() && route.matcher.matches(request))
        {
            // strict comparison keeps the earlier registration on ties
            if best.map_or(true, |b| route.matcher.specificity() > b.matcher.specificity()) {
                best = Some(route);
            }
        }

        match best {
            Some(route) => {
                tracing::trace!(prefix = %route.prefix(), path = %request.path(), "Route matched");
                Ok(route.handler.as_ref())
            }
            None => Err(RouteError::NotFound {
                method: request.method(),
                path: request.path().to_string(),
            }),
        }
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
