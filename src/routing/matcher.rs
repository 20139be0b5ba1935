//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (literal, case-sensitive)
//! - Report how specific a match is so the router can rank candidates
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-literal (no decoding)
//! - No regex to guarantee O(n) matching

use crate::http::request::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request) -> bool;

    /// Higher means more specific. Only meaningful when `matches` is true.
    fn specificity(&self) -> usize;
}

/// Matches the request path prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request) -> bool {
        req.path().starts_with(&self.prefix)
    }

    fn specificity(&self) -> usize {
        self.prefix.len()
    }
}
