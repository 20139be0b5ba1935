//! File read/create handlers rooted at a base directory.
//!
//! # Design Decisions
//! - Only plain path components are accepted after `/files/`; `..`, `.`,
//!   absolute paths and empty names resolve to nothing (404)
//! - Failures are logged and mapped to a status; nothing here is process-fatal
//! - No locking: concurrent read/write of the same file is left to the OS

use std::path::{Component, Path, PathBuf};

use crate::handlers::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::vocabulary::StatusCode;

pub const PREFIX: &str = "/files/";

/// Map a request path onto a file inside `base`.
fn resolve(base: &Path, request_path: &str) -> Option<PathBuf> {
    let name = request_path.strip_prefix(PREFIX)?;
    if name.is_empty() {
        return None;
    }
    let relative = Path::new(name);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(base.join(relative))
}

/// Serves file contents as `application/octet-stream`.
#[derive(Debug, Clone)]
pub struct FileRead {
    base: PathBuf,
}

impl FileRead {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl Handler for FileRead {
    fn handle(&self, request: &Request) -> Response {
        let Some(path) = resolve(&self.base, request.path()) else {
            tracing::debug!(path = %request.path(), "Rejected file path");
            return Response::not_found();
        };

        match std::fs::read(&path) {
            Ok(contents) => Response::octet_stream(contents),
            Err(e) => {
                tracing::debug!(file = ?path, error = %e, "File read failed");
                Response::not_found()
            }
        }
    }
}

/// Writes the request body to a file, replacing any existing content.
#[derive(Debug, Clone)]
pub struct FileCreate {
    base: PathBuf,
}

impl FileCreate {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl Handler for FileCreate {
    fn handle(&self, request: &Request) -> Response {
        let Some(path) = resolve(&self.base, request.path()) else {
            tracing::debug!(path = %request.path(), "Rejected file path");
            return Response::not_found();
        };

        match std::fs::write(&path, request.body()) {
            Ok(()) => {
                tracing::info!(file = ?path, bytes = request.body().len(), "File written");
                Response::new(StatusCode::CREATED)
            }
            Err(e) => {
                tracing::error!(file = ?path, error = %e, "File write failed");
                Response::new(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
