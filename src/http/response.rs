//! Response modelling and serialisation.
//!
//! # Responsibilities
//! - Hold status, headers and body produced by a handler
//! - Serialise to HTTP/1.1 wire bytes
//!
//! # Design Decisions
//! - Content-Length is always computed from the body; handler values are dropped
//! - Empty bodies carry no Content-Length (the connection close ends them)
//! - Headers are kept in a `BTreeMap` so output order is stable

use std::collections::BTreeMap;
use std::io::Write;

use thiserror::Error;

use crate::http::vocabulary::{
    Header, StatusCode, HEADER_SEPARATOR, HTTP_VERSION, LINE_SEPARATOR, OCTET_STREAM, TEXT_PLAIN,
};

/// Errors produced while serialising a response.
///
/// Both variants indicate a handler bug rather than bad client input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("no reason phrase for status {0}")]
    UnknownStatus(u16),

    #[error("response has a {0}-byte body but no Content-Type")]
    MissingContentType(usize),
}

/// A response produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    headers: BTreeMap<Header, String>,
    body: Vec<u8>,
}

impl Response {
    /// Empty response with the given status.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// 200 with a body and its Content-Type.
    pub fn ok(body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        Self::new(StatusCode::OK).with_body(body, content_type)
    }

    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::ok(body, TEXT_PLAIN)
    }

    pub fn octet_stream(body: impl Into<Vec<u8>>) -> Self {
        Self::ok(body, OCTET_STREAM)
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    pub fn with_header(mut self, header: Header, value: impl Into<String>) -> Self {
        self.headers.insert(header, value.into());
        self
    }

    pub fn with_body(self, body: impl Into<Vec<u8>>, content_type: &str) -> Self {
        let mut response = self.with_header(Header::ContentType, content_type);
        response.body = body.into();
        response
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, header: Header) -> Option<&str> {
        self.headers.get(&header).map(String::as_str)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Serialise a response to wire bytes.
pub fn build(response: &Response) -> Result<Vec<u8>, BuildError> {
    let reason = response
        .status
        .reason()
        .ok_or(BuildError::UnknownStatus(response.status.as_u16()))?;
    if !response.body.is_empty() && !response.headers.contains_key(&Header::ContentType) {
        return Err(BuildError::MissingContentType(response.body.len()));
    }

    let mut out = Vec::with_capacity(64 + response.body.len());
    // Writes into a Vec cannot fail.
    let _ = write!(out, "{HTTP_VERSION} {} {reason}{LINE_SEPARATOR}", response.status);
    for (header, value) in &response.headers {
        if *header == Header::ContentLength {
            continue;
        }
        let _ = write!(out, "{header}{HEADER_SEPARATOR}{value}{LINE_SEPARATOR}");
    }
    if !response.body.is_empty() {
        let _ = write!(
            out,
            "{}{HEADER_SEPARATOR}{}{LINE_SEPARATOR}",
            Header::ContentLength,
            response.body.len()
        );
    }
    out.extend_from_slice(LINE_SEPARATOR.as_bytes());
    out.extend_from_slice(&response.body);
    Ok(out)
}
