//! Closed protocol vocabulary: methods, header names, status codes.
//!
//! Anything outside these sets is rejected at parse time. `Accept-Encoding`
//! is recognised so requests carrying it parse, but nothing consults it.

use std::fmt;

/// Line separator for the start line and header lines.
pub const LINE_SEPARATOR: &str = "\r\n";

/// Terminator between the header block and the body.
pub const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Separator between a header name and its value.
pub const HEADER_SEPARATOR: &str = ": ";

/// Protocol version written on every status line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

pub const TEXT_PLAIN: &str = "text/plain";
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Supported request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    /// Look up a method token. Methods are case-sensitive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognised header names.
///
/// The declaration order is also the order headers are written in a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Header {
    Host,
    UserAgent,
    AcceptEncoding,
    ContentType,
    ContentLength,
}

impl Header {
    pub const ALL: [Header; 5] = [
        Header::Host,
        Header::UserAgent,
        Header::AcceptEncoding,
        Header::ContentType,
        Header::ContentLength,
    ];

    /// Look up a header name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|header| header.as_str().eq_ignore_ascii_case(name))
    }

    /// Canonical spelling used on the wire.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::UserAgent => "User-Agent",
            Self::AcceptEncoding => "Accept-Encoding",
            Self::ContentType => "Content-Type",
            Self::ContentLength => "Content-Length",
        }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response status code.
///
/// Any `u16` can be stored; only codes with a reason phrase can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: Self = Self(200);
    pub const CREATED: Self = Self(201);
    pub const BAD_REQUEST: Self = Self(400);
    pub const NOT_FOUND: Self = Self(404);
    pub const PAYLOAD_TOO_LARGE: Self = Self(413);
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);

    /// Reason phrase for the status line, if this code is in the table.
    pub const fn reason(&self) -> Option<&'static str> {
        match self.0 {
            200 => Some("OK"),
            201 => Some("CREATED"),
            400 => Some("BAD REQUEST"),
            404 => Some("NOT FOUND"),
            413 => Some("PAYLOAD TOO LARGE"),
            500 => Some("INTERNAL SERVER ERROR"),
            _ => None,
        }
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
