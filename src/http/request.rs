//! Request parsing.
//!
//! # Responsibilities
//! - Split the raw buffer into start line, header block and body
//! - Validate the method and every header name against the vocabulary
//! - Slice exactly Content-Length bytes of body
//! - Report how many bytes a complete request needs (for the socket reader)
//!
//! # Design Decisions
//! - Pure functions over the input buffer; no I/O
//! - Every malformed input is a typed `ParseError`, never a panic
//! - Bytes past the declared Content-Length are ignored (one request per connection)

use std::collections::HashMap;

use thiserror::Error;

use crate::http::vocabulary::{Header, Method, HEADER_SEPARATOR, HEAD_TERMINATOR, LINE_SEPARATOR};

/// Errors produced while parsing a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The start line did not split into exactly method, path and version.
    #[error("expected 'METHOD PATH VERSION', got {0:?}")]
    MalformedStartLine(String),

    /// The method token is outside the supported set.
    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),

    /// A header line had no `": "` separator.
    #[error("malformed header line {0:?}")]
    MalformedHeader(String),

    /// A header name is outside the known vocabulary.
    #[error("unknown header {0:?}")]
    UnknownHeader(String),

    /// Content-Length was not a non-negative integer.
    #[error("invalid Content-Length {0:?}")]
    InvalidContentLength(String),

    /// The start line or header block was not valid UTF-8.
    #[error("request head is not valid UTF-8")]
    InvalidUtf8,

    /// No blank line terminating the header block was found.
    #[error("request head is not terminated by a blank line")]
    IncompleteHead,

    /// Fewer body bytes were present than Content-Length declared.
    #[error("body declared {expected} bytes but only {available} were received")]
    IncompleteBody { expected: usize, available: usize },
}

/// The first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartLine {
    method: Method,
    path: String,
    version: String,
}

impl StartLine {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

/// A fully parsed request. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    start_line: StartLine,
    headers: HashMap<Header, String>,
    body: Vec<u8>,
}

impl Request {
    pub fn start_line(&self) -> &StartLine {
        &self.start_line
    }

    pub fn method(&self) -> Method {
        self.start_line.method
    }

    pub fn path(&self) -> &str {
        &self.start_line.path
    }

    /// Value of a header, if the request carried it.
    pub fn header(&self, header: Header) -> Option<&str> {
        self.headers.get(&header).map(String::as_str)
    }

    pub fn headers(&self) -> &HashMap<Header, String> {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Start line and headers, plus where the body begins in the raw buffer.
struct Head {
    start_line: StartLine,
    headers: HashMap<Header, String>,
    body_start: usize,
}

impl Head {
    fn content_length(&self) -> Result<usize, ParseError> {
        match self.headers.get(&Header::ContentLength) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ParseError::InvalidContentLength(value.clone())),
            None => Ok(0),
        }
    }
}

/// Parse a raw request buffer.
pub fn parse(raw: &[u8]) -> Result<Request, ParseError> {
    let head = parse_head(raw)?.ok_or(ParseError::IncompleteHead)?;
    let expected = head.content_length()?;

    let available = raw.len() - head.body_start;
    if available < expected {
        return Err(ParseError::IncompleteBody { expected, available });
    }
    let body = raw[head.body_start..head.body_start + expected].to_vec();

    Ok(Request {
        start_line: head.start_line,
        headers: head.headers,
        body,
    })
}

/// Total number of bytes the request in `raw` occupies, once its head is complete.
///
/// Returns `Ok(None)` while the header block is still unterminated. A
/// Content-Length that pushes the total past `usize::MAX` is rejected.
pub fn frame_length(raw: &[u8]) -> Result<Option<usize>, ParseError> {
    let Some(head) = parse_head(raw)? else {
        return Ok(None);
    };
    let declared = head.content_length()?;
    head.body_start
        .checked_add(declared)
        .map(Some)
        .ok_or_else(|| ParseError::InvalidContentLength(declared.to_string()))
}

/// Position of the head terminator, searching from byte `from` onwards.
pub fn find_head_end(raw: &[u8], from: usize) -> Option<usize> {
    raw.get(from..)?
        .windows(HEAD_TERMINATOR.len())
        .position(|window| window == HEAD_TERMINATOR)
        .map(|offset| from + offset)
}

fn parse_head(raw: &[u8]) -> Result<Option<Head>, ParseError> {
    let Some(head_end) = find_head_end(raw, 0) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(&raw[..head_end]).map_err(|_| ParseError::InvalidUtf8)?;

    let mut lines = text.split(LINE_SEPARATOR);
    let start_line = parse_start_line(lines.next().unwrap_or_default())?;

    let mut headers = HashMap::new();
    for line in lines {
        let (header, value) = parse_header_line(line)?;
        // last occurrence wins
        headers.insert(header, value.to_string());
    }

    Ok(Some(Head {
        start_line,
        headers,
        body_start: head_end + HEAD_TERMINATOR.len(),
    }))
}

fn parse_start_line(line: &str) -> Result<StartLine, ParseError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    let [method, path, version] = tokens.as_slice() else {
        return Err(ParseError::MalformedStartLine(line.to_string()));
    };

    let method =
        Method::from_token(method).ok_or_else(|| ParseError::UnsupportedMethod(method.to_string()))?;

    Ok(StartLine {
        method,
        path: path.to_string(),
        version: version.to_string(),
    })
}

fn parse_header_line(line: &str) -> Result<(Header, &str), ParseError> {
    let (name, value) = line
        .split_once(HEADER_SEPARATOR)
        .ok_or_else(|| ParseError::MalformedHeader(line.to_string()))?;
    let header = Header::from_name(name).ok_or_else(|| ParseError::UnknownHeader(name.to_string()))?;
    Ok((header, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_start_line_and_headers() {
        let raw = b"GET /echo/abc HTTP/1.1\r\nHost: localhost:4221\r\nUser-Agent: curl/8.0\r\n\r\n";
        let request = parse(raw).unwrap();

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.path(), "/echo/abc");
        assert_eq!(request.start_line().version(), "HTTP/1.1");
        assert_eq!(request.header(Header::Host), Some("localhost:4221"));
        assert_eq!(request.header(Header::UserAgent), Some("curl/8.0"));
        assert_eq!(request.header(Header::ContentType), None);
        assert!(request.body().is_empty());
    }

    #[test]
    fn no_headers() {
        let request = parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/");
        assert!(request.headers().is_empty());
    }

    #[test]
    fn reads_exactly_content_length_bytes() {
        let raw = b"POST /files/a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello world";
        let request = parse(raw).unwrap();
        assert_eq!(request.method(), Method::Post);
        assert_eq!(request.body(), b"hello");
    }

    #[test]
    fn body_ignored_without_content_length() {
        let request = parse(b"POST /files/a HTTP/1.1\r\n\r\nstray").unwrap();
        assert!(request.body().is_empty());
    }

    #[test]
    fn short_body_is_an_error() {
        let raw = b"POST /files/a HTTP/1.1\r\nContent-Length: 10\r\n\r\nhello";
        assert_eq!(
            parse(raw),
            Err(ParseError::IncompleteBody { expected: 10, available: 5 })
        );
    }

    #[test]
    fn rejects_bad_start_lines() {
        assert!(matches!(
            parse(b"GET /\r\n\r\n"),
            Err(ParseError::MalformedStartLine(_))
        ));
        assert!(matches!(
            parse(b"GET / HTTP/1.1 extra\r\n\r\n"),
            Err(ParseError::MalformedStartLine(_))
        ));
        assert_eq!(
            parse(b"DELETE / HTTP/1.1\r\n\r\n"),
            Err(ParseError::UnsupportedMethod("DELETE".into()))
        );
    }

    #[test]
    fn rejects_unknown_and_malformed_headers() {
        assert_eq!(
            parse(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n"),
            Err(ParseError::UnknownHeader("Accept".into()))
        );
        assert!(matches!(
            parse(b"GET / HTTP/1.1\r\nHost:x\r\n\r\n"),
            Err(ParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn duplicate_header_last_wins() {
        let request = parse(b"GET / HTTP/1.1\r\nHost: a\r\nhost: b\r\n\r\n").unwrap();
        assert_eq!(request.header(Header::Host), Some("b"));
    }

    #[test]
    fn header_value_keeps_later_separators() {
        let request = parse(b"GET / HTTP/1.1\r\nUser-Agent: a: b\r\n\r\n").unwrap();
        assert_eq!(request.header(Header::UserAgent), Some("a: b"));
    }

    #[test]
    fn invalid_content_length() {
        assert_eq!(
            parse(b"POST /x HTTP/1.1\r\nContent-Length: five\r\n\r\n"),
            Err(ParseError::InvalidContentLength("five".into()))
        );
    }

    #[test]
    fn unterminated_head() {
        assert_eq!(parse(b"GET / HTTP/1.1\r\nHost: x\r\n"), Err(ParseError::IncompleteHead));
    }

    #[test]
    fn frame_length_reports_total_size() {
        assert_eq!(frame_length(b"GET / HTTP/1.1\r\n"), Ok(None));
        assert_eq!(frame_length(b"GET / HTTP/1.1\r\n\r\n"), Ok(Some(18)));
        let raw = b"POST /files/a HTTP/1.1\r\nContent-Length: 5\r\n\r\nhe";
        assert_eq!(frame_length(raw), Ok(Some(raw.len() - 2 + 5)));
    }

    #[test]
    fn frame_length_rejects_overflowing_content_length() {
        let raw = b"POST /echo/x HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\n";
        assert!(matches!(
            frame_length(raw),
            Err(ParseError::InvalidContentLength(_))
        ));
        // parse never slices past the buffer either
        assert!(matches!(parse(raw), Err(ParseError::IncompleteBody { .. })));
    }

    #[test]
    fn head_end_search_resumes_from_offset() {
        let raw = b"GET / HTTP/1.1\r\n\r\n";
        assert_eq!(find_head_end(raw, 0), Some(14));
        assert_eq!(find_head_end(raw, 14), Some(14));
        assert_eq!(find_head_end(raw, 15), None);
        assert_eq!(find_head_end(raw, 100), None);
    }
}
