//! Per-connection request/response cycle and lifecycle tracking.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Read one request, bounded by size and time limits
//! - Run parse → dispatch → handle → build, then write and close
//! - Track live connections for graceful shutdown
//!
//! # Design Decisions
//! - Every failure is scoped to its connection; nothing here exits the process
//! - Protocol errors become 400, oversize requests 413, routing misses 404
//! - Read failures and timeouts close the connection without a response
//! - Reading the whole request is bounded by one deadline on top of the per-read one

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::ServerConfig;
use crate::http::request::{find_head_end, frame_length, parse, Request};
use crate::http::response::{build, Response};
use crate::http::vocabulary::{StatusCode, HEAD_TERMINATOR};
use crate::observability::metrics;
use crate::routing::Router;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Errors that end a connection without a response being written.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("read timed out after {0:?}")]
    ReadTimeout(Duration),

    #[error("request not received within {0:?}")]
    RequestTimeout(Duration),

    #[error("peer closed before sending anything")]
    Empty,

    #[error("write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("write timed out after {0:?}")]
    WriteTimeout(Duration),
}

impl ConnectionError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::ReadTimeout(_) => "read_timeout",
            Self::RequestTimeout(_) => "request_timeout",
            Self::Empty => "empty",
            Self::Write(_) => "write",
            Self::WriteTimeout(_) => "write_timeout",
        }
    }
}

/// Limits applied to every connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub read_chunk_bytes: usize,
    pub max_request_bytes: usize,
    pub read_timeout: Duration,
    pub request_timeout: Duration,
    pub write_timeout: Duration,
}

impl From<&ServerConfig> for ConnectionSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            read_chunk_bytes: config.limits.read_chunk_bytes,
            max_request_bytes: config.limits.max_request_bytes,
            read_timeout: Duration::from_secs(config.timeouts.read_secs),
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
            write_timeout: Duration::from_secs(config.timeouts.write_secs),
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

/// Result of reading a request off the wire.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Everything received up to the end of the request (or until the peer closed).
    Complete(Vec<u8>),
    /// The request would exceed `max_request_bytes`.
    TooLarge,
}

/// Read one request.
///
/// Reads until the head is terminated and the declared Content-Length is
/// satisfied, the peer closes, or the size limit is crossed. If the head
/// turns out to be malformed, reading stops early and the bytes are
/// returned so the parser can report the error.
pub async fn read_request<R>(reader: &mut R, settings: &ConnectionSettings) -> Result<ReadOutcome, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(settings.read_chunk_bytes);
    let mut chunk = vec![0u8; settings.read_chunk_bytes];
    let mut needed: Option<usize> = None;
    // bytes before this offset are known not to start the head terminator
    let mut scanned = 0;

    loop {
        if needed.is_some_and(|total| buf.len() >= total) {
            break;
        }

        let n = tokio::time::timeout(settings.read_timeout, reader.read(&mut chunk))
            .await
            .map_err(|_| ConnectionError::ReadTimeout(settings.read_timeout))?
            .map_err(ConnectionError::Read)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if needed.is_none() {
            if find_head_end(&buf, scanned).is_some() {
                match frame_length(&buf) {
                    Ok(total) => needed = total,
                    Err(_) => break,
                }
            } else {
                scanned = buf.len().saturating_sub(HEAD_TERMINATOR.len() - 1);
            }
        }
        if needed.unwrap_or(buf.len()) > settings.max_request_bytes {
            return Ok(ReadOutcome::TooLarge);
        }
    }

    if buf.is_empty() {
        return Err(ConnectionError::Empty);
    }
    Ok(ReadOutcome::Complete(buf))
}

/// Serve exactly one request on `stream`, then shut it down.
pub async fn serve_connection<S>(
    mut stream: S,
    router: Arc<Router>,
    settings: &ConnectionSettings,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let start = Instant::now();

    let outcome = tokio::time::timeout(settings.request_timeout, read_request(&mut stream, settings))
        .await
        .map_err(|_| ConnectionError::RequestTimeout(settings.request_timeout))??;

    let (method, response) = match outcome {
        ReadOutcome::TooLarge => {
            tracing::warn!(limit = settings.max_request_bytes, "Request too large");
            (None, Response::new(StatusCode::PAYLOAD_TOO_LARGE))
        }
        ReadOutcome::Complete(raw) => match parse(&raw) {
            Ok(request) => {
                tracing::debug!(method = %request.method(), path = %request.path(), "Request parsed");
                (Some(request.method()), respond(router, request).await)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Rejected malformed request");
                (None, Response::new(StatusCode::BAD_REQUEST))
            }
        },
    };

    let (status, bytes) = match build(&response) {
        Ok(bytes) => (response.status().as_u16(), bytes),
        Err(e) => {
            tracing::error!(error = %e, "Handler produced an unbuildable response");
            (StatusCode::INTERNAL_SERVER_ERROR.as_u16(), server_error_bytes())
        }
    };

    tokio::time::timeout(settings.write_timeout, async {
        stream.write_all(&bytes).await?;
        stream.flush().await?;
        stream.shutdown().await
    })
    .await
    .map_err(|_| ConnectionError::WriteTimeout(settings.write_timeout))?
    .map_err(ConnectionError::Write)?;

    metrics::record_request(method.map_or("-", |m| m.as_str()), status, start);
    tracing::info!(
        method = method.map_or("-", |m| m.as_str()),
        status,
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Response written"
    );
    Ok(())
}

/// Dispatch and run the handler on the blocking pool.
async fn respond(router: Arc<Router>, request: Request) -> Response {
    let outcome = tokio::task::spawn_blocking(move || match router.dispatch(&request) {
        Ok(handler) => handler.handle(&request),
        Err(e) => {
            tracing::debug!(error = %e, "No route matched");
            Response::not_found()
        }
    })
    .await;

    match outcome {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Handler task failed");
            Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn server_error_bytes() -> Vec<u8> {
    // An empty 500 always has a reason phrase and needs no Content-Type.
    build(&Response::new(StatusCode::INTERNAL_SERVER_ERROR)).unwrap_or_default()
}

/// Tracks active connections for graceful shutdown.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened();
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Wait until every tracked connection has closed.
    pub async fn wait_idle(&self) {
        while self.active_count() > 0 {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed();
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::register_defaults;
    use tokio::io::duplex;

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            read_chunk_bytes: 8,
            max_request_bytes: 256,
            read_timeout: Duration::from_millis(200),
            request_timeout: Duration::from_secs(2),
            write_timeout: Duration::from_millis(200),
        }
    }

    fn router() -> Arc<Router> {
        let mut router = Router::new();
        register_defaults(&mut router, None).unwrap();
        Arc::new(router)
    }

    /// Send `request` through `serve_connection` and collect the raw response.
    async fn exchange(request: &[u8], settings: ConnectionSettings) -> Vec<u8> {
        let (mut client, server) = duplex(4096);
        let task = tokio::spawn(async move { serve_connection(server, router(), &settings).await });

        client.write_all(request).await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        task.await.unwrap().unwrap();
        response
    }

    #[test]
    fn connection_id_unique() {
        let id1 = ConnectionId::new();
        let id2 = ConnectionId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);
        assert_ne!(guard1.id(), guard2.id());

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn reads_body_across_chunks() {
        let raw = b"POST /files/a HTTP/1.1\r\nContent-Length: 20\r\n\r\n0123456789abcdefghij";
        let mut reader = &raw[..];
        let outcome = read_request(&mut reader, &settings()).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Complete(raw.to_vec()));
    }

    #[tokio::test]
    async fn rejects_oversized_declared_body() {
        let raw = b"POST /files/a HTTP/1.1\r\nContent-Length: 100000\r\n\r\nxx";
        let mut reader = &raw[..];
        assert_eq!(read_request(&mut reader, &settings()).await.unwrap(), ReadOutcome::TooLarge);
    }

    #[tokio::test]
    async fn rejects_endless_head() {
        let raw = vec![b'a'; 1024];
        let mut reader = raw.as_slice();
        assert_eq!(read_request(&mut reader, &settings()).await.unwrap(), ReadOutcome::TooLarge);
    }

    #[tokio::test]
    async fn empty_connection_is_an_error() {
        let mut reader: &[u8] = b"";
        assert!(matches!(
            read_request(&mut reader, &settings()).await,
            Err(ConnectionError::Empty)
        ));
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (_client, mut server) = duplex(64);
        assert!(matches!(
            read_request(&mut server, &settings()).await,
            Err(ConnectionError::ReadTimeout(_))
        ));
    }

    #[tokio::test]
    async fn serves_echo() {
        let response = exchange(b"GET /echo/abc HTTP/1.1\r\n\r\n", settings()).await;
        assert_eq!(
            response,
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\nabc"
        );
    }

    #[tokio::test]
    async fn unknown_header_is_bad_request() {
        let response = exchange(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n", settings()).await;
        assert_eq!(response, b"HTTP/1.1 400 BAD REQUEST\r\n\r\n");
    }

    #[tokio::test]
    async fn unmatched_route_is_not_found() {
        let response = exchange(b"GET /nope HTTP/1.1\r\n\r\n", settings()).await;
        assert_eq!(response, b"HTTP/1.1 404 NOT FOUND\r\n\r\n");
    }

    #[tokio::test]
    async fn oversized_request_is_rejected() {
        let response = exchange(
            b"POST /files/a HTTP/1.1\r\nContent-Length: 4096\r\n\r\n",
            settings(),
        )
        .await;
        assert_eq!(response, b"HTTP/1.1 413 PAYLOAD TOO LARGE\r\n\r\n");
    }

    #[tokio::test]
    async fn overflowing_content_length_is_bad_request() {
        let response = exchange(
            b"POST /echo/x HTTP/1.1\r\nContent-Length: 18446744073709551615\r\n\r\n",
            settings(),
        )
        .await;
        assert_eq!(response, b"HTTP/1.1 400 BAD REQUEST\r\n\r\n");
    }

    #[tokio::test]
    async fn head_split_across_reads_is_found() {
        // chunk size 8 puts the terminator across a read boundary
        let raw = b"GET /echo/ab HTTP/1.1\r\n\r\n";
        let (mut client, mut server) = duplex(64);
        let writer = tokio::spawn(async move {
            for piece in raw.chunks(3) {
                client.write_all(piece).await.unwrap();
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            client
        });

        let outcome = read_request(&mut server, &settings()).await.unwrap();
        assert_eq!(outcome, ReadOutcome::Complete(raw.to_vec()));
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn dripping_client_hits_request_deadline() {
        let settings = ConnectionSettings {
            max_request_bytes: 4096,
            request_timeout: Duration::from_millis(500),
            ..settings()
        };
        let (mut client, server) = duplex(64);
        let task = tokio::spawn(async move { serve_connection(server, router(), &settings).await });

        let request = b"POST /echo/x HTTP/1.1\r\nContent-Length: 1000\r\n\r\n";
        if client.write_all(request).await.is_ok() {
            // each byte lands well inside the per-read deadline
            for _ in 0..20 {
                tokio::time::sleep(Duration::from_millis(100)).await;
                if client.write_all(b"x").await.is_err() {
                    break;
                }
            }
        }

        let result = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("connection outlived the request deadline")
            .unwrap();
        assert!(matches!(result, Err(ConnectionError::RequestTimeout(_))));
    }
}
