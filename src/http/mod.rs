//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Raw request bytes (net::connection)
//!     → request.rs (start line, headers, body)
//!     → [routing layer selects a handler]
//!     → response.rs (status line, headers, Content-Length, body)
//!     → Raw response bytes
//!
//! server.rs owns the accept loop that feeds connections into this pipeline.
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod vocabulary;

pub use request::{parse, ParseError, Request, StartLine};
pub use response::{build, BuildError, Response};
pub use server::HttpServer;
pub use vocabulary::{Header, Method, StatusCode};
