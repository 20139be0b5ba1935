//! Built-in health check served at `/`.

use crate::handlers::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::vocabulary::StatusCode;

/// Always 200 with an empty body.
#[derive(Debug, Clone, Copy, Default)]
pub struct HealthCheck;

impl Handler for HealthCheck {
    fn handle(&self, _request: &Request) -> Response {
        Response::new(StatusCode::OK)
    }
}
