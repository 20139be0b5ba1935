use crate::handlers::Handler;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::vocabulary::{Header, StatusCode};

pub const PATH: &str = "/user-agent";

/// Reflects the User-Agent header back as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAgent;

impl Handler for UserAgent {
    fn handle(&self, request: &Request) -> Response {
        match request.header(Header::UserAgent) {
            Some(agent) => Response::text(agent),
            None => Response::new(StatusCode::OK),
        }
    }
}
