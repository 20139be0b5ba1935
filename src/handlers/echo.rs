use crate::handlers::Handler;
use crate::http::request::Request;
use crate::http::response::Response;

pub const PREFIX: &str = "/echo/";

/// Returns the path remainder after `/echo/` as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

impl Handler for Echo {
    fn handle(&self, request: &Request) -> Response {
        let text = request.path().strip_prefix(PREFIX).unwrap_or_default();
        Response::text(text)
    }
}
