//! Greeting handler
//!
//! The single piece of business logic in this server: every request that
//! reaches it gets a fixed HTML fragment. Stateless and idempotent, so the
//! runtime may invoke it concurrently without coordination.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use super::router::RequestContext;
use crate::error::Result;

/// The fixed response body (19 bytes, no trailing newline)
pub const GREETING_BODY: &[u8] = b"<h1>HelloServlet</h1>";

/// Respond with the fixed greeting.
///
/// HEAD requests get the same status and headers as GET, including
/// `Content-Length`, but an empty body.
pub fn hello(ctx: &RequestContext<'_>) -> Result<Response<Full<Bytes>>> {
    let body = if ctx.is_head {
        Bytes::new()
    } else {
        Bytes::from_static(GREETING_BODY)
    };

    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "text/html")
        .header("Content-Length", GREETING_BODY.len())
        .body(Full::new(body))?)
}
