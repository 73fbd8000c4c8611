//! HTTP response building module
//!
//! Builders for the hosting-level responses (method gate), decoupled from
//! the greeting handler. Assembly failures propagate to the connection
//! driver instead of being patched up locally.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::error::Result;

/// Methods the server accepts, advertised in `Allow` headers
pub const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS";

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Result<Response<Full<Bytes>>> {
    Ok(Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::from("405 Method Not Allowed")))?)
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response() -> Result<Response<Full<Bytes>>> {
    Ok(Response::builder()
        .status(204)
        .header("Allow", ALLOWED_METHODS)
        .body(Full::new(Bytes::new()))?)
}
