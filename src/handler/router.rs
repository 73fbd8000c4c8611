//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route table
//! lookup, response header stamping, and access logging.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::header::{HeaderValue, SERVER};
use hyper::{Method, Request, Response, Version};
use std::collections::HashMap;

use crate::config::AppState;
use crate::error::Result;
use crate::http;
use crate::logger;
use crate::logger::AccessLogEntry;

use super::hello;

/// Request context encapsulating information needed by handlers
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
}

/// A registered handler: plain function from request context to a complete
/// response. No trait objects or inheritance involved.
pub type HandlerFn = fn(&RequestContext<'_>) -> Result<Response<Full<Bytes>>>;

/// Route table keyed by method and path, with a default handler for
/// unmatched paths.
pub struct Router {
    routes: HashMap<(Method, String), HandlerFn>,
    default: HandlerFn,
}

impl Router {
    pub fn new(default: HandlerFn) -> Self {
        Self {
            routes: HashMap::new(),
            default,
        }
    }

    /// The standard table: the greeting handler at `GET /`, and as the
    /// default for every other path.
    pub fn with_defaults() -> Self {
        let mut router = Self::new(hello::hello);
        router.register(Method::GET, "/", hello::hello);
        router
    }

    pub fn register(&mut self, method: Method, path: &str, handler: HandlerFn) {
        self.routes.insert((method, path.to_string()), handler);
    }

    /// Resolve a handler for the given method and path.
    ///
    /// HEAD is looked up through the GET table since HEAD responses are
    /// derived from their GET counterparts.
    pub fn resolve(&self, method: &Method, path: &str) -> HandlerFn {
        let lookup_method = if *method == Method::HEAD {
            Method::GET
        } else {
            method.clone()
        };
        self.routes
            .get(&(lookup_method, path.to_string()))
            .copied()
            .unwrap_or(self.default)
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>> {
    let started = Instant::now();
    let method = req.method();
    let uri = req.uri();
    let is_head = *method == Method::HEAD;

    let ctx = RequestContext {
        path: uri.path(),
        is_head,
    };

    // 1. Method gate, then route table dispatch
    let mut response = match method {
        &Method::GET | &Method::HEAD => {
            let handler = state.router.resolve(method, ctx.path);
            handler(&ctx)?
        }
        &Method::OPTIONS => http::build_options_response()?,
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            http::build_405_response()?
        }
    };

    // 2. Stamp the configured Server header
    match HeaderValue::from_str(&state.config.http.server_name) {
        Ok(value) => {
            response.headers_mut().insert(SERVER, value);
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid server_name '{}', Server header skipped",
                state.config.http.server_name
            ));
        }
    }

    // 3. One access log entry per request (lock-free enable check)
    if state.cached_access_log.load(Ordering::Relaxed) {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            uri.path().to_string(),
        );
        entry.query = uri.query().map(ToString::to_string);
        entry.http_version = version_str(req.version()).to_string();
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header_str(&req, "referer");
        entry.user_agent = header_str(&req, "user-agent");
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_str(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        _ => "1.1",
    }
}
