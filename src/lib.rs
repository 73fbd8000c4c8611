//! helloserv - a minimal fixed-response HTTP/1 server
//!
//! Every GET is answered with `200`, `Content-Type: text/html`, and the
//! 19-byte body `<h1>HelloServlet</h1>`. Useful as a smoke-test backend
//! behind proxies and load balancers.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::{AppState, Config};
pub use error::{Error, Result};
