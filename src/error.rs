//! Error types for helloserv

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the helloserv HTTP server
#[derive(Debug, Error)]
pub enum Error {
    /// Response assembly failed. The only failure a handler itself can
    /// produce; propagated to the connection driver unrecovered.
    #[error("Failed to build response: {0}")]
    Http(#[from] hyper::http::Error),

    /// Socket bind/accept failure in the hosting glue
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configured host:port does not parse as a socket address
    #[error("Invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}
