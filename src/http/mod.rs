//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! greeting handler.

pub mod response;

// Re-export commonly used builders
pub use response::{build_405_response, build_options_response};
