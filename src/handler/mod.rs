//! Request handler module
//!
//! The greeting handler plus the route table that dispatches to it.

pub mod hello;
pub mod router;

// Re-export main entry points
pub use router::{handle_request, RequestContext, Router};
