// Application state module
// Manages runtime state shared across connections

use std::sync::atomic::AtomicBool;

use crate::handler::Router;

use super::types::Config;

/// Application state
///
/// Request handling never writes to this; the only mutable pieces are
/// atomics owned by the hosting glue.
pub struct AppState {
    pub config: Config,
    /// Route table, built once at startup
    pub router: Router,

    // Cached config value for fast access without locks
    pub cached_access_log: AtomicBool,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            router: Router::with_defaults(),
            cached_access_log: AtomicBool::new(config.logging.access_log),
        }
    }
}
