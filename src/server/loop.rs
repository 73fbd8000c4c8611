// Server loop module
// Main accept loop with graceful shutdown

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::error::Result;
use crate::logger;

/// How long shutdown waits for in-flight connections before giving up
const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

/// Accept loop: serve connections until the shutdown signal trips, then
/// drain active connections with a bounded wait.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) -> Result<()> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown_started();
                break;
            }
        }
    }

    // Stop accepting before draining; in-flight connections keep their
    // spawned tasks and finish on their own.
    drop(listener);
    drain_connections(&active_connections).await;
    logger::log_shutdown_complete();

    Ok(())
}

/// Wait for active connections to finish, up to `DRAIN_DEADLINE`.
async fn drain_connections(active_connections: &Arc<AtomicUsize>) {
    let deadline = tokio::time::Instant::now() + DRAIN_DEADLINE;

    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown drain deadline reached with {active} connection(s) still active"
            ));
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_drain_returns_when_counter_hits_zero() {
        let counter = Arc::new(AtomicUsize::new(1));
        let background = Arc::clone(&counter);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            background.store(0, Ordering::SeqCst);
        });

        drain_connections(&counter).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_shutdown_signal_stops_loop() {
        let cfg = crate::config::Config::load_from("does_not_exist").unwrap();
        let state = Arc::new(AppState::new(&cfg));
        let listener = crate::server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let shutdown = Arc::new(Notify::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let loop_shutdown = Arc::clone(&shutdown);
        let handle = tokio::spawn(async move {
            start_server_loop(listener, state, counter, loop_shutdown).await
        });

        // notify_one stores a permit, so the signal is not lost even if
        // the loop has not parked on select yet
        shutdown.notify_one();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop did not stop after shutdown signal")
            .unwrap();
        assert!(result.is_ok());
    }
}
