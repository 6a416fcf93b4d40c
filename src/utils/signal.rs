//! Signal handling for graceful shutdown
//!
//! The node stops on SIGTERM, SIGINT or Ctrl+C, and also when the `stop`
//! RPC flips the node's shutdown flag.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

/// Wait for SIGTERM, SIGINT or Ctrl+C
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                signal::ctrl_c().await.ok();
                return;
            }
        };

        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                warn!("Failed to register SIGINT handler: {}", e);
                signal::ctrl_c().await.ok();
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down gracefully...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down gracefully..."),
            Err(e) => warn!("Failed to listen for shutdown signal: {}", e),
        }
    }
}

/// Wait until `flag` turns true. A dropped sender counts as shutdown.
pub async fn wait_for_flag(mut flag: watch::Receiver<bool>) {
    if flag.wait_for(|stop| *stop).await.is_ok() {
        info!("Shutdown requested over RPC");
    }
}

/// Wait for an OS signal or the node's shutdown flag, whichever comes first.
pub async fn wait_for_shutdown(flag: watch::Receiver<bool>) {
    tokio::select! {
        _ = wait_for_shutdown_signal() => {}
        _ = wait_for_flag(flag) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_flag_ends_wait() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        tx.send_replace(true);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_ends_wait() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), wait_for_flag(rx))
            .await
            .unwrap();
    }
}
