//! Graceful Shutdown Handler
//!
//! Turns process signals into a future the HTTP server can drain on.

use std::future::Future;

/// Wait for Ctrl+C or SIGTERM.
///
/// If a handler cannot be installed the error is logged and that signal is
/// ignored; the other one still triggers shutdown.
#[cfg_attr(coverage_nightly, coverage(off))]
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    wait_for_first(ctrl_c, terminate).await;
}

/// Resolve when either trigger completes, logging which one fired.
async fn wait_for_first<A, B>(ctrl_c: A, terminate: B)
where
    A: Future<Output = ()>,
    B: Future<Output = ()>,
{
    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received Ctrl+C, initiating shutdown");
        }
        _ = terminate => {
            tracing::info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn test_first_trigger_wins() {
        let ctrl_c = async {};
        let terminate = std::future::pending::<()>();

        let result = tokio::time::timeout(
            Duration::from_millis(100),
            wait_for_first(ctrl_c, terminate),
        )
        .await;

        assert!(result.is_ok());
        assert!(logs_contain("received Ctrl+C"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_terminate_trigger() {
        let ctrl_c = std::future::pending::<()>();
        let terminate = async {};

        wait_for_first(ctrl_c, terminate).await;

        assert!(logs_contain("received SIGTERM"));
    }

    #[tokio::test]
    async fn test_pending_until_triggered() {
        let result = tokio::time::timeout(
            Duration::from_millis(50),
            wait_for_first(std::future::pending(), std::future::pending()),
        )
        .await;

        assert!(result.is_err());
    }
}
