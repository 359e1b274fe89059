//! Termination signals for the server's graceful shutdown.

use std::future::Future;
use std::io;

use tracing::{error, info};

/// Resolves on ctrl-c or SIGTERM. A signal that cannot be registered never
/// fires, so the server keeps running on the remaining one.
pub async fn shutdown_signal() {
    let ctrl_c = wait_registered("ctrl-c", Ok(tokio::signal::ctrl_c()));

    #[cfg(unix)]
    let terminate = {
        use tokio::signal::unix::{signal, SignalKind};
        let listener = signal(SignalKind::terminate()).map(|mut sigterm| async move {
            sigterm.recv().await;
            Ok::<(), io::Error>(())
        });
        wait_registered("SIGTERM", listener)
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Awaits a signal listener. Registration or listen errors park forever
/// instead of resolving.
pub async fn wait_registered<F>(name: &str, listener: io::Result<F>)
where
    F: Future<Output = io::Result<()>>,
{
    let outcome = match listener {
        Ok(listener) => listener.await,
        Err(e) => Err(e),
    };
    if let Err(e) = outcome {
        error!("Failed to listen for {}: {}", name, e);
        std::future::pending::<()>().await;
    }
}
