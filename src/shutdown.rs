use tokio::signal;
use tracing::{info, warn};

use crate::database::DatabaseManager;
use crate::observability::breed_metrics;

/// Resolves on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

/// Release resources once the HTTP server has drained
pub async fn shutdown_all_services(database: &DatabaseManager) {
    info!("Initiating graceful shutdown of all services...");

    breed_metrics().log_stats();
    database.shutdown().await;

    info!("Graceful shutdown completed successfully");
}
