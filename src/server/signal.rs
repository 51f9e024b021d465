// Signal handling module
//
// SIGINT (Ctrl+C) and SIGTERM both request a graceful stop. On non-Unix
// targets only Ctrl+C is observed.

use crate::logger;

/// Resolve once the process has been asked to stop.
#[cfg(unix)]
pub async fn shutdown_requested() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            logger::log_warning(&format!("Failed to register SIGTERM handler: {e}"));
            wait_ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        () = wait_ctrl_c() => {}
        _ = sigterm.recv() => {
            logger::log_info("[SIGNAL] SIGTERM received, shutting down");
        }
    }
}

#[cfg(not(unix))]
pub async fn shutdown_requested() {
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logger::log_info("[SIGNAL] SIGINT received, shutting down"),
        Err(e) => {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            // Without a working handler, never resolve; the process is stopped externally.
            std::future::pending::<()>().await;
        }
    }
}
