//! # Cross-platform OS signal handling.
//!
//! Provides [`wait_for_shutdown_signal`], an async helper that completes
//! when the process receives a termination signal while a batch is running.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//! - `SIGQUIT` (quit signal, often used for core dumps or hard stop)
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. If listener registration
/// fails, the future stays pending: the run then simply completes on its own
/// without a signal-driven shutdown path.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let listeners = (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::quit()),
    );

    match listeners {
        (Ok(mut sigint), Ok(mut sigterm), Ok(mut sigquit)) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigint.recv()  => {},
                _ = sigterm.recv() => {},
                _ = sigquit.recv() => {},
            }
        }
        _ => std::future::pending::<()>().await,
    }
}

/// Waits for a termination signal.
///
/// Each call creates an independent listener. If registration fails, the
/// future stays pending and the run completes without a signal-driven
/// shutdown path.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
