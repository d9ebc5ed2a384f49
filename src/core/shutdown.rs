//! Cross-platform OS signal handling.
//!
//! [`wait_for_shutdown_signal`] completes when the process receives a
//! termination signal. An interrupted fuzzing run must never leak its
//! children, so the scheduler races this against the generator workers and
//! tears down the whole process tree when it fires.
//!
//! ## Signals
//! **Unix:** `SIGINT` (Ctrl-C), `SIGTERM` (default kill), `SIGQUIT`.
//! **Windows:** Ctrl-C via [`tokio::signal::ctrl_c`].

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when any
/// signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv() => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Ok(())` when any
/// signal is received, or `Err` if signal registration fails.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
