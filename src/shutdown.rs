use tokio_util::sync::CancellationToken;

/// Why the event loop stopped (useful for logs + tests).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ShutdownReason {
    CtrlC,
    Sigterm,
    FeedEnded,
}

#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Waits for Ctrl+C (SIGINT) and cancels the token.
/// Returns the reason so caller can log it.
pub async fn wait_ctrl_c(shutdown: &Shutdown) -> ShutdownReason {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a handler, only another signal source can stop us.
        shutdown.token().cancelled().await;
    }
    shutdown.cancel();
    ShutdownReason::CtrlC
}

/// Wait for SIGTERM on Unix (Linux/macOS). On non-Unix, this future only completes
/// once the token is cancelled elsewhere.
#[cfg(unix)]
pub async fn wait_sigterm(shutdown: &Shutdown) -> ShutdownReason {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sig) => {
            sig.recv().await;
            shutdown.cancel();
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            shutdown.token().cancelled().await;
        }
    }
    ShutdownReason::Sigterm
}

#[cfg(not(unix))]
pub async fn wait_sigterm(shutdown: &Shutdown) -> ShutdownReason {
    shutdown.token().cancelled().await;
    ShutdownReason::Sigterm
}

/// Resolves with the first signal received.
pub async fn wait_for_signal(shutdown: &Shutdown) -> ShutdownReason {
    tokio::select! {
        reason = wait_ctrl_c(shutdown) => reason,
        reason = wait_sigterm(shutdown) => reason,
    }
}
