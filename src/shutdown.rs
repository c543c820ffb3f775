//! Shutdown signalling.
//!
//! Two things end a running server: an OS signal (SIGTERM from Kubernetes,
//! Ctrl-C locally) and an integrity failure detected inside the process.
//! The second kind travels over the channel built by [`channel`]: any task
//! holding a [`ShutdownHandle`] may raise it, and only the serving loop
//! holding the [`ShutdownListener`] consumes it. Both lead to the same
//! graceful drain.

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Creates a connected handle/listener pair.
pub fn channel() -> (ShutdownHandle, ShutdownListener) {
    // One slot is enough: once a shutdown is pending, further requests for
    // one change nothing.
    let (tx, rx) = mpsc::channel(1);
    (ShutdownHandle(tx), ShutdownListener(rx))
}

/// Raises a shutdown. Cheap to clone; never blocks.
#[derive(Clone, Debug)]
pub struct ShutdownHandle(mpsc::Sender<String>);

impl ShutdownHandle {
    pub fn signal(&self, reason: impl Into<String>) {
        match self.0.try_send(reason.into()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(reason)) => {
                debug!(%reason, "shutdown already pending");
            }
            Err(mpsc::error::TrySendError::Closed(reason)) => {
                warn!(%reason, "shutdown requested but nobody is listening");
            }
        }
    }
}

/// The receiving end, owned by the serving loop.
#[derive(Debug)]
pub struct ShutdownListener(mpsc::Receiver<String>);

impl ShutdownListener {
    /// Waits for the next shutdown request and returns its reason.
    ///
    /// Returns `None` once every handle has been dropped.
    pub async fn recv(&mut self) -> Option<String> {
        self.0.recv().await
    }
}

/// Resolves on the first OS shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available. If a handler cannot be installed
/// that arm never fires; the shutdown channel still works.
pub(crate) async fn os_signal() -> &'static str {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                warn!("failed to install Ctrl-C handler: {e}");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<&'static str>();

    tokio::select! {
        name = ctrl_c  => name,
        name = sigterm => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_reason_wins_and_extra_signals_are_dropped() {
        let (handle, mut listener) = channel();
        handle.signal("integrity check failed");
        handle.clone().signal("again");

        assert_eq!(listener.recv().await.as_deref(), Some("integrity check failed"));
        drop(handle);
        assert_eq!(listener.recv().await, None);
    }
}
