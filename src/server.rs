//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server stops on SIGTERM, Ctrl-C, or a request on the application's
//! [shutdown channel](crate::shutdown), and reacts the same way to all three:
//! 1. Immediately stops `listener.accept()`, so no new connections are made.
//! 2. Tells every open connection to finish its in-flight request and close.
//! 3. Waits up to the shutdown timeout for that to happen; connections still
//!    open after it are aborted and [`serve`](Server::serve) reports
//!    [`Error::ShutdownTimeout`].
//!
//! Keep the shutdown timeout below `terminationGracePeriodSeconds`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::app::App;
use crate::config::ServerConfig;
use crate::error::Error;
use crate::request::Request;
use crate::shutdown::{ShutdownListener, os_signal};

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    read_timeout: Option<Duration>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string. Use
    /// [`Server::from_config`] to get an error instead.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr, read_timeout: None, shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            addr: config.api_host,
            read_timeout: Some(config.read_timeout),
            shutdown_timeout: config.shutdown_timeout,
        }
    }

    /// How long a client may take to send request headers.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// How long in-flight requests get to finish once shutdown starts.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Binds the configured address and serves `app` until shutdown.
    pub async fn serve(self, app: App, shutdown: ShutdownListener) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        self.serve_on(listener, app, shutdown).await
    }

    /// Serves `app` on an already-bound listener until shutdown.
    ///
    /// Returns `Ok(())` after a clean drain and
    /// [`Error::ShutdownTimeout`] if connections had to be cut.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        app: App,
        mut shutdown: ShutdownListener,
    ) -> Result<(), Error> {
        // Wrap the app in Arc so concurrent connection tasks share one
        // routing table instead of copying it.
        let app = Arc::new(app);

        let mut builder = ConnBuilder::new(TokioExecutor::new());
        if let Some(timeout) = self.read_timeout {
            builder.http1().timer(TokioTimer::new()).header_read_timeout(Some(timeout));
        }

        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        let os = os_signal();
        tokio::pin!(os);

        info!(addr = %listener.local_addr()?, "strata listening");

        loop {
            tokio::select! {
                // Check shutdown first so a signal immediately stops
                // accepting, even if more connections are queued.
                biased;

                signal = &mut os => {
                    info!(signal, in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                Some(reason) = shutdown.recv() => {
                    warn!(%reason, in_flight = tasks.len(), "shutdown requested by the application, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let app = Arc::clone(&app);
                    // The closure is called once per request on the
                    // connection, not once per connection.
                    let svc = service_fn(move |req| {
                        let app = Arc::clone(&app);
                        async move { dispatch(&app, req, remote_addr).await }
                    });

                    let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), svc);
                    let conn = graceful.watch(conn.into_owned());
                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            debug!(peer = %remote_addr, "connection closed: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);

        match tokio::time::timeout(self.shutdown_timeout, graceful.shutdown()).await {
            Ok(()) => {
                while tasks.join_next().await.is_some() {}
                info!("strata stopped");
                Ok(())
            }
            Err(_) => {
                warn!(open = tasks.len(), timeout = ?self.shutdown_timeout, "drain deadline passed, aborting connections");
                tasks.shutdown().await;
                Err(Error::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads the body, runs the request through the app, and converts the
/// result for hyper. An error here makes hyper drop the connection without
/// answering, which is exactly what a shutdown signal asks for.
async fn dispatch(
    app: &App,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Error> {
    let (parts, body) = req.into_parts();
    let body = body.collect().await?.to_bytes();

    let response = app.dispatch(Request::from_parts(parts, body, Some(remote_addr))).await?;
    Ok(response.into_http())
}
