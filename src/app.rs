//! The dispatcher: route registration and per-request entry point.

use std::collections::HashSet;

use http::{Method, StatusCode};
use tracing::{error, warn};

use crate::context::{Context, RequestState};
use crate::error::Error;
use crate::handler::{Handler, Middleware, boxed, wrap_middleware};
use crate::request::Request;
use crate::response::{Response, ResponseWriter};
use crate::router::{Route, Router};
use crate::shutdown::ShutdownHandle;

/// The application: routes, global middleware, and the shutdown line.
///
/// Build it once at startup, register every route, then hand it to
/// [`Server::serve`](crate::Server::serve).
///
/// ```rust
/// use http::{Method, StatusCode};
/// use strata::middleware::{errors, logger, panics};
/// use strata::{App, Context, Error, Request, ResponseWriter, respond, shutdown};
///
/// async fn ping(ctx: Context, w: ResponseWriter, _req: Request) -> Result<(), Error> {
///     respond(&ctx, &w, &"pong", StatusCode::OK)
/// }
///
/// let (handle, _listener) = shutdown::channel();
/// let app = App::new(handle, vec![logger(), errors(), panics()])
///     .handle(Method::GET, "/ping", ping, &[]);
/// ```
pub struct App {
    router: Router,
    middleware: Vec<Middleware>,
    shutdown: ShutdownHandle,
    registered: Option<HashSet<String>>,
}

impl App {
    /// `middleware` wraps every route, first entry outermost.
    pub fn new(shutdown: ShutdownHandle, middleware: Vec<Middleware>) -> Self {
        Self { router: Router::default(), middleware, shutdown, registered: None }
    }

    /// Remembers every `METHOD path` registered from here on and silently
    /// ignores repeats instead of panicking on them. Meant for setups that
    /// may run the same registration code more than once, such as debug
    /// endpoints shared between components.
    pub fn track_registrations(mut self) -> Self {
        self.registered.get_or_insert_with(HashSet::new);
        self
    }

    /// Registers `handler` for `method` + `path`. Returns `self` for chaining.
    ///
    /// `mw` wraps the handler first (innermost), then the global middleware
    /// wraps the result. Path parameters use `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if `path` is invalid or conflicts with an existing route,
    /// unless registration tracking is on and the exact pair was seen before.
    pub fn handle(mut self, method: Method, path: &str, handler: impl Handler, mw: &[Middleware]) -> Self {
        if let Some(seen) = self.registered.as_mut() {
            if !seen.insert(format!("{method} {path}")) {
                return self;
            }
        }

        let handler = wrap_middleware(mw, boxed(handler));
        let handler = wrap_middleware(&self.middleware, handler);
        self.router.insert(method, path, handler);
        self
    }

    /// A handle for raising a shutdown from anywhere, e.g. an integrity check.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn signal_shutdown(&self, reason: impl Into<String>) {
        self.shutdown.signal(reason);
    }

    /// Runs one request through its route.
    ///
    /// Seeds fresh [`RequestState`], calls the composed handler and returns
    /// the response it wrote. Every request gets exactly one response,
    /// except when the chain reports a shutdown signal: then the shutdown is
    /// raised and the error is returned so the server can drop the
    /// connection without answering.
    pub async fn dispatch(&self, mut req: Request) -> Result<Response, Error> {
        let handler = match self.router.lookup(req.method(), req.path()) {
            Route::Found(handler, params) => {
                req.set_params(params);
                handler
            }
            Route::MethodNotAllowed => return Ok(Response::envelope(StatusCode::METHOD_NOT_ALLOWED)),
            Route::NotFound => return Ok(Response::envelope(StatusCode::NOT_FOUND)),
        };

        let state = RequestState::new();
        let trace_id = state.trace_id().to_owned();
        let w = ResponseWriter::new();

        match handler.call(Context::new(state), w.clone(), req).await {
            Ok(()) => {}
            Err(err) if err.is_shutdown() => {
                error!(%trace_id, error = %err, "integrity failure, shutting down");
                self.signal_shutdown(err.to_string());
                return Err(err);
            }
            Err(err) => {
                warn!(%trace_id, error = %err, "error reached the dispatcher unhandled");
            }
        }

        Ok(w.take().unwrap_or_else(|| {
            error!(%trace_id, "handler chain finished without responding");
            Response::envelope(StatusCode::INTERNAL_SERVER_ERROR)
        }))
    }
}
