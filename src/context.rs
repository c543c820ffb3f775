//! Per-request state carried through the handler chain.
//!
//! A [`Context`] is handed to every handler by value. It is a cheap clone:
//! the [`RequestState`] behind it is reference-counted and its only mutable
//! field is an atomic, so middleware can read back what an inner layer
//! recorded without any locking.

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{Duration, Instant, SystemTime};

use http::StatusCode;
use uuid::Uuid;

use crate::error::Error;

const MISSING_STATE: &str = "web value missing from context";

/// State owned by exactly one in-flight request.
#[derive(Debug)]
pub struct RequestState {
    trace_id: String,
    started: Instant,
    started_at: SystemTime,
    status: AtomicU16,
}

impl RequestState {
    /// Fresh state for a new request: an 8-character trace id and the
    /// current time. The status stays `0` until a response is recorded.
    pub fn new() -> Self {
        let mut trace_id = Uuid::new_v4().simple().to_string();
        trace_id.truncate(8);
        Self {
            trace_id,
            started: Instant::now(),
            started_at: SystemTime::now(),
            status: AtomicU16::new(0),
        }
    }

    pub fn trace_id(&self) -> &str { &self.trace_id }
    pub fn started_at(&self) -> SystemTime { self.started_at }
    pub fn elapsed(&self) -> Duration { self.started.elapsed() }

    /// The status recorded by the responder, `0` if nothing was sent yet.
    pub fn status(&self) -> u16 {
        self.status.load(Ordering::Relaxed)
    }

    pub(crate) fn set_status(&self, status: StatusCode) {
        self.status.store(status.as_u16(), Ordering::Relaxed);
    }
}

impl Default for RequestState {
    fn default() -> Self { Self::new() }
}

/// The request-scoped carrier passed to every handler.
///
/// The dispatcher always seeds it with a [`RequestState`]. A context built
/// with [`Context::detached`] has none, and every framework layer that
/// touches it answers with a shutdown signal: a request without state means
/// the framework itself is broken.
#[derive(Clone, Debug, Default)]
pub struct Context {
    state: Option<Arc<RequestState>>,
    namespace: Option<Arc<str>>,
}

impl Context {
    pub fn new(state: RequestState) -> Self {
        Self { state: Some(Arc::new(state)), namespace: None }
    }

    /// A context with no request state attached.
    pub fn detached() -> Self {
        Self::default()
    }

    /// The request state, or [`Error::Shutdown`] when it is missing.
    pub fn state(&self) -> Result<&RequestState, Error> {
        self.state.as_deref().ok_or_else(|| Error::shutdown(MISSING_STATE))
    }

    /// The namespace resolved by the namespace middleware, if it ran.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn with_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(Arc::from(namespace));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ids_are_short_and_distinct() {
        let a = RequestState::new();
        let b = RequestState::new();
        assert_eq!(a.trace_id().len(), 8);
        assert_ne!(a.trace_id(), b.trace_id());
        assert_eq!(a.status(), 0);
    }

    #[test]
    fn status_written_through_one_clone_is_seen_by_another() {
        let ctx = Context::new(RequestState::new());
        let inner = ctx.clone();
        inner.state().unwrap().set_status(StatusCode::CREATED);
        assert_eq!(ctx.state().unwrap().status(), 201);
    }

    #[test]
    fn detached_context_reports_shutdown() {
        let err = Context::detached().state().unwrap_err();
        assert!(err.is_shutdown());
    }

    #[test]
    fn namespace_is_scoped_to_the_derived_context() {
        let outer = Context::new(RequestState::new());
        let inner = outer.clone().with_namespace("acme");
        assert_eq!(inner.namespace(), Some("acme"));
        assert_eq!(outer.namespace(), None);
    }
}
