//! Handler trait, type erasure, and middleware composition.
//!
//! # How async handlers are stored
//!
//! The router needs to hold handlers of *different* types in one table, and
//! middleware needs to wrap any of them. Both work on trait objects
//! (`dyn ErasedHandler`) that hide the concrete handler type:
//!
//! ```text
//! async fn create(ctx, w, req) -> Result<(), Error> { … }   ← user writes this
//!        ↓ app.handle(Method::POST, "/create", create, &[])
//! create.into_boxed_handler()                              ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(create))                              ← BoxedHandler
//!        ↓ wrap_middleware(&[logger, errors, panics], h)
//! logger(errors(panics(h)))                                ← still a BoxedHandler
//! ```
//!
//! A middleware is a plain function from [`BoxedHandler`] to
//! [`BoxedHandler`]. Composition happens once, at registration; the only
//! per-request cost is one virtual call per layer.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::response::ResponseWriter;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future produced by one handler call.
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

/// Dispatch interface shared by route handlers and middleware layers.
pub trait ErasedHandler {
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// A handler-to-handler transformation adding cross-cutting behavior.
pub type Middleware = Arc<dyn Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure with the shape:
///
/// ```text
/// async fn name(ctx: Context, w: ResponseWriter, req: Request) -> Result<(), Error>
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut> private::Sealed for F
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
}

impl<F, Fut> Handler for F
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

/// Newtype bridging a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut> ErasedHandler for FnHandler<F>
where
    F: Fn(Context, ResponseWriter, Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), Error>> + Send + 'static,
{
    fn call(&self, ctx: Context, w: ResponseWriter, req: Request) -> BoxFuture {
        Box::pin((self.0)(ctx, w, req))
    }
}

// ── Composition ───────────────────────────────────────────────────────────────

/// Boxes a handler so it can be stored or wrapped.
pub fn boxed(handler: impl Handler) -> BoxedHandler {
    handler.into_boxed_handler()
}

/// Builds a [`Middleware`] from a closure.
pub fn middleware<F>(f: F) -> Middleware
where
    F: Fn(BoxedHandler) -> BoxedHandler + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Wraps `handler` in `mw` so that the first middleware is outermost:
/// `[m1, m2, m3]` around `h` yields `m1(m2(m3(h)))`.
pub fn wrap_middleware(mw: &[Middleware], handler: BoxedHandler) -> BoxedHandler {
    mw.iter().rev().fold(handler, |inner, m| m(inner))
}
