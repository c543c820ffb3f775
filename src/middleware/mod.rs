//! Built-in middleware.
//!
//! Middleware intercepts a request on its way to the route handler and the
//! result on its way back, and is the place for cross-cutting concerns.
//! Each constructor returns a [`Middleware`](crate::Middleware) ready to
//! pass to [`App::new`](crate::App::new) or to a single route.
//!
//! The canonical global order is:
//!
//! ```rust
//! use strata::middleware::{errors, logger, panics};
//! use strata::{App, shutdown};
//!
//! let (handle, _listener) = shutdown::channel();
//! let app = App::new(handle, vec![logger(), errors(), panics()]);
//! ```
//!
//! - `logger` is outermost so its "completed" line carries the final status
//!   and the full latency.
//! - `errors` turns returned errors into error responses.
//! - `panics` is innermost so a panicking handler becomes an ordinary error
//!   before `errors` sees it.
//!
//! The built-in layers refuse to run without request state and answer with a
//! shutdown signal instead.
//!
//! Your own layers are built with [`from_fn`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::middleware::from_fn;
//! use strata::{BoxedHandler, Context, Request, ResponseWriter, boxed};
//!
//! let audit = from_fn(|next: BoxedHandler| {
//!     boxed(move |ctx: Context, w: ResponseWriter, req: Request| {
//!         let next = Arc::clone(&next);
//!         async move {
//!             tracing::info!(path = req.path(), "audited");
//!             next.call(ctx, w, req).await
//!         }
//!     })
//! });
//! # let _ = audit;
//! ```

mod errors;
mod logger;
mod namespace;
mod panics;

pub use crate::handler::middleware as from_fn;
pub use errors::errors;
pub use logger::logger;
pub use namespace::{DEFAULT_NAMESPACE, namespace};
pub use panics::panics;
