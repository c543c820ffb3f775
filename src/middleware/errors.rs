//! Error surfacing.

use std::sync::Arc;

use tracing::{error, warn};

use crate::context::Context;
use crate::handler::{BoxedHandler, Middleware, boxed, middleware};
use crate::request::Request;
use crate::respond::respond_error;
use crate::response::ResponseWriter;

/// Answers the client for any error returned from below this layer.
///
/// The error is logged with the trace id, then rendered with
/// [`respond_error`], and the layer reports success to whatever wraps it.
/// Shutdown signals are not client errors and pass through untouched.
pub fn errors() -> Middleware {
    middleware(|next: BoxedHandler| {
        boxed(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let trace_id = ctx.state()?.trace_id().to_owned();

                let err = match next.call(ctx.clone(), w.clone(), req).await {
                    Ok(()) => return Ok(()),
                    Err(err) if err.is_shutdown() => return Err(err),
                    Err(err) => err,
                };

                error!(%trace_id, error = %err, "request failed");

                if w.is_written() {
                    warn!(%trace_id, "handler failed after responding; keeping its response");
                    return Ok(());
                }
                respond_error(&ctx, &w, &err)
            }
        })
    })
}
