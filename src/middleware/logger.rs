//! Request logging.

use std::sync::Arc;

use tracing::info;

use crate::context::Context;
use crate::handler::{BoxedHandler, Middleware, boxed, middleware};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Logs a `started` and a `completed` line for every request.
///
/// ```text
/// INFO started   trace_id=3f2a9c1e method=POST path=/create remote=10.0.0.7:51234
/// INFO completed trace_id=3f2a9c1e method=POST path=/create remote=10.0.0.7:51234 status=400 elapsed=1.2ms
/// ```
///
/// `status` is whatever the responder recorded, `0` if nothing responded.
/// The inner result is returned untouched.
pub fn logger() -> Middleware {
    middleware(|next: BoxedHandler| {
        boxed(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let state = ctx.state()?;
                let trace_id = state.trace_id().to_owned();
                let method = req.method().clone();
                let path = req.path().to_owned();
                let remote = req.remote_addr().map(|a| a.to_string()).unwrap_or_default();

                info!(%trace_id, %method, %path, %remote, "started");

                let result = next.call(ctx.clone(), w, req).await;

                let state = ctx.state()?;
                info!(
                    %trace_id, %method, %path, %remote,
                    status = state.status(),
                    elapsed = ?state.elapsed(),
                    "completed"
                );

                result
            }
        })
    })
}
