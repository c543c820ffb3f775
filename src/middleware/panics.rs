//! Panic containment.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};

use futures_util::FutureExt;
use tracing::error;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Middleware, boxed, middleware};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Converts a panic anywhere below this layer into [`Error::Panic`].
///
/// The panic stays inside the request that caused it, and the connection
/// still gets an answer. The backtrace, taken where the panic happened, is
/// logged under the request's trace id.
pub fn panics() -> Middleware {
    install_backtrace_hook();

    middleware(|next: BoxedHandler| {
        boxed(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            async move {
                let trace_id = ctx.state()?.trace_id().to_owned();

                // The inner call is made inside the guarded future so a panic
                // while *building* the future is caught as well.
                let guarded = AssertUnwindSafe(async move { next.call(ctx, w, req).await });

                match guarded.catch_unwind().await {
                    Ok(result) => result,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        let backtrace = PANIC_BACKTRACE
                            .take()
                            .unwrap_or_else(Backtrace::force_capture);
                        error!(%trace_id, panic = %message, backtrace = %backtrace, "handler panicked");
                        Err(Error::Panic(message))
                    }
                }
            }
        })
    })
}

// ── Backtrace capture ─────────────────────────────────────────────────────────

thread_local! {
    /// Backtrace of the most recent panic on this thread. `catch_unwind`
    /// returns on the thread that panicked, after the stack is gone.
    static PANIC_BACKTRACE: Cell<Option<Backtrace>> = const { Cell::new(None) };
}

/// Chains a process panic hook that records the backtrace while the
/// panicking frames are still on the stack. Installed once.
fn install_backtrace_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let _ = PANIC_BACKTRACE.try_with(|slot| slot.set(Some(Backtrace::force_capture())));
            previous(info);
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
