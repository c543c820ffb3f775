//! Namespace resolution.

use std::sync::Arc;

use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Middleware, boxed, middleware};
use crate::request::Request;
use crate::response::ResponseWriter;

/// Reserved identifier clients may not use as a namespace.
pub const DEFAULT_NAMESPACE: &str = "__$DEFAULT$__";

/// Resolves the request's namespace from its `ns` parameter and stores it
/// in the context ([`Context::namespace`]).
///
/// With `fixed` set, the application owns the namespace: `ns` may be
/// omitted or must equal it. Without it, `ns` is required. In both cases
/// the reserved [`DEFAULT_NAMESPACE`] is rejected. Rejections are
/// `400 Bad Request`.
///
/// # Panics
///
/// Panics if `fixed` is the reserved [`DEFAULT_NAMESPACE`].
pub fn namespace(fixed: Option<&str>) -> Middleware {
    assert!(
        fixed != Some(DEFAULT_NAMESPACE),
        "the reserved namespace {DEFAULT_NAMESPACE:?} cannot be fixed"
    );
    let fixed: Option<Arc<str>> = fixed.filter(|ns| !ns.is_empty()).map(Arc::from);

    middleware(move |next: BoxedHandler| {
        let fixed = fixed.clone();
        boxed(move |ctx: Context, w: ResponseWriter, req: Request| {
            let next = Arc::clone(&next);
            let fixed = fixed.clone();
            async move {
                let trace_id = ctx.state()?.trace_id().to_owned();
                let ns = resolve(fixed.as_deref(), &req.get_param("ns"))?;
                debug!(%trace_id, namespace = %ns, "namespace resolved");
                next.call(ctx.with_namespace(&ns), w, req).await
            }
        })
    })
}

fn resolve(fixed: Option<&str>, ns: &str) -> Result<String, Error> {
    if (fixed.is_none() && ns.is_empty()) || ns == DEFAULT_NAMESPACE {
        return Err(Error::invalid("namespace cannot be empty or the default identifier"));
    }
    match fixed {
        Some(want) if !ns.is_empty() && ns != want => {
            Err(Error::invalid(format!("namespace must be [{want}], but got [{ns}]")))
        }
        Some(want) => Ok(want.to_owned()),
        None => Ok(ns.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;
    use crate::context::RequestState;
    use crate::handler::wrap_middleware;

    /// Runs `mw` around a handler that records the namespace it saw.
    async fn run(mw: Middleware, uri: &str) -> Result<Option<String>, Error> {
        let seen: Arc<Mutex<Option<String>>> = Arc::default();
        let sink = Arc::clone(&seen);
        let h = boxed(move |ctx: Context, _: ResponseWriter, _: Request| {
            *sink.lock().unwrap() = ctx.namespace().map(str::to_owned);
            async { Ok::<(), Error>(()) }
        });
        let req = http::Request::get(uri).body(Bytes::new()).unwrap().into();
        wrap_middleware(&[mw], h)
            .call(Context::new(RequestState::new()), ResponseWriter::new(), req)
            .await?;
        let ns = seen.lock().unwrap().take();
        Ok(ns)
    }

    #[tokio::test]
    async fn fixed_namespace_matching_request() {
        let ns = run(namespace(Some("acme")), "/items?ns=acme").await.unwrap();
        assert_eq!(ns.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn fixed_namespace_fills_in_missing_ns() {
        let ns = run(namespace(Some("acme")), "/items?ns=").await.unwrap();
        assert_eq!(ns.as_deref(), Some("acme"));
        let ns = run(namespace(Some("acme")), "/items").await.unwrap();
        assert_eq!(ns.as_deref(), Some("acme"));
    }

    #[tokio::test]
    async fn fixed_namespace_mismatch_names_both() {
        let err = run(namespace(Some("acme")), "/items?ns=other").await.unwrap_err();
        assert_eq!(err.as_web().unwrap().status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "namespace must be [acme], but got [other]");
    }

    #[tokio::test]
    async fn open_namespace_requires_ns() {
        let err = run(namespace(None), "/items").await.unwrap_err();
        assert_eq!(err.to_string(), "namespace cannot be empty or the default identifier");

        let ns = run(namespace(None), "/items?ns=tenant-7").await.unwrap();
        assert_eq!(ns.as_deref(), Some("tenant-7"));
    }

    #[tokio::test]
    async fn default_identifier_is_always_rejected() {
        for mw in [namespace(None), namespace(Some("acme"))] {
            let err = run(mw, "/items?ns=__%24DEFAULT%24__").await.unwrap_err();
            assert_eq!(err.as_web().unwrap().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    #[should_panic(expected = "cannot be fixed")]
    fn reserved_namespace_cannot_be_fixed() {
        let _ = namespace(Some(DEFAULT_NAMESPACE));
    }

    #[tokio::test]
    async fn empty_fixed_namespace_means_none() {
        assert!(run(namespace(Some("")), "/items").await.is_err());
    }

    #[tokio::test]
    async fn missing_state_becomes_shutdown() {
        let h = boxed(|_: Context, _: ResponseWriter, _: Request| async { Ok::<(), Error>(()) });
        let req = http::Request::get("/items?ns=acme").body(Bytes::new()).unwrap().into();
        let err = wrap_middleware(&[namespace(Some("acme"))], h)
            .call(Context::detached(), ResponseWriter::new(), req)
            .await
            .unwrap_err();
        assert!(err.is_shutdown());
    }
}
