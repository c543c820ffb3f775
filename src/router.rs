//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. Path matching is
//! entirely [`matchit`]'s job; this module only keys trees by method and
//! copies captured parameters out.

use std::collections::HashMap;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::handler::BoxedHandler;

/// Result of resolving a method + path pair.
pub(crate) enum Route {
    Found(BoxedHandler, HashMap<String, String>),
    /// The path exists, but not for this method.
    MethodNotAllowed,
    NotFound,
}

#[derive(Default)]
pub(crate) struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    /// # Panics
    ///
    /// Panics if `path` is not valid `matchit` syntax or conflicts with a
    /// route already registered for `method`.
    pub(crate) fn insert(&mut self, method: Method, path: &str, handler: BoxedHandler) {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Route {
        if let Some(matched) = self.routes.get(method).and_then(|tree| tree.at(path).ok()) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Route::Found(Arc::clone(matched.value), params);
        }

        let elsewhere = self.routes.iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok());
        if elsewhere { Route::MethodNotAllowed } else { Route::NotFound }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::error::Error;
    use crate::handler::boxed;
    use crate::request::Request;
    use crate::response::ResponseWriter;

    fn noop() -> BoxedHandler {
        boxed(|_: Context, _: ResponseWriter, _: Request| async { Ok::<(), Error>(()) })
    }

    #[test]
    fn captures_params() {
        let mut router = Router::default();
        router.insert(Method::GET, "/ns/{ns}/items/{id}", noop());

        let Route::Found(_, params) = router.lookup(&Method::GET, "/ns/acme/items/7") else {
            panic!("route should match");
        };
        assert_eq!(params["ns"], "acme");
        assert_eq!(params["id"], "7");
    }

    #[test]
    fn distinguishes_wrong_method_from_unknown_path() {
        let mut router = Router::default();
        router.insert(Method::POST, "/create", noop());

        assert!(matches!(router.lookup(&Method::GET, "/create"), Route::MethodNotAllowed));
        assert!(matches!(router.lookup(&Method::GET, "/missing"), Route::NotFound));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let mut router = Router::default();
        router.insert(Method::GET, "/readiness", noop());
        router.insert(Method::GET, "/readiness", noop());
    }
}
