//! Outgoing HTTP response type and the response sink handlers write into.
//!
//! Handlers never build wire responses themselves; they go through
//! [`respond`](crate::respond) which fills a [`ResponseWriter`]. The
//! dispatcher collects whatever ended up in the writer once the handler
//! chain returns.

use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use http::{HeaderMap, HeaderValue, StatusCode};
use http_body_util::Full;

use crate::error::Error;

pub(crate) const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub(crate) const CORS_ALLOW_ORIGIN: &str = "*";
pub(crate) const CORS_ALLOW_METHODS: &str = "POST, GET, PUT, OPTIONS, DELETE";
pub(crate) const CORS_ALLOW_HEADERS: &str =
    "content-type, authorization, disbursetotalcount, disbursetotalsum, uidx";

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
#[derive(Clone, Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl Response {
    /// Response with no body.
    pub fn status(status: StatusCode) -> Self {
        Self { status, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// A JSON body with the content-type and CORS headers every non-empty
    /// response carries.
    pub fn json(status: StatusCode, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::with_capacity(4);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(CORS_ALLOW_ORIGIN));
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(CORS_ALLOW_METHODS));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(CORS_ALLOW_HEADERS));
        Self { status, headers, body: body.into() }
    }

    /// The bare error envelope for `status`, e.g. `{"Error":"Not Found"}`.
    ///
    /// Used where no request state exists to go through the responder.
    pub(crate) fn envelope(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Unknown Status");
        let body = serde_json::json!({ "Error": reason }).to_string();
        Self::json(status, body)
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseWriter ───────────────────────────────────────────────────────────

/// The sink a handler writes its single response into.
///
/// Clones share the same slot. The first write wins; a second one is an
/// error, so a request can never answer twice.
#[derive(Clone, Debug, Default)]
pub struct ResponseWriter {
    slot: Arc<OnceLock<Response>>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&self, response: Response) -> Result<(), Error> {
        self.slot
            .set(response)
            .map_err(|_| Error::internal("response already written"))
    }

    pub fn is_written(&self) -> bool {
        self.slot.get().is_some()
    }

    /// A look at what was written so far.
    pub fn peek(&self) -> Option<&Response> {
        self.slot.get()
    }

    /// Takes the written response out of the sink.
    pub fn take(self) -> Option<Response> {
        match Arc::try_unwrap(self.slot) {
            Ok(slot) => slot.into_inner(),
            // A clone is still alive somewhere (e.g. a task the handler
            // spawned); fall back to a copy. `Bytes` makes that cheap.
            Err(shared) => shared.get().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_write_is_rejected() {
        let w = ResponseWriter::new();
        w.write(Response::status(StatusCode::NO_CONTENT)).unwrap();
        assert!(w.clone().write(Response::status(StatusCode::OK)).is_err());
        assert_eq!(w.take().unwrap().status_code(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn envelope_uses_canonical_reason() {
        let res = Response::envelope(StatusCode::NOT_FOUND);
        assert_eq!(&res.body()[..], br#"{"Error":"Not Found"}"#);
        assert_eq!(res.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }
}
