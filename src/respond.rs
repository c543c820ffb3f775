//! The responder: turns values and errors into wire responses.

use http::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::context::Context;
use crate::error::{Error, FieldError};
use crate::response::{Response, ResponseWriter};

/// The error envelope clients receive.
#[derive(Serialize)]
struct ErrorResponse<'a> {
    #[serde(rename = "Error")]
    error: String,
    #[serde(rename = "Fields", skip_serializing_if = "no_fields")]
    fields: &'a [FieldError],
}

fn no_fields(fields: &&[FieldError]) -> bool {
    fields.is_empty()
}

/// Serializes `value` as JSON and writes it with `status`.
///
/// Once the response is written its status is recorded into the request
/// state so the logger can report it. `204 No Content` writes no body at
/// all. A serialization failure is returned as-is, before anything is
/// written.
pub fn respond<T>(ctx: &Context, w: &ResponseWriter, value: &T, status: StatusCode) -> Result<(), Error>
where
    T: Serialize + ?Sized,
{
    let state = ctx.state()?;

    let response = if status == StatusCode::NO_CONTENT {
        Response::status(status)
    } else {
        let body = serde_json::to_vec(value)?;
        debug!(trace_id = state.trace_id(), status = status.as_u16(), bytes = body.len(), "responding");
        Response::json(status, body)
    };

    // Only the response the client actually gets may set the logged status.
    w.write(response)?;
    state.set_status(status);
    Ok(())
}

/// Sends `err` back to the client.
///
/// A [`WebError`](crate::WebError) at the root answers with its own status,
/// message and fields. Anything else becomes a bare `500`; internal error
/// text never reaches the wire.
pub fn respond_error(ctx: &Context, w: &ResponseWriter, err: &Error) -> Result<(), Error> {
    if let Some(web) = err.as_web() {
        let body = ErrorResponse { error: web.to_string(), fields: web.fields() };
        return respond(ctx, w, &body, web.status());
    }

    let status = StatusCode::INTERNAL_SERVER_ERROR;
    let body = ErrorResponse {
        error: status.canonical_reason().unwrap_or("Internal Server Error").to_owned(),
        fields: &[],
    };
    respond(ctx, w, &body, status)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use http::header::{ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};

    use super::*;
    use crate::context::RequestState;

    fn seeded() -> (Context, ResponseWriter) {
        (Context::new(RequestState::new()), ResponseWriter::new())
    }

    #[test]
    fn writes_json_with_headers_and_records_status() {
        let (ctx, w) = seeded();
        let body = BTreeMap::from([("Status", "Success")]);
        respond(&ctx, &w, &body, StatusCode::CREATED).unwrap();

        assert_eq!(ctx.state().unwrap().status(), 201);
        let res = w.take().unwrap();
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(&res.body()[..], br#"{"Status":"Success"}"#);
        assert_eq!(res.headers()[CONTENT_TYPE], "application/json; charset=utf-8");
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_METHODS], "POST, GET, PUT, OPTIONS, DELETE");
    }

    #[test]
    fn no_content_has_no_body_or_headers() {
        let (ctx, w) = seeded();
        respond(&ctx, &w, &(), StatusCode::NO_CONTENT).unwrap();
        let res = w.take().unwrap();
        assert!(res.body().is_empty());
        assert!(res.headers().is_empty());
    }

    #[test]
    fn missing_state_is_a_shutdown() {
        let w = ResponseWriter::new();
        let err = respond(&Context::detached(), &w, &"x", StatusCode::OK).unwrap_err();
        assert!(err.is_shutdown());
        assert!(!w.is_written());
    }

    #[test]
    fn second_response_does_not_overwrite_recorded_status() {
        let (ctx, w) = seeded();
        respond(&ctx, &w, &"first", StatusCode::CREATED).unwrap();
        assert!(respond(&ctx, &w, &"second", StatusCode::BAD_REQUEST).is_err());

        assert_eq!(ctx.state().unwrap().status(), 201);
        assert_eq!(w.take().unwrap().status_code(), StatusCode::CREATED);
    }

    #[test]
    fn marshal_failure_propagates_untouched() {
        // Maps with non-string keys cannot become JSON objects.
        let (ctx, w) = seeded();
        let value = BTreeMap::from([((1, 2), "pair")]);
        let err = respond(&ctx, &w, &value, StatusCode::OK).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
        assert!(!w.is_written());
        assert_eq!(ctx.state().unwrap().status(), 0);
    }

    #[test]
    fn web_error_body_has_message_and_fields() {
        let (ctx, w) = seeded();
        let err = Error::Web(
            crate::error::WebError::new("order rejected", StatusCode::UNPROCESSABLE_ENTITY)
                .with_fields(vec![FieldError::new("qty", "qty must be positive")]),
        );
        respond_error(&ctx, &w, &err).unwrap();

        let res = w.take().unwrap();
        assert_eq!(res.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            &res.body()[..],
            br#"{"Error":"order rejected","Fields":[{"Field":"qty","Error":"qty must be positive"}]}"#
        );
    }

    #[test]
    fn empty_fields_are_omitted() {
        let (ctx, w) = seeded();
        respond_error(&ctx, &w, &Error::invalid("bad ns").context("namespace")).unwrap();
        let res = w.take().unwrap();
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(&res.body()[..], br#"{"Error":"bad ns"}"#);
    }

    #[test]
    fn internal_error_text_never_leaks() {
        let (ctx, w) = seeded();
        let err = Error::internal("password=hunter2 rejected by db");
        respond_error(&ctx, &w, &err).unwrap();

        let res = w.take().unwrap();
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&res.body()[..], br#"{"Error":"Internal Server Error"}"#);
        assert!(!String::from_utf8_lossy(res.body()).contains("hunter2"));
    }
}
