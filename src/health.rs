//! Built-in health-check handlers.
//!
//! | Probe | Suggested path | Answers |
//! |---|---|---|
//! | **Readiness** | `/readiness` | `{"Status":"OK"}` |
//! | **Liveliness** | `/liveliness` | `{"Status":"up","Host":…}` plus deployment metadata |
//!
//! ```rust,no_run
//! use http::Method;
//! use strata::{App, health, shutdown};
//!
//! let (handle, _listener) = shutdown::channel();
//! let app = App::new(handle, Vec::new())
//!     .handle(Method::GET, "/readiness", health::readiness, &[])
//!     .handle(Method::GET, "/liveliness", health::liveliness, &[]);
//! ```
//!
//! Write your own readiness handler if the service must check its
//! dependencies before taking traffic.

use std::env;

use http::StatusCode;
use serde::Serialize;

use crate::context::Context;
use crate::error::Error;
use crate::request::Request;
use crate::respond::respond;
use crate::response::ResponseWriter;

#[derive(Serialize)]
struct Ready {
    #[serde(rename = "Status")]
    status: &'static str,
}

/// Always `200 {"Status":"OK"}`.
pub async fn readiness(ctx: Context, w: ResponseWriter, _req: Request) -> Result<(), Error> {
    respond(&ctx, &w, &Ready { status: "OK" }, StatusCode::OK)
}

/// Liveliness report. Fields whose environment variable is unset or empty
/// are left out of the body.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Alive {
    #[serde(skip_serializing_if = "String::is_empty")]
    status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    build: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    host: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    application: String,
    #[serde(rename = "DeploymentID", skip_serializing_if = "String::is_empty")]
    deployment_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    env: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    instance: String,
    #[serde(rename = "MemoryMB", skip_serializing_if = "String::is_empty")]
    memory_mb: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    runtime: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    service: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    google_cloud_project: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    port: String,
}

impl Alive {
    fn collect(host: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).unwrap_or_default();
        let host = host
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| "hostname unavailable".to_owned());

        Self {
            status: "up".to_owned(),
            build: var("BUILD"),
            host,
            application: var("GAE_APPLICATION"),
            deployment_id: var("GAE_DEPLOYMENT_ID"),
            env: var("GAE_ENV"),
            instance: var("GAE_INSTANCE"),
            memory_mb: var("GAE_MEMORY_MB"),
            runtime: var("GAE_RUNTIME"),
            service: var("GAE_SERVICE"),
            version: var("GAE_VERSION"),
            google_cloud_project: var("GOOGLE_CLOUD_PROJECT"),
            port: var("PORT"),
        }
    }
}

/// The host name as the OS reports it. `None` if it is not valid UTF-8.
fn host_name() -> Option<String> {
    gethostname::gethostname().into_string().ok()
}

/// Always `200`, reporting `Status: "up"`, the host name and whatever
/// deployment metadata the environment carries.
pub async fn liveliness(ctx: Context, w: ResponseWriter, _req: Request) -> Result<(), Error> {
    let info = Alive::collect(host_name(), |name| env::var(name).ok());
    respond(&ctx, &w, &info, StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;

    use super::*;
    use crate::context::RequestState;

    fn call_ctx() -> (Context, ResponseWriter, Request) {
        let req = http::Request::get("/").body(Bytes::new()).unwrap().into();
        (Context::new(RequestState::new()), ResponseWriter::new(), req)
    }

    #[tokio::test]
    async fn readiness_is_ok() {
        let (ctx, w, req) = call_ctx();
        readiness(ctx, w.clone(), req).await.unwrap();
        let res = w.take().unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(&res.body()[..], br#"{"Status":"OK"}"#);
    }

    #[tokio::test]
    async fn liveliness_is_up() {
        let (ctx, w, req) = call_ctx();
        liveliness(ctx, w.clone(), req).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(w.take().unwrap().body()).unwrap();
        assert_eq!(body["Status"], "up");

        let expected = gethostname::gethostname().into_string().unwrap();
        assert!(!expected.is_empty());
        assert_eq!(body["Host"], expected.as_str());
    }

    #[test]
    fn empty_metadata_is_omitted() {
        let vars = HashMap::from([
            ("GAE_VERSION", "20261018t1200"),
            ("GAE_MEMORY_MB", ""),
            ("PORT", "8080"),
        ]);
        let info = Alive::collect(Some("pod-7f9c".to_owned()), |name| vars.get(name).map(|v| (*v).to_owned()));
        let body = serde_json::to_value(&info).unwrap();

        assert_eq!(
            body,
            serde_json::json!({
                "Status": "up",
                "Host": "pod-7f9c",
                "Version": "20261018t1200",
                "Port": "8080"
            })
        );
    }

    #[test]
    fn unreadable_hostname_has_a_placeholder() {
        let info = Alive::collect(None, |_| None);
        assert_eq!(info.host, "hostname unavailable");
    }
}
