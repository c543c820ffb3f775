//! A small strata service: health checks, one decoded/validated endpoint and
//! a namespaced route.
//!
//! Run with:
//!   RUST_LOG=info YOURSERVICE_WEB_API_HOST=127.0.0.1:3000 cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/readiness
//!   curl http://localhost:3000/liveliness
//!   curl -X POST http://localhost:3000/create -d '{"Value":"hello"}'
//!   curl -X POST http://localhost:3000/create -d '{"Value":""}'
//!   curl 'http://localhost:3000/items/42?ns=acme'

use std::future::Future;
use std::sync::Arc;

use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use strata::middleware::{errors, logger, namespace, panics};
use strata::validate::{Validate, Validator};
use strata::{App, Context, Error, Request, ResponseWriter, Server, ServerConfig, decode, health, respond, shutdown};

// ── Business layer ────────────────────────────────────────────────────────────

/// Third-party dependencies of the service.
trait Store: Send + Sync + 'static {
    fn create(&self) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Stands in for a real database client.
struct PlaceholderDb;

impl Store for PlaceholderDb {
    async fn create(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

struct Service<S> {
    store: S,
}

impl<S: Store> Service<S> {
    async fn create(&self) -> anyhow::Result<()> {
        self.store.create().await
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CreateRequest {
    #[serde(rename = "Value")]
    value: String,
}

impl Validate for CreateRequest {
    fn validate(&self, v: &mut Validator<'_>) {
        v.field("Value", &self.value).required();
    }
}

#[derive(Serialize)]
struct Status {
    #[serde(rename = "Status")]
    status: &'static str,
}

// POST /create
async fn create<S: Store>(
    service: Arc<Service<S>>,
    ctx: Context,
    w: ResponseWriter,
    req: Request,
) -> Result<(), Error> {
    let input: CreateRequest = decode(&req)?;

    let trace_id = ctx.state()?.trace_id().to_owned();
    info!(%trace_id, value = %input.value, "creating");

    service.create().await?;
    respond(&ctx, &w, &Status { status: "Success" }, StatusCode::OK)
}

// GET /items/{id}?ns=...
async fn get_item(ctx: Context, w: ResponseWriter, req: Request) -> Result<(), Error> {
    let id = req.path_param("id")?.to_owned();
    let ns = ctx.namespace().unwrap_or_default().to_owned();
    respond(&ctx, &w, &serde_json::json!({ "ID": id, "Namespace": ns }), StatusCode::OK)
}

fn api<S: Store>(service: Arc<Service<S>>, shutdown: shutdown::ShutdownHandle) -> App {
    App::new(shutdown, vec![logger(), errors(), panics()])
        .handle(Method::GET, "/readiness", health::readiness, &[])
        .handle(Method::GET, "/liveliness", health::liveliness, &[])
        .handle(
            Method::POST,
            "/create",
            move |ctx: Context, w: ResponseWriter, req: Request| create(Arc::clone(&service), ctx, w, req),
            &[],
        )
        .handle(Method::GET, "/items/{id}", get_item, &[namespace(Some("acme"))])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env("YOURSERVICE")?;
    info!(?config, "starting");

    let service = Arc::new(Service { store: PlaceholderDb });
    let (handle, listener) = shutdown::channel();
    let app = api(service, handle);

    Server::from_config(&config).serve(app, listener).await?;

    info!("stopped");
    Ok(())
}
