//! # strata
//!
//! A minimal HTTP framework for JSON services: every request runs through an
//! ordered stack of middleware, carries its own trace id, start time and
//! status, and leaves with exactly one well-formed JSON response.
//!
//! ## The contract
//!
//! Handlers return `Result<(), Error>`. What they write with [`respond`]
//! goes to the client; what they return as an error is rendered by the
//! [`errors`](middleware::errors) layer, and only a [`WebError`] ever shows
//! its message to the client. Everything else becomes a plain
//! `500 Internal Server Error`. A shutdown error is different: it means the
//! process can no longer be trusted, so the server stops taking requests
//! and drains.
//!
//! - Routing via [`matchit`], `{name}` path parameters
//! - hyper 1 for HTTP/1.1 and HTTP/2
//! - Strict JSON decoding: unknown fields rejected, strings sanitized,
//!   field rules checked with readable messages
//! - Graceful shutdown on SIGTERM / Ctrl-C / an application signal
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::{Method, StatusCode};
//! use serde::Deserialize;
//! use strata::middleware::{errors, logger, panics};
//! use strata::validate::{Validate, Validator};
//! use strata::{App, Context, Error, Request, ResponseWriter, Server, decode, respond, shutdown};
//!
//! #[derive(Deserialize)]
//! struct NewUser {
//!     #[serde(rename = "Name")]
//!     name: String,
//! }
//!
//! impl Validate for NewUser {
//!     fn validate(&self, v: &mut Validator<'_>) {
//!         v.field("Name", &self.name).required().max_len(64);
//!     }
//! }
//!
//! async fn create_user(ctx: Context, w: ResponseWriter, req: Request) -> Result<(), Error> {
//!     let user: NewUser = decode(&req)?;
//!     respond(&ctx, &w, &serde_json::json!({ "Name": user.name }), StatusCode::CREATED)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let (handle, listener) = shutdown::channel();
//!     let app = App::new(handle, vec![logger(), errors(), panics()])
//!         .handle(Method::POST, "/users", create_user, &[]);
//!
//!     Server::bind("0.0.0.0:3000").serve(app, listener).await
//! }
//! ```

mod app;
mod config;
mod context;
mod decode;
mod error;
mod handler;
mod request;
mod respond;
mod response;
mod router;
mod server;
#[cfg(test)]
mod test_util;

pub mod health;
pub mod middleware;
pub mod shutdown;
pub mod validate;

pub use app::App;
pub use config::ServerConfig;
pub use context::{Context, RequestState};
pub use decode::{decode, decode_with_locale};
pub use error::{BoxError, Error, FieldError, WebError};
pub use handler::{BoxFuture, BoxedHandler, ErasedHandler, Handler, Middleware, boxed, wrap_middleware};
pub use request::Request;
pub use respond::{respond, respond_error};
pub use response::{Response, ResponseWriter};
pub use server::Server;
