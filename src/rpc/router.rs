//! Request routing: wire method name → dispatcher operation → response.
//!
//! The two-layer result design lives here: an operation failure still
//! yields a protocol-level success whose payload carries `ok: false`, while
//! parse, envelope, unknown-method, params-shape, and panic problems yield
//! protocol-level error envelopes. Callers can therefore distinguish "your
//! request was malformed" from "the tool ran but produced nothing usable".

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{info_span, warn, Instrument};

use crate::config::ConfigStore;
use crate::methods::{Dispatcher, Method};
use crate::rpc::envelope::{parse_request, ParseFailure, Request, Response};
use crate::tool::executor::Outcome;
use crate::Result;

/// Routes protocol requests to method operations.
#[derive(Debug)]
pub struct Router {
    dispatcher: Dispatcher,
}

impl Router {
    /// Create a router over a fresh dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the working directory cannot be determined.
    pub fn new(config: Arc<ConfigStore>) -> Result<Self> {
        Ok(Self {
            dispatcher: Dispatcher::new(config)?,
        })
    }

    /// Create a router over an explicitly constructed dispatcher.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// Wire names of every supported method, in advertisement order.
    #[must_use]
    pub fn supported_methods() -> Vec<&'static str> {
        Method::ALL.iter().map(|m| m.name()).collect()
    }

    /// Decode and dispatch one request line, always producing a response.
    pub async fn handle_line(&self, line: &str) -> Response {
        match parse_request(line) {
            Ok(request) => self.dispatch(request).await,
            Err(ParseFailure::Malformed(detail)) => {
                warn!(%detail, "request line is not valid JSON");
                Response::parse_error(&detail)
            }
            Err(ParseFailure::Invalid { id, reason }) => {
                warn!(%reason, "request envelope is invalid");
                Response::invalid_request(id, &reason)
            }
        }
    }

    /// Dispatch a validated request, wrapping the operation outcome into the
    /// protocol response. Panics in a method handler are caught and mapped
    /// to an internal error so they never escape to the transport.
    pub async fn dispatch(&self, request: Request) -> Response {
        let Request {
            id, method, params, ..
        } = request;

        let Some(method) = Method::from_name(&method) else {
            return Response::method_not_found(id, &method);
        };

        let params = match params {
            None => Value::Object(Map::new()),
            Some(value @ Value::Object(_)) => value,
            Some(_) => return Response::invalid_params(id, "params must be an object"),
        };

        let span = info_span!("dispatch", method = method.name(), id = %id);
        let run = AssertUnwindSafe(self.dispatcher.run(method, params))
            .catch_unwind()
            .instrument(span);

        match run.await {
            Ok(outcome) => Response::success(id, outcome_payload(outcome)),
            Err(_panic) => {
                warn!(method = method.name(), "method handler panicked");
                Response::internal_error(id, "method handler panicked")
            }
        }
    }
}

/// Encode an operation outcome as the `result` payload.
fn outcome_payload(outcome: Outcome) -> Value {
    match outcome {
        Outcome::Success { output } => json!({ "ok": true, "output": output }),
        Outcome::Failure { error } => json!({ "ok": false, "error": error }),
    }
}
