//! Dispatch: operation id in, envelope-shaped response out.

use std::sync::Arc;

use accord_core::{AccordError, IdentityContext, RequestContext};
use serde_json::Value;

use crate::registry::OperationRegistry;
use crate::request::RawRequest;

/// A fully rendered response: status plus an envelope-shaped body.
///
/// `body` is `None` only for 204; every other response carries exactly
/// one of the two envelope shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// HTTP status code.
    pub status: u16,
    /// Envelope body, absent for empty responses.
    pub body: Option<Value>,
}

impl DispatchResult {
    /// Renders an error as its envelope, logging internals server-side.
    #[must_use]
    pub fn from_error(error: &AccordError) -> Self {
        Self {
            status: error.status_code().as_u16(),
            body: Some(
                serde_json::to_value(error.to_envelope()).unwrap_or_else(|_| {
                    Value::Object(serde_json::Map::from_iter([(
                        "error".to_string(),
                        Value::String("Internal server error".to_string()),
                    )]))
                }),
            ),
        }
    }
}

/// Executes registered chains and renders every outcome as an envelope.
///
/// Dispatch is total: whatever happens inside the chain, the caller gets
/// a [`DispatchResult`]. Errors become error envelopes here, with the
/// full error logged server-side and only the client-safe message leaving
/// the process.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<OperationRegistry>,
}

impl Dispatcher {
    /// Creates a dispatcher over a finished registry.
    #[must_use]
    pub fn new(registry: Arc<OperationRegistry>) -> Self {
        Self { registry }
    }

    /// The registry backing this dispatcher.
    #[must_use]
    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Runs the chain for `operation_id` and renders the response.
    ///
    /// A contract operation with no registered chain is a wiring defect,
    /// reported as a 500 without leaking which operation was missing.
    pub async fn dispatch(
        &self,
        operation_id: &str,
        ctx: &RequestContext,
        identity: &IdentityContext,
        raw: &RawRequest,
    ) -> DispatchResult {
        let Some(chain) = self.registry.get(operation_id) else {
            tracing::error!(
                operation_id = %operation_id,
                request_id = %ctx.request_id(),
                "no chain registered for contract operation"
            );
            return DispatchResult::from_error(&AccordError::internal(format!(
                "no chain registered for operation `{operation_id}`"
            )));
        };

        match chain.call(ctx, identity, raw).await {
            Ok(result) => result,
            Err(error) => {
                if error.status_code().as_u16() >= 500 {
                    tracing::error!(
                        operation_id = %operation_id,
                        request_id = %ctx.request_id(),
                        error = %error,
                        "operation failed"
                    );
                } else {
                    tracing::debug!(
                        operation_id = %operation_id,
                        request_id = %ctx.request_id(),
                        error = %error,
                        "operation rejected"
                    );
                }
                DispatchResult::from_error(&error)
            }
        }
    }
}
