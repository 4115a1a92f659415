//! Structural request decoding.
//!
//! Handlers sit at the front of a chain and do exactly one job: check the
//! inbound shape against the contract and decode it into the typed
//! request. They never branch on business state and never touch storage,
//! which is why a structural failure is guaranteed not to invoke the
//! service behind it.

use std::marker::PhantomData;
use std::sync::Arc;

use accord_contract::{to_field_errors, Contract};
use accord_core::AccordError;
use serde::de::DeserializeOwned;

use crate::request::RawRequest;

/// Decodes a raw request into the typed request `Req`.
///
/// Failures are always [`AccordError::Validation`]; anything else would
/// mean the handler is doing work that belongs in a service.
pub trait Handler<Req>: Send + Sync + 'static {
    /// Validates and decodes the raw request.
    fn decode(&self, raw: &RawRequest) -> Result<Req, AccordError>;
}

impl<Req, F> Handler<Req> for F
where
    F: Fn(&RawRequest) -> Result<Req, AccordError> + Send + Sync + 'static,
{
    fn decode(&self, raw: &RawRequest) -> Result<Req, AccordError> {
        self(raw)
    }
}

/// The stock handler: validates the body against a named contract schema,
/// then decodes it with serde.
pub struct SchemaHandler<Req> {
    contract: Arc<Contract>,
    schema: String,
    _request: PhantomData<fn() -> Req>,
}

impl<Req> SchemaHandler<Req> {
    /// Creates a handler validating against `schema` from `contract`.
    #[must_use]
    pub fn new(contract: Arc<Contract>, schema: impl Into<String>) -> Self {
        Self {
            contract,
            schema: schema.into(),
            _request: PhantomData,
        }
    }
}

impl<Req> Handler<Req> for SchemaHandler<Req>
where
    Req: DeserializeOwned + Send + Sync + 'static,
{
    fn decode(&self, raw: &RawRequest) -> Result<Req, AccordError> {
        let body = raw
            .body()
            .ok_or_else(|| AccordError::validation("Request body is required"))?;

        if let Err(errors) = self.contract.validate_named(&self.schema, body) {
            return Err(AccordError::validation_with_fields(
                "Validation failed",
                to_field_errors(&errors),
            ));
        }

        // The schema passed, so a decode failure means the binding type
        // drifted from the contract. Surfaced as validation all the same.
        serde_json::from_value(body.clone())
            .map_err(|err| AccordError::validation(format!("Request body not decodable: {err}")))
    }
}
