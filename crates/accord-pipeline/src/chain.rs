//! Chains: one handler + service + mapper per operation.

use accord_core::{
    AccordError, DataEnvelope, IdentityContext, PagedEnvelope, Pagination, RequestContext,
};
use serde::Serialize;

use crate::dispatcher::DispatchResult;
use crate::handler::Handler;
use crate::mapper::Mapper;
use crate::request::RawRequest;
use crate::service::{Service, ServiceFuture, ServiceOutput};

/// The pipeline for one contract operation.
///
/// A chain owns exactly one handler, one service, and one mapper, wired
/// to one operation id. Cross-domain work happens service-to-service; a
/// chain is never invoked by another chain.
pub struct Chain<Req, E, Res> {
    operation_id: String,
    handler: Box<dyn Handler<Req>>,
    service: Box<dyn Service<Req, E>>,
    mapper: Box<dyn Mapper<E, Res>>,
}

impl<Req, E, Res> Chain<Req, E, Res>
where
    Req: Send + 'static,
    E: Send + Sync + 'static,
    Res: Serialize + Send + 'static,
{
    /// Wires a handler, service, and mapper to an operation id.
    #[must_use]
    pub fn new(
        operation_id: impl Into<String>,
        handler: impl Handler<Req>,
        service: impl Service<Req, E>,
        mapper: impl Mapper<E, Res>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            handler: Box::new(handler),
            service: Box::new(service),
            mapper: Box::new(mapper),
        }
    }

    /// The operation this chain serves.
    #[must_use]
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }
}

/// Object-safe view of a chain, for the registry.
pub(crate) trait ErasedChain: Send + Sync {
    fn operation_id(&self) -> &str;

    /// Runs decode, execute, and map, rendering the success envelope.
    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        identity: &'a IdentityContext,
        raw: &'a RawRequest,
    ) -> ServiceFuture<'a, DispatchResult>;
}

impl<Req, E, Res> ErasedChain for Chain<Req, E, Res>
where
    Req: Send + 'static,
    E: Send + Sync + 'static,
    Res: Serialize + Send + 'static,
{
    fn operation_id(&self) -> &str {
        &self.operation_id
    }

    fn call<'a>(
        &'a self,
        ctx: &'a RequestContext,
        identity: &'a IdentityContext,
        raw: &'a RawRequest,
    ) -> ServiceFuture<'a, DispatchResult> {
        Box::pin(async move {
            // Structural failure returns here, before the service runs.
            let req = self.handler.decode(raw)?;
            let output = self.service.execute(ctx, identity, req).await?;

            let status = output.status();
            let body = match output {
                ServiceOutput::One(entity) | ServiceOutput::Created(entity) => {
                    Some(render(DataEnvelope::new(self.mapper.map(&entity)))?)
                }
                ServiceOutput::Many {
                    items,
                    page,
                    limit,
                    total,
                } => {
                    let data: Vec<Res> = items.iter().map(|e| self.mapper.map(e)).collect();
                    Some(render(PagedEnvelope::new(
                        data,
                        Pagination::new(page, limit, total),
                    ))?)
                }
                ServiceOutput::Deleted => None,
            };
            Ok(DispatchResult { status, body })
        })
    }
}

fn render<T: Serialize>(envelope: T) -> Result<serde_json::Value, AccordError> {
    serde_json::to_value(envelope)
        .map_err(|err| AccordError::internal_with_source("response serialization failed", err))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct EchoService;

    impl Service<String, String> for EchoService {
        fn execute<'a>(
            &'a self,
            _ctx: &'a RequestContext,
            _identity: &'a IdentityContext,
            req: String,
        ) -> ServiceFuture<'a, ServiceOutput<String>> {
            Box::pin(async move { Ok(ServiceOutput::One(req)) })
        }
    }

    fn id_handler(raw: &RawRequest) -> Result<String, AccordError> {
        raw.path_param("id")
            .map(ToString::to_string)
            .ok_or_else(|| AccordError::validation("missing id"))
    }

    #[tokio::test]
    async fn test_chain_renders_data_envelope() {
        let chain = Chain::new(
            "getNote",
            id_handler,
            EchoService,
            |id: &String| json!({"id": id}),
        );
        let ctx = RequestContext::new();
        let raw = RawRequest::new().with_path_param("id", "n1");

        let result = chain
            .call(&ctx, &IdentityContext::anonymous(), &raw)
            .await
            .unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body.unwrap(), json!({"data": {"id": "n1"}}));
    }

    #[tokio::test]
    async fn test_decode_failure_skips_service() {
        let chain = Chain::new(
            "getNote",
            id_handler,
            EchoService,
            |id: &String| json!({"id": id}),
        );
        let ctx = RequestContext::new();

        let err = chain
            .call(&ctx, &IdentityContext::anonymous(), &RawRequest::new())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_deleted_output_has_no_body() {
        struct DeleteService;
        impl Service<String, String> for DeleteService {
            fn execute<'a>(
                &'a self,
                _ctx: &'a RequestContext,
                _identity: &'a IdentityContext,
                _req: String,
            ) -> ServiceFuture<'a, ServiceOutput<String>> {
                Box::pin(async move { Ok(ServiceOutput::Deleted) })
            }
        }

        let chain = Chain::new("deleteNote", id_handler, DeleteService, |id: &String| {
            json!({"id": id})
        });
        let ctx = RequestContext::new();
        let raw = RawRequest::new().with_path_param("id", "n1");

        let result = chain
            .call(&ctx, &IdentityContext::anonymous(), &raw)
            .await
            .unwrap();
        assert_eq!(result.status, 204);
        assert!(result.body.is_none());
    }

    #[tokio::test]
    async fn test_many_output_paginates() {
        struct ListService;
        impl Service<String, String> for ListService {
            fn execute<'a>(
                &'a self,
                _ctx: &'a RequestContext,
                _identity: &'a IdentityContext,
                _req: String,
            ) -> ServiceFuture<'a, ServiceOutput<String>> {
                Box::pin(async move {
                    Ok(ServiceOutput::Many {
                        items: vec!["a".to_string(), "b".to_string()],
                        page: 1,
                        limit: 10,
                        total: 12,
                    })
                })
            }
        }

        let chain = Chain::new("listNotes", id_handler, ListService, |id: &String| {
            json!(id)
        });
        let ctx = RequestContext::new();
        let raw = RawRequest::new().with_path_param("id", "any");

        let result = chain
            .call(&ctx, &IdentityContext::anonymous(), &raw)
            .await
            .unwrap();
        assert_eq!(result.status, 200);
        let body = result.body.unwrap();
        assert_eq!(body["data"], json!(["a", "b"]));
        assert_eq!(body["pagination"]["totalPages"], 2);
    }
}
