//! The Accord HTTP server.
//!
//! Hosts the full request flow: built-in probes, contract resolution,
//! the identity gate, bounded body collection, pipeline dispatch, and
//! envelope rendering. One hyper HTTP/1.1 connection task per client,
//! drained gracefully on shutdown.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use serde_json::Value;
use tokio::net::TcpListener;

use accord_config::AccordConfig;
use accord_contract::{AuthRequirement, Contract};
use accord_core::{AccordError, IdentityContext, RequestContext};
use accord_identity::IdentityGate;
use accord_pipeline::{DispatchResult, Dispatcher, OperationRegistry, RawRequest};
use accord_store::StorePool;
use accord_telemetry::metrics::{record_auth_rejection, record_request};
use accord_telemetry::InFlightGuard;

use crate::error::ServerError;
use crate::health::{HealthCheck, ReadinessCheck};
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Response body type produced by the server.
pub type ResponseBody = Full<Bytes>;

/// Full HTTP response type produced by the server.
pub type HttpResponse = Response<ResponseBody>;

/// The Accord HTTP server.
///
/// Built from configuration plus the four runtime components: the
/// contract (routing and auth requirements), the identity gate, the
/// operation registry (dispatch targets), and the store pool.
///
/// # Example
///
/// ```rust,ignore
/// let server = Server::builder()
///     .config(config)
///     .contract(contract)
///     .identity_gate(gate)
///     .registry(registry)
///     .store_pool(pool)
///     .build()?;
///
/// server.run().await?;
/// ```
pub struct Server {
    config: AccordConfig,
    contract: Arc<Contract>,
    gate: IdentityGate,
    dispatcher: Dispatcher,
    pool: Arc<StorePool>,
    health: HealthCheck,
    readiness: ReadinessCheck,
}

impl Server {
    /// Creates a new server builder.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// Returns the contract this server routes by.
    #[must_use]
    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Returns the store pool shared with services.
    #[must_use]
    pub fn store_pool(&self) -> &Arc<StorePool> {
        &self.pool
    }

    /// Returns the readiness probe handle.
    #[must_use]
    pub fn readiness(&self) -> &ReadinessCheck {
        &self.readiness
    }

    /// Returns the per-request deadline.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.server.request_timeout_ms)
    }

    /// Runs the server until SIGTERM or SIGINT.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configured address cannot be
    /// bound.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server until the given signal triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configured address cannot be
    /// parsed or bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr: SocketAddr = self
            .config
            .server
            .http_addr
            .parse()
            .map_err(|e| ServerError::Bind(format!("invalid address '{}': {e}", self.config.server.http_addr)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("failed to bind {addr}: {e}")))?;

        self.serve_on(listener, shutdown).await
    }

    /// Serves connections from an already-bound listener.
    ///
    /// Integration tests bind port 0 themselves and pass the listener in.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] on listener I/O failures.
    pub async fn serve_on(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(%addr, service = %self.health.service(), "server listening");

        let server = Arc::new(self);
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, remote_addr)) => {
                            let server = Arc::clone(&server);
                            let token = tracker.acquire();
                            let conn_shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(e) =
                                    server.handle_connection(stream, remote_addr, conn_shutdown).await
                                {
                                    tracing::debug!(%remote_addr, error = %e, "connection error");
                                }
                                drop(token);
                            });
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        // Drain: stop advertising readiness, then wait for in-flight work.
        server.readiness.set_ready(false);
        let drain_timeout = Duration::from_secs(server.config.server.shutdown_timeout_secs);
        tracing::info!(
            active = tracker.active_connections(),
            timeout_secs = drain_timeout.as_secs(),
            "draining connections"
        );

        tokio::select! {
            _ = tracker.drained() => {
                tracing::info!("all connections closed");
            }
            _ = tokio::time::sleep(drain_timeout) => {
                tracing::warn!(
                    active = tracker.active_connections(),
                    "drain timeout reached with connections still active"
                );
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        remote_addr: SocketAddr,
        shutdown: ShutdownSignal,
    ) -> Result<(), hyper::Error> {
        let io = TokioIo::new(stream);
        let server = Arc::clone(self);

        let service = service_fn(move |req: Request<Incoming>| {
            let server = Arc::clone(&server);
            async move { server.handle_request(req).await }
        });

        let conn = http1::Builder::new().serve_connection(io, service);

        tokio::select! {
            result = conn => result,
            _ = shutdown.recv() => {
                tracing::debug!(%remote_addr, "connection closed by shutdown");
                Ok(())
            }
        }
    }

    async fn handle_request(
        self: &Arc<Self>,
        req: Request<Incoming>,
    ) -> Result<HttpResponse, Infallible> {
        let _in_flight = InFlightGuard::new();
        let started = Instant::now();

        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match (method.as_str(), path.as_str()) {
            ("GET", "/health") => return Ok(self.handle_health()),
            ("GET", "/ready") => return Ok(self.handle_ready()),
            _ => {}
        }

        let Some(resolved) = self.contract.resolve(&method, &path) else {
            return Ok(render(&DispatchResult::from_error(&AccordError::not_found(
                "Not found",
            ))));
        };

        let operation_id = resolved.endpoint.operation_id().to_string();
        let path_params = resolved.path_params;
        let auth = resolved.endpoint.auth().clone();
        let ctx = RequestContext::new().with_operation_id(&operation_id);

        let auth_header = req
            .headers()
            .get(http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let query_pairs = parse_query(req.uri().query());

        let identity = match self
            .resolve_identity(&auth, auth_header.as_deref(), &ctx)
            .await
        {
            Ok(identity) => identity,
            Err(result) => {
                self.finish(&ctx, &operation_id, &result, started);
                return Ok(render(&result));
            }
        };

        let body = match self.collect_body(req).await {
            Ok(body) => body,
            Err(result) => {
                self.finish(&ctx, &operation_id, &result, started);
                return Ok(render(&result));
            }
        };

        let mut raw = RawRequest::new().with_path_params(path_params);
        for (name, value) in query_pairs {
            raw = raw.with_query(name, value);
        }
        if let Some(body) = body {
            raw = raw.with_body(body);
        }

        let result = match tokio::time::timeout(
            self.request_timeout(),
            self.dispatcher.dispatch(&operation_id, &ctx, &identity, &raw),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id(),
                    operation_id = %operation_id,
                    "dispatch timed out"
                );
                DispatchResult::from_error(&AccordError::timeout("dispatch deadline exceeded"))
            }
        };

        self.finish(&ctx, &operation_id, &result, started);
        Ok(render(&result))
    }

    /// Applies the endpoint's auth requirement, producing either an
    /// identity or a ready-to-render rejection.
    async fn resolve_identity(
        &self,
        auth: &AuthRequirement,
        auth_header: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<IdentityContext, DispatchResult> {
        match auth {
            AuthRequirement::Public => Ok(IdentityContext::anonymous()),
            AuthRequirement::Authenticated => {
                self.gate.resolve(auth_header).await.map_err(|e| {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        error = %e,
                        "identity rejected"
                    );
                    record_auth_rejection("unauthenticated");
                    DispatchResult::from_error(&AccordError::from(e))
                })
            }
            AuthRequirement::Roles { roles } => {
                let identity = self.gate.resolve(auth_header).await.map_err(|e| {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        error = %e,
                        "identity rejected"
                    );
                    record_auth_rejection("unauthenticated");
                    DispatchResult::from_error(&AccordError::from(e))
                })?;

                let accepted: Vec<&str> = roles.iter().map(String::as_str).collect();
                if identity.has_any_role(&accepted) {
                    Ok(identity)
                } else {
                    tracing::debug!(
                        request_id = %ctx.request_id(),
                        subject = %identity.log_id(),
                        "role requirement not met"
                    );
                    record_auth_rejection("forbidden");
                    Err(DispatchResult::from_error(&AccordError::forbidden()))
                }
            }
        }
    }

    /// Collects the request body under the size limit and deadline.
    async fn collect_body(
        &self,
        req: Request<Incoming>,
    ) -> Result<Option<Value>, DispatchResult> {
        let limited = Limited::new(req.into_body(), self.config.server.max_body_bytes);

        let bytes = match tokio::time::timeout(self.request_timeout(), limited.collect()).await {
            Ok(Ok(collected)) => collected.to_bytes(),
            Ok(Err(_)) => {
                return Err(DispatchResult::from_error(&AccordError::validation(
                    "Failed to read request body",
                )));
            }
            Err(_) => {
                return Err(DispatchResult::from_error(&AccordError::timeout(
                    "body collection deadline exceeded",
                )));
            }
        };

        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(|_| {
            DispatchResult::from_error(&AccordError::validation(
                "Request body must be valid JSON",
            ))
        })
    }

    /// Records the per-request log line and metrics.
    fn finish(
        &self,
        ctx: &RequestContext,
        operation_id: &str,
        result: &DispatchResult,
        started: Instant,
    ) {
        let elapsed = started.elapsed();
        record_request(operation_id, result.status, elapsed);
        tracing::info!(
            request_id = %ctx.request_id(),
            operation_id = %operation_id,
            http.status_code = result.status,
            duration_ms = elapsed.as_millis() as u64,
            "request completed"
        );
    }

    fn handle_health(&self) -> HttpResponse {
        let status = self.health.status();
        let body = serde_json::to_string(&status)
            .unwrap_or_else(|_| r#"{"status":"healthy"}"#.to_string());
        json_response(StatusCode::OK, body)
    }

    fn handle_ready(&self) -> HttpResponse {
        let status = self.readiness.status();
        let code = if status.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        let body = serde_json::to_string(&status)
            .unwrap_or_else(|_| format!(r#"{{"ready":{}}}"#, status.is_ready()));
        json_response(code, body)
    }
}

/// Renders a dispatch result as an HTTP response.
fn render(result: &DispatchResult) -> HttpResponse {
    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    match &result.body {
        Some(body) => json_response(status, body.to_string()),
        None => Response::builder()
            .status(status)
            .body(Full::new(Bytes::new()))
            .unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))),
    }
}

fn json_response(status: StatusCode, body: String) -> HttpResponse {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new())))
}

/// Splits a raw query string into name/value pairs.
///
/// Values keep their raw encoding; operations that need decoding handle
/// it in their own Handler.
fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    let Some(query) = query else {
        return Vec::new();
    };
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (pair.to_string(), String::new()),
        })
        .collect()
}

/// Builder for [`Server`].
#[derive(Default)]
pub struct ServerBuilder {
    config: Option<AccordConfig>,
    contract: Option<Contract>,
    gate: Option<IdentityGate>,
    registry: Option<OperationRegistry>,
    pool: Option<Arc<StorePool>>,
}

impl ServerBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the service configuration.
    #[must_use]
    pub fn config(mut self, config: AccordConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the contract to route by.
    #[must_use]
    pub fn contract(mut self, contract: Contract) -> Self {
        self.contract = Some(contract);
        self
    }

    /// Sets the identity gate.
    #[must_use]
    pub fn identity_gate(mut self, gate: IdentityGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sets the operation registry.
    #[must_use]
    pub fn registry(mut self, registry: OperationRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the store pool shared with services.
    #[must_use]
    pub fn store_pool(mut self, pool: Arc<StorePool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Builds the server.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::MissingComponent`] when the contract, gate,
    /// registry, or store pool was not supplied.
    pub fn build(self) -> Result<Server, ServerError> {
        let config = self.config.unwrap_or_default();
        let contract = self
            .contract
            .ok_or(ServerError::MissingComponent("contract"))?;
        let gate = self
            .gate
            .ok_or(ServerError::MissingComponent("identity gate"))?;
        let registry = self
            .registry
            .ok_or(ServerError::MissingComponent("operation registry"))?;
        let pool = self
            .pool
            .ok_or(ServerError::MissingComponent("store pool"))?;

        let health = HealthCheck::new(
            config.telemetry.service_name.clone(),
            env!("CARGO_PKG_VERSION"),
        );

        Ok(Server {
            config,
            contract: Arc::new(contract),
            gate,
            dispatcher: Dispatcher::new(Arc::new(registry)),
            pool,
            health,
            readiness: ReadinessCheck::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_pairs() {
        let pairs = parse_query(Some("page=2&limit=10&flag"));
        assert_eq!(
            pairs,
            vec![
                ("page".to_string(), "2".to_string()),
                ("limit".to_string(), "10".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn test_parse_query_absent() {
        assert!(parse_query(None).is_empty());
    }

    #[test]
    fn test_render_with_body() {
        let result = DispatchResult {
            status: 201,
            body: Some(serde_json::json!({"data": {"id": "n-1"}})),
        };
        let response = render(&result);
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_render_without_body() {
        let result = DispatchResult {
            status: 204,
            body: None,
        };
        let response = render(&result);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn test_builder_requires_components() {
        let err = Server::builder().build().err();
        assert!(matches!(err, Some(ServerError::MissingComponent("contract"))));
    }
}
