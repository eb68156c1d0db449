//! Router builder for the bookshelf HTTP server

use axum::{
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{header, uri::PathAndQuery, HeaderValue, Method, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    BoxError, Router,
};
use std::any::Any;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tower::{
    limit::GlobalConcurrencyLimitLayer, timeout::error::Elapsed, timeout::TimeoutLayer,
    util::MapRequestLayer, ServiceBuilder,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    normalize_path::NormalizePathLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use uuid::{Timestamp, Uuid};

use bookshelf_kernel::ModuleRegistry;

use crate::error::AppError;
use crate::rate_limit::{self, ClientRateLimiter};

/// Prefix under which every module router is nested
pub const API_PREFIX: &str = "/api";

/// Builder for constructing the main HTTP router.
///
/// Layers wrap only the routes registered before them, so add routes and
/// modules first, then the middleware from innermost to outermost. Path
/// cleanup is applied by [`RouterBuilder::build`] ahead of routing.
pub struct RouterBuilder {
    router: Router,
    // Swagger UI redirects `/swagger-ui` to `/swagger-ui/`, so it is served
    // outside path cleanup.
    docs_ui: Router,
}

impl RouterBuilder {
    /// Create a new router builder
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            docs_ui: Router::new(),
        }
    }

    /// Add a route to the router
    pub fn route(mut self, path: &str, route: axum::routing::MethodRouter) -> Self {
        self.router = self.router.route(path, route);
        self
    }

    /// Mount a module's router under `/api/{module_name}`
    pub fn mount_module(mut self, module_name: &str, module_router: Router) -> Self {
        let api_path = format!("{}/{}", API_PREFIX, module_name);
        self.router = self.router.nest(&api_path, module_router);
        self
    }

    /// Add `GET /api/alive` heartbeat answering a plain `.`
    pub fn with_heartbeat(self) -> Self {
        self.route(&format!("{}/alive", API_PREFIX), get(|| async { "." }))
    }

    /// Turn handler panics into a 500 error envelope
    pub fn with_panic_recovery(mut self) -> Self {
        self.router = self.router.layer(CatchPanicLayer::custom(panic_response));
        self
    }

    /// Cap the requests handled at once across every route; the rest wait
    pub fn with_concurrency_limit(mut self, max_in_flight: usize) -> Self {
        self.router = self
            .router
            .layer(GlobalConcurrencyLimitLayer::new(max_in_flight));
        self
    }

    /// Answer 429 once a client IP exceeds `requests_per_minute`
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        let limiter = Arc::new(ClientRateLimiter::per_minute(requests_per_minute));
        self.router = self.router.layer(middleware::from_fn_with_state(
            limiter,
            rate_limit::limit_by_client_ip,
        ));
        self
    }

    /// Add tracing middleware
    pub fn with_tracing(mut self) -> Self {
        self.router = self.router.layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_request(DefaultOnRequest::new().level(tracing::Level::INFO))
                .on_response(DefaultOnResponse::new().level(tracing::Level::INFO)),
        );
        self
    }

    /// Add CORS middleware
    pub fn with_cors(mut self) -> Self {
        self.router = self.router.layer(
            CorsLayer::new()
                .allow_origin(AnyOrigin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .max_age(Duration::from_secs(12 * 60 * 60)),
        );
        self
    }

    /// Add request ID middleware: a UUID v7 `x-request-id` is assigned when
    /// missing and echoed on the response
    pub fn with_request_id(mut self) -> Self {
        self.router = self
            .router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7));
        self
    }

    /// Answer 504 when a request runs longer than `timeout_ms`
    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.router = self.router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(timeout_response))
                .layer(TimeoutLayer::new(Duration::from_millis(timeout_ms))),
        );
        self
    }

    /// Add OpenAPI documentation by collecting specs from all modules
    pub fn with_openapi(mut self, registry: &ModuleRegistry) -> Self {
        let openapi_spec = merge_openapi(registry);

        // Swagger UI needs a typed document; fall back to an empty one if a
        // module fragment does not deserialize.
        let openapi_obj: utoipa::openapi::OpenApi = serde_json::from_value(openapi_spec.clone())
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "merged OpenAPI document is not valid; serving an empty one");
                utoipa::openapi::OpenApiBuilder::new()
                    .info(
                        utoipa::openapi::InfoBuilder::new()
                            .title("bookshelf API")
                            .version("1.0.0")
                            .build(),
                    )
                    .build()
            });

        self.docs_ui = self.docs_ui.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi_obj),
        );

        // Raw JSON document for external consumers
        self.router = self.router.route(
            "/docs/openapi.json",
            get(move || async move { axum::Json(openapi_spec.clone()) }),
        );

        self
    }

    /// Build the final router. Repeated slashes, dot segments and a trailing
    /// slash are removed from the path before routing.
    pub fn build(self) -> Router {
        let normalized = ServiceBuilder::new()
            .layer(MapRequestLayer::new(clean_request_path))
            .layer(NormalizePathLayer::trim_trailing_slash())
            .service(self.router);
        self.docs_ui.fallback_service(normalized)
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Merge every module's OpenAPI fragment into one document, prefixing each
/// module path with `/api/{module_name}`.
pub fn merge_openapi(registry: &ModuleRegistry) -> serde_json::Value {
    let mut openapi_spec = serde_json::json!({
        "openapi": "3.1.0",
        "info": {
            "title": "bookshelf API",
            "version": "1.0.0",
            "description": "Books and authors REST API"
        },
        "servers": [{ "url": "/" }],
        "paths": {},
        "components": {
            "schemas": {}
        }
    });

    openapi_spec["components"]["schemas"]["ErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string", "example": "error" },
            "message": { "type": "string", "example": "An error occurred" }
        },
        "required": ["status", "message"]
    });

    openapi_spec["components"]["schemas"]["ValidationErrorResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string", "example": "error" },
            "message": { "type": "string", "example": "Validation failed" },
            "errors": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "field": { "type": "string", "example": "Name" },
                        "message": { "type": "string", "example": "Name is required" }
                    },
                    "required": ["field", "message"]
                }
            }
        },
        "required": ["status", "message", "errors"]
    });

    openapi_spec["components"]["schemas"]["SuccessResponse"] = serde_json::json!({
        "type": "object",
        "properties": {
            "status": { "type": "string", "example": "success" },
            "message": { "type": "string", "example": "Operation completed successfully" }
        },
        "required": ["status", "message"]
    });

    openapi_spec["paths"]["/healthz"] = serde_json::json!({
        "get": {
            "summary": "Health check",
            "responses": {
                "200": {
                    "description": "OK",
                    "content": { "text/plain": { "schema": { "type": "string" } } }
                }
            }
        }
    });

    for module in registry.modules() {
        let Some(module_spec) = module.openapi() else {
            continue;
        };

        if let Some(paths) = module_spec.get("paths").and_then(|paths| paths.as_object()) {
            for (path, path_item) in paths {
                let base = format!("{}/{}", API_PREFIX, module.name());
                let prefixed_path = if path == "/" {
                    base
                } else {
                    format!("{}{}", base, path)
                };
                openapi_spec["paths"][prefixed_path] = path_item.clone();
            }
        }

        if let Some(schemas) = module_spec
            .get("components")
            .and_then(|components| components.get("schemas"))
            .and_then(|schemas| schemas.as_object())
        {
            for (schema_name, schema_def) in schemas {
                openapi_spec["components"]["schemas"][schema_name] = schema_def.clone();
            }
        }
    }

    openapi_spec
}

async fn timeout_response(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(anyhow::anyhow!(err))
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());

    AppError::Internal(anyhow::anyhow!("handler panicked: {detail}")).into_response()
}

fn clean_request_path(mut request: Request) -> Request {
    let path = request.uri().path();
    if !path.contains("//") && !path.contains("/.") {
        return request;
    }

    let cleaned = clean_path(path);
    let path_and_query = match request.uri().query() {
        Some(query) => format!("{cleaned}?{query}"),
        None => cleaned,
    };

    let Ok(path_and_query) = PathAndQuery::try_from(path_and_query) else {
        return request;
    };
    let mut parts = request.uri().clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    if let Ok(uri) = Uri::from_parts(parts) {
        *request.uri_mut() = uri;
    }
    request
}

/// Collapse repeated slashes and resolve `.` and `..` segments.
fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Request ID generator for tracing
#[derive(Clone, Copy, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let timestamp = Timestamp::now(uuid::NoContext);
        let request_id = Uuid::new_v7(timestamp)
            .to_string()
            .parse::<HeaderValue>()
            .ok()?;
        Some(RequestId::new(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode};
    use bookshelf_kernel::Module;
    use rstest::rstest;
    use serde_json::{json, Value};
    use tokio::sync::Semaphore;
    use tower::ServiceExt as _;

    struct ShelfModule;

    #[async_trait]
    impl Module for ShelfModule {
        fn name(&self) -> &'static str {
            "shelves"
        }

        fn routes(&self) -> Router {
            Router::new().route("/", get(|| async { "shelves" }))
        }

        fn openapi(&self) -> Option<serde_json::Value> {
            Some(serde_json::json!({
                "paths": {
                    "/": { "get": { "summary": "List shelves", "responses": { "200": { "description": "OK" } } } },
                    "/{shelf_id}": { "get": { "summary": "Get shelf", "responses": { "200": { "description": "OK" } } } }
                },
                "components": { "schemas": { "Shelf": { "type": "object" } } }
            }))
        }
    }

    fn registry() -> ModuleRegistry {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(ShelfModule));
        registry
    }

    fn get_request(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn test_module_mounting() {
        let router = RouterBuilder::new()
            .mount_module("shelves", ShelfModule.routes())
            .build();

        let response = router.oneshot(get_request("/api/shelves")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn body_bytes(response: Response) -> axum::body::Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_heartbeat() {
        let router = RouterBuilder::new().with_heartbeat().build();

        let response = router.oneshot(get_request("/api/alive")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(&body_bytes(response).await[..], b".");
    }

    #[rstest]
    #[case("/api/shelves/")]
    #[case("/api/shelves//")]
    #[case("//api//shelves")]
    #[case("/api/./shelves")]
    #[case("/api/books/../shelves")]
    #[tokio::test]
    async fn test_paths_are_cleaned_before_routing(#[case] uri: &str) {
        let router = RouterBuilder::new()
            .mount_module("shelves", ShelfModule.routes())
            .build();

        let response = router.oneshot(get_request(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed_for_post() {
        let router = RouterBuilder::new()
            .route("/api/authors", axum::routing::post(|| async { "created" }))
            .build();
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/api/authors/?dry_run=true")
            .body(Body::empty())
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[case("/", "/")]
    #[case("//a///b", "/a/b")]
    #[case("/a/./b/", "/a/b")]
    #[case("/a/../../b", "/b")]
    fn test_clean_path(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(clean_path(raw), expected);
    }

    async fn collapse() -> &'static str {
        panic!("shelf collapsed")
    }

    #[tokio::test]
    async fn test_panicking_handler_yields_error_envelope() {
        let router = RouterBuilder::new()
            .route("/boom", get(collapse))
            .with_panic_recovery()
            .build();

        let response = router.oneshot(get_request("/boom")).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"status": "error", "message": "Internal server error"})
        );
    }

    #[tokio::test]
    async fn test_slow_request_times_out_with_envelope() {
        let router = RouterBuilder::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .with_timeout(20)
            .build();

        let response = router.oneshot(get_request("/slow")).await.unwrap();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            body_json(response).await,
            json!({"status": "error", "message": "Request timed out"})
        );
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_shared_across_routes() {
        let gate = Arc::new(Semaphore::new(0));
        let router = RouterBuilder::new()
            .route(
                "/held",
                get({
                    let gate = gate.clone();
                    move || {
                        let gate = gate.clone();
                        async move {
                            let _permit = gate.acquire().await.unwrap();
                            "released"
                        }
                    }
                }),
            )
            .route("/quick", get(|| async { "quick" }))
            .with_concurrency_limit(1)
            .build();

        let held = tokio::spawn(router.clone().oneshot(get_request("/held")));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            router.clone().oneshot(get_request("/quick")),
        )
        .await;
        assert!(blocked.is_err());

        gate.add_permits(1);
        assert_eq!(held.await.unwrap().unwrap().status(), StatusCode::OK);

        let response = router.oneshot(get_request("/quick")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rate_limit_is_per_client_ip() {
        let router = RouterBuilder::new()
            .route("/shelves", get(|| async { "shelves" }))
            .with_rate_limit(NonZeroU32::new(2).unwrap())
            .build();
        let from = |ip: &str| {
            axum::http::Request::builder()
                .uri("/shelves")
                .header("x-real-ip", ip)
                .body(Body::empty())
                .unwrap()
        };

        for _ in 0..2 {
            let response = router.clone().oneshot(from("203.0.113.7")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = router.clone().oneshot(from("203.0.113.7")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        assert_eq!(
            body_json(response).await,
            json!({"status": "error", "message": "Too many requests"})
        );

        let response = router.oneshot(from("203.0.113.8")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_generated_and_echoed() {
        let router = RouterBuilder::new()
            .route("/health", get(|| async { "ok" }))
            .with_timeout(5000)
            .with_cors()
            .with_tracing()
            .with_request_id()
            .build();

        let response = router.clone().oneshot(get_request("/health")).await.unwrap();
        let generated = response.headers().get("x-request-id").unwrap();
        assert!(Uuid::parse_str(generated.to_str().unwrap()).is_ok());

        let request = axum::http::Request::builder()
            .uri("/health")
            .header("x-request-id", "client-supplied")
            .body(Body::empty())
            .unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert_eq!(
            response.headers().get("x-request-id").unwrap(),
            "client-supplied"
        );
    }

    #[test]
    fn test_openapi_paths_are_prefixed() {
        let spec = merge_openapi(&registry());

        assert!(spec["paths"]["/api/shelves"].is_object());
        assert!(spec["paths"]["/api/shelves/{shelf_id}"].is_object());
        assert!(spec["paths"]["/healthz"].is_object());
        assert!(spec["components"]["schemas"]["Shelf"].is_object());
        assert!(spec["components"]["schemas"]["ErrorResponse"].is_object());
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let router = RouterBuilder::new().with_openapi(&registry()).build();

        let response = router
            .clone()
            .oneshot(get_request("/docs/openapi.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router.oneshot(get_request("/swagger-ui/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
