//! Route definitions and router assembly

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use repolens_core::Config;

use crate::application::service::ProjectIntelligenceService;
use crate::domain::entities::{DetectedFramework, HttpMethod, RouteDescriptor};
use crate::presentation::controllers::{analyze, contract, document, health_check};
use crate::presentation::models::*;

/// Shared state handed to every controller.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ProjectIntelligenceService>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(service: Arc<ProjectIntelligenceService>, config: Arc<Config>) -> Self {
        Self {
            service,
            config,
            started_at: Instant::now(),
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::controllers::analyze,
        crate::presentation::controllers::document,
        crate::presentation::controllers::contract,
        crate::presentation::controllers::health_check
    ),
    components(schemas(
        AnalyzeRequest,
        AnalyzeResponse,
        DocumentRequest,
        DocumentResponse,
        ContractRequest,
        ContractResponse,
        ErrorResponse,
        HealthResponse,
        RouteDescriptor,
        DetectedFramework,
        HttpMethod
    )),
    tags(
        (name = "project", description = "Repository intelligence pipeline"),
        (name = "health", description = "Service health")
    ),
    info(
        title = "RepoLens API",
        description = "Clones a repository, maps its architecture and synthesizes documentation"
    )
)]
pub struct ApiDoc;

/// Assemble the application router with middleware and optional Swagger UI.
pub fn create_router(state: AppState) -> Router {
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);
    let cors = cors_layer(&state.config.server.allowed_origins);
    let enable_docs = state.config.server.enable_docs;

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/project/analyze", post(analyze))
        .route("/api/v1/project/document", post(document))
        .route("/api/v1/project/contract", post(contract))
        .with_state(state);

    if enable_docs {
        router =
            router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(timeout))
            .layer(cors),
    )
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderName::from_static("x-api-key"),
        ])
}
