//! HTTP controllers

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::{info, warn};

use crate::domain::errors::IntelligenceError;
use crate::presentation::models::{
    AnalyzeRequest, AnalyzeResponse, ContractRequest, ContractResponse, DocumentRequest,
    DocumentResponse, ErrorResponse, HealthResponse,
};
use crate::presentation::routes::AppState;

/// Header carrying the caller's model-provider API key.
const API_KEY_HEADER: &str = "x-api-key";

/// Map a pipeline error onto the wire envelope.
pub fn intelligence_error_to_response(error: &IntelligenceError) -> Response {
    let (status, code) = match error {
        IntelligenceError::Acquisition(_) => (StatusCode::BAD_GATEWAY, "CLONE_FAILED"),
        IntelligenceError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        IntelligenceError::SessionExpired(_) => (StatusCode::GONE, "SESSION_EXPIRED"),
        IntelligenceError::SessionBusy(_) => (StatusCode::CONFLICT, "SESSION_BUSY"),
        IntelligenceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    };

    if status.is_server_error() {
        warn!(code, error = %error, "Request failed");
    } else {
        info!(code, error = %error, "Request rejected");
    }

    (status, Json(ErrorResponse::new(code, error.to_string()))).into_response()
}

fn credential_from(headers: &HeaderMap) -> String {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// POST /api/v1/project/analyze - Clone a repository and map its architecture
#[utoipa::path(
    post,
    path = "/api/v1/project/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis session started", body = AnalyzeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Repository could not be cloned", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "project"
)]
pub async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, Response> {
    let outcome = state
        .service
        .analyze(&request.repo_url)
        .await
        .map_err(|e| intelligence_error_to_response(&e))?;

    Ok(Json(AnalyzeResponse {
        job_id: outcome.job_id,
        graph: outcome.graph,
        warnings: outcome.warnings,
    }))
}

/// POST /api/v1/project/document - Document an analyzed repository and release it
#[utoipa::path(
    post,
    path = "/api/v1/project/document",
    request_body = DocumentRequest,
    params(
        ("x-api-key" = Option<String>, Header, description = "Model provider API key; omit for degraded output")
    ),
    responses(
        (status = 200, description = "Documentation generated", body = DocumentResponse),
        (status = 409, description = "Session is already being documented", body = ErrorResponse),
        (status = 410, description = "Session expired or unknown", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "project"
)]
pub async fn document(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<DocumentRequest>,
) -> Result<Json<DocumentResponse>, Response> {
    let credential = credential_from(&headers);
    let outcome = state
        .service
        .document(request.job_id, &credential)
        .await
        .map_err(|e| intelligence_error_to_response(&e))?;

    Ok(Json(DocumentResponse {
        readme: outcome.readme,
        routes: outcome.routes,
        detected_framework: outcome.detected_framework,
        warnings: outcome.warnings,
    }))
}

/// POST /api/v1/project/contract - Resolve a repository's API contract
#[utoipa::path(
    post,
    path = "/api/v1/project/contract",
    request_body = ContractRequest,
    params(
        ("x-api-key" = Option<String>, Header, description = "Model provider API key; omit to disable synthesis")
    ),
    responses(
        (status = 200, description = "Contract resolved", body = ContractResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 502, description = "Repository could not be cloned", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "project"
)]
pub async fn contract(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ContractRequest>,
) -> Result<Json<ContractResponse>, Response> {
    let credential = credential_from(&headers);
    let outcome = state
        .service
        .synthesize_contract(&request.repo_url, &credential)
        .await
        .map_err(|e| intelligence_error_to_response(&e))?;

    Ok(Json(ContractResponse {
        spec_document: outcome.spec_document,
        routes: outcome.routes,
        detected_framework: outcome.detected_framework,
        warnings: outcome.warnings,
    }))
}

/// GET /health - Service liveness
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        name: "repolens".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
