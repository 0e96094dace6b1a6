//! Request and response models for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::entities::{DetectedFramework, RouteDescriptor};

/// Request to start an analysis session
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalyzeRequest {
    /// HTTPS URL of the Git repository to analyze
    #[schema(example = "https://github.com/expressjs/express.git")]
    pub repo_url: String,
}

/// Stage-1 response: session id and architecture graph
#[derive(Debug, Serialize, ToSchema)]
pub struct AnalyzeResponse {
    /// Session identifier to pass to the document endpoint
    pub job_id: Uuid,

    /// Mermaid flow diagram of the repository's structure
    #[schema(example = "graph TD\n    subgraph System Architecture\n    app --> util\n    end")]
    pub graph: String,

    /// Non-fatal degradations encountered during scanning
    pub warnings: Vec<String>,
}

/// Request to document a previously analyzed repository
#[derive(Debug, Deserialize, ToSchema)]
pub struct DocumentRequest {
    /// Session identifier returned by the analyze endpoint
    pub job_id: Uuid,
}

/// Stage-2 response: README, API routes and framework classification
#[derive(Debug, Serialize, ToSchema)]
pub struct DocumentResponse {
    /// Generated README in Markdown
    pub readme: String,

    /// Resolved API routes
    pub routes: Vec<RouteDescriptor>,

    /// Detected web framework
    pub detected_framework: DetectedFramework,

    /// Non-fatal degradations encountered while documenting
    pub warnings: Vec<String>,
}

/// Request for standalone contract resolution
#[derive(Debug, Deserialize, ToSchema)]
pub struct ContractRequest {
    /// HTTPS URL of the Git repository to resolve
    #[schema(example = "https://github.com/tiangolo/fastapi.git")]
    pub repo_url: String,
}

/// Standalone contract resolution response
#[derive(Debug, Serialize, ToSchema)]
pub struct ContractResponse {
    /// Repository-relative path of the authoritative OpenAPI document, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_document: Option<String>,

    /// Resolved API routes
    pub routes: Vec<RouteDescriptor>,

    /// Detected web framework
    pub detected_framework: DetectedFramework,

    /// Non-fatal degradations encountered while resolving
    pub warnings: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code
    #[schema(example = "CLONE_FAILED")]
    pub code: String,

    /// Human-readable error message
    #[schema(example = "Repository acquisition failed: Clone timed out after 60s")]
    pub message: String,

    /// Additional error context
    pub details: Option<serde_json::Value>,

    /// Unique request identifier for tracking and support
    pub request_id: Uuid,

    /// Error occurrence timestamp
    #[schema(example = "2026-01-15T10:30:00Z")]
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service health status
    #[schema(example = "healthy")]
    pub status: String,

    /// Service name
    #[schema(example = "repolens")]
    pub name: String,

    /// Current service version
    #[schema(example = "0.1.0")]
    pub version: String,

    /// Seconds since the service started
    pub uptime_seconds: u64,

    /// Health check timestamp
    pub timestamp: DateTime<Utc>,
}
