//! Intelligence domain entities

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// One clone-through-cleanup unit of work over a single repository.
///
/// The working directory is exclusively owned by the job; release removes it.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub job_id: Uuid,
    pub working_directory: PathBuf,
    /// Remote repository URL the job was cloned from. Not persisted beyond
    /// the working directory's lifetime.
    pub source_location: String,
    /// HEAD commit SHA, when resolvable after the clone.
    pub head_commit: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AnalysisJob {
    pub fn new(job_id: Uuid, working_directory: PathBuf, source_location: String) -> Self {
        Self {
            job_id,
            working_directory,
            source_location,
            head_commit: None,
            created_at: Utc::now(),
        }
    }
}

/// Registry-tracked lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Stage 1 completed; the working directory is waiting for stage 2.
    Ready,
    /// A stage-2 call is in flight. Concurrent calls are rejected.
    Documenting,
    /// The working directory has been removed (consumed or reaped).
    Released,
}

/// Web framework classification derived from manifest sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DetectedFramework {
    #[serde(rename = "Express.js")]
    ExpressJs,
    #[serde(rename = "NestJS")]
    NestJs,
    #[serde(rename = "Fastify")]
    Fastify,
    #[serde(rename = "FastAPI")]
    FastApi,
    #[serde(rename = "Flask")]
    Flask,
    #[serde(rename = "Django")]
    Django,
    #[serde(rename = "Spring Boot")]
    SpringBoot,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl DetectedFramework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpressJs => "Express.js",
            Self::NestJs => "NestJS",
            Self::Fastify => "Fastify",
            Self::FastApi => "FastAPI",
            Self::Flask => "Flask",
            Self::Django => "Django",
            Self::SpringBoot => "Spring Boot",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for DetectedFramework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP methods recognized in API contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Parse a method name case-insensitively. Unrecognized names yield None.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "OPTIONS" => Some(Self::Options),
            "HEAD" => Some(Self::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One route of an API contract.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RouteDescriptor {
    pub method: HttpMethod,
    pub url_path: String,
    /// File the route was extracted from ("ai-synthesized" for model output).
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Where a resolved contract came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractSource {
    /// A pre-existing OpenAPI/Swagger document found in the repository.
    /// Authoritative; never combined with heuristic extraction.
    SpecFile(String),
    /// Synthesized by the model from source excerpts.
    Synthesized,
}

/// A resolved API contract.
#[derive(Debug, Clone)]
pub struct ResolvedContract {
    pub source: ContractSource,
    pub routes: Vec<RouteDescriptor>,
}
