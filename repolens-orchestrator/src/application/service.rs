//! Project intelligence facade
//!
//! Orchestrates the two-stage pipeline: `analyze` clones and maps, `document`
//! consumes the job (contract resolution, README, cleanup), and
//! `synthesize_contract` runs a standalone clone-resolve-release pass. Every
//! path that acquired a working directory releases it before returning.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::synthesizer::DocSynthesizer;
use crate::domain::entities::{
    AnalysisJob, ContractSource, DetectedFramework, ResolvedContract, RouteDescriptor,
};
use crate::domain::errors::IntelligenceError;
use crate::infrastructure::acquirer::RepositoryAcquirer;
use crate::infrastructure::contract::{
    ContractResolver, MAX_SYNTHESIZED_ROUTES, routes_from_openapi,
};
use crate::infrastructure::mapper::{GraphMode, StructuralMapper};
use crate::infrastructure::registry::JobRegistry;

/// Source label attached to synthesized routes.
const SYNTHESIZED_SOURCE: &str = "ai-synthesized";

/// Stage-1 result: an analysis session awaiting documentation.
#[derive(Debug, Clone)]
pub struct AnalyzeOutcome {
    pub job_id: Uuid,
    pub graph: String,
    pub warnings: Vec<String>,
}

/// Stage-2 result.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub readme: String,
    pub routes: Vec<RouteDescriptor>,
    pub detected_framework: DetectedFramework,
    pub warnings: Vec<String>,
}

/// Standalone contract resolution result.
#[derive(Debug, Clone)]
pub struct ContractOutcome {
    /// Repository-relative path of the authoritative document, when one was
    /// found. None means the routes were synthesized (or absent).
    pub spec_document: Option<String>,
    pub routes: Vec<RouteDescriptor>,
    pub detected_framework: DetectedFramework,
    pub warnings: Vec<String>,
}

/// Facade over acquisition, mapping, contract resolution and synthesis.
pub struct ProjectIntelligenceService {
    acquirer: Arc<RepositoryAcquirer>,
    registry: Arc<JobRegistry>,
    mapper: StructuralMapper,
    resolver: ContractResolver,
    synthesizer: DocSynthesizer,
}

impl ProjectIntelligenceService {
    pub fn new(
        acquirer: Arc<RepositoryAcquirer>,
        registry: Arc<JobRegistry>,
        synthesizer: DocSynthesizer,
    ) -> Self {
        Self {
            acquirer,
            registry,
            mapper: StructuralMapper::new(),
            resolver: ContractResolver::new(),
            synthesizer,
        }
    }

    /// Stage 1: clone the repository and map its architecture. The working
    /// directory stays on disk, registered under the returned job id, until
    /// `document` consumes it or the reaper expires it.
    pub async fn analyze(&self, repo_url: &str) -> Result<AnalyzeOutcome, IntelligenceError> {
        let repo_url = repo_url.trim();
        if repo_url.is_empty() {
            return Err(IntelligenceError::InvalidRequest(
                "repo_url must not be empty".to_string(),
            ));
        }

        let job = self.acquirer.acquire(repo_url).await?;
        info!(job_id = %job.job_id, repository = %repo_url, "Analysis session started");

        let mapper = self.mapper.clone();
        let working_directory = job.working_directory.clone();
        let description =
            match tokio::task::spawn_blocking(move || mapper.map(&working_directory)).await {
                Ok(description) => description,
                Err(e) => {
                    self.discard_job(&job).await;
                    return Err(IntelligenceError::Internal(format!(
                        "structural scan task failed: {e}"
                    )));
                }
            };

        let mut warnings = Vec::new();
        if description.mode == GraphMode::DirectoryTree {
            warnings.push(
                "Too few import relations were found; the graph shows directory structure instead."
                    .to_string(),
            );
        }
        if description.skipped_files > 0 {
            warnings.push(format!(
                "{} file(s) could not be read during scanning.",
                description.skipped_files
            ));
        }

        let job_id = job.job_id;
        self.registry.insert(job).await;

        Ok(AnalyzeOutcome {
            job_id,
            graph: description.graph,
            warnings,
        })
    }

    /// Stage 2: resolve the contract, synthesize the README and release the
    /// working directory. The session is consumed whatever happens inside.
    pub async fn document(
        &self,
        job_id: Uuid,
        credential: &str,
    ) -> Result<DocumentOutcome, IntelligenceError> {
        let job = self.registry.begin_document(job_id).await?;

        let outcome = self.document_inner(&job, credential).await;

        self.acquirer.release(&job.working_directory).await;
        self.registry.mark_released(job.job_id).await;
        info!(job_id = %job.job_id, "Analysis session consumed");

        Ok(outcome)
    }

    async fn document_inner(&self, job: &AnalysisJob, credential: &str) -> DocumentOutcome {
        let dir = job.working_directory.as_path();
        let mut warnings = Vec::new();

        let detected_framework = self.resolver.detect_framework(dir);
        let routes = self
            .resolve_routes(dir, detected_framework, credential, &mut warnings)
            .await;
        let readme = self.synthesizer.generate_readme(dir, credential).await;

        DocumentOutcome {
            readme,
            routes,
            detected_framework,
            warnings,
        }
    }

    /// Standalone contract resolution: clone fresh, resolve or synthesize,
    /// release.
    pub async fn synthesize_contract(
        &self,
        repo_url: &str,
        credential: &str,
    ) -> Result<ContractOutcome, IntelligenceError> {
        let repo_url = repo_url.trim();
        if repo_url.is_empty() {
            return Err(IntelligenceError::InvalidRequest(
                "repo_url must not be empty".to_string(),
            ));
        }

        let job = self.acquirer.acquire(repo_url).await?;
        let dir = job.working_directory.as_path();
        let mut warnings = Vec::new();

        let detected_framework = self.resolver.detect_framework(dir);
        let scan = self.resolver.resolve_contract(dir);
        if scan.skipped_files > 0 {
            warnings.push(format!(
                "{} contract candidate(s) could not be read or parsed.",
                scan.skipped_files
            ));
        }

        let (spec_document, routes) = match scan.outcome {
            Ok(ResolvedContract {
                source: ContractSource::SpecFile(path),
                routes,
            }) => (Some(path), routes),
            Ok(ResolvedContract {
                source: ContractSource::Synthesized,
                routes,
            }) => (None, routes),
            Err(_) => {
                let routes = self
                    .synthesize_routes(dir, detected_framework, credential, &mut warnings)
                    .await;
                (None, routes)
            }
        };

        self.acquirer.release(&job.working_directory).await;

        Ok(ContractOutcome {
            spec_document,
            routes,
            detected_framework,
            warnings,
        })
    }

    /// Authoritative document first; AI synthesis only when none exists.
    async fn resolve_routes(
        &self,
        dir: &std::path::Path,
        framework: DetectedFramework,
        credential: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<RouteDescriptor> {
        let scan = self.resolver.resolve_contract(dir);
        if scan.skipped_files > 0 {
            warnings.push(format!(
                "{} contract candidate(s) could not be read or parsed.",
                scan.skipped_files
            ));
        }

        match scan.outcome {
            Ok(contract) => contract.routes,
            Err(_) => {
                self.synthesize_routes(dir, framework, credential, warnings)
                    .await
            }
        }
    }

    /// Drop a job whose pipeline failed before it could be handed to the
    /// caller: remove the working directory and retire any registry record.
    async fn discard_job(&self, job: &AnalysisJob) {
        warn!(job_id = %job.job_id, "Discarding failed analysis job");
        self.acquirer.release(&job.working_directory).await;
        self.registry.mark_released(job.job_id).await;
    }

    async fn synthesize_routes(
        &self,
        dir: &std::path::Path,
        framework: DetectedFramework,
        credential: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<RouteDescriptor> {
        warnings.push(
            "No OpenAPI document was found in the repository; route extraction fell back to synthesis."
                .to_string(),
        );

        match self
            .synthesizer
            .generate_openapi_spec(dir, framework, credential)
            .await
        {
            Some(doc) => routes_from_openapi(&doc, SYNTHESIZED_SOURCE, MAX_SYNTHESIZED_ROUTES),
            None => {
                warn!("Contract synthesis produced no routes");
                warnings.push("No routes could be extracted.".to_string());
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::acquirer::AcquirerConfig;
    use async_trait::async_trait;
    use repolens_core::config::LlmConfig;
    use repolens_llm::{
        CompletionRequest, CompletionResponse, LlmError, LlmProvider, ProviderInfo,
    };
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    struct UnreachableProvider;

    #[async_trait]
    impl LlmProvider for UnreachableProvider {
        fn info(&self) -> ProviderInfo {
            ProviderInfo {
                id: "unreachable",
                name: "Unreachable",
            }
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
            _credential: &str,
        ) -> Result<CompletionResponse, LlmError> {
            panic!("no model call expected");
        }

        fn default_model(&self) -> &str {
            "unreachable"
        }
    }

    fn service_in(base: &Path) -> (ProjectIntelligenceService, Arc<JobRegistry>) {
        let acquirer = Arc::new(
            RepositoryAcquirer::new(AcquirerConfig {
                workdir_base: Some(base.to_path_buf()),
                clone_timeout: Duration::from_secs(5),
            })
            .unwrap(),
        );
        let registry = Arc::new(JobRegistry::new(Duration::from_secs(300)));
        let synthesizer = DocSynthesizer::new(Arc::new(UnreachableProvider), &LlmConfig::default());
        let service =
            ProjectIntelligenceService::new(acquirer, registry.clone(), synthesizer);
        (service, registry)
    }

    #[tokio::test]
    async fn discarded_job_leaves_no_directory_behind() {
        let base = TempDir::new().unwrap();
        let (service, _registry) = service_in(base.path());

        let workdir = base.path().join("job");
        std::fs::create_dir_all(workdir.join("src")).unwrap();
        std::fs::write(workdir.join("src/app.js"), "x").unwrap();
        let job = crate::domain::entities::AnalysisJob::new(
            uuid::Uuid::new_v4(),
            workdir.clone(),
            "https://example.com/repo.git".to_string(),
        );

        service.discard_job(&job).await;
        assert!(!workdir.exists());
    }

    #[tokio::test]
    async fn discarding_retires_a_registered_session() {
        let base = TempDir::new().unwrap();
        let (service, registry) = service_in(base.path());

        let workdir = base.path().join("job");
        std::fs::create_dir_all(&workdir).unwrap();
        let job = crate::domain::entities::AnalysisJob::new(
            uuid::Uuid::new_v4(),
            workdir,
            "https://example.com/repo.git".to_string(),
        );
        let job_id = job.job_id;
        registry.insert(job.clone()).await;

        service.discard_job(&job).await;

        assert_eq!(registry.ready_count().await, 0);
        assert!(matches!(
            registry.begin_document(job_id).await,
            Err(IntelligenceError::SessionExpired(_))
        ));
    }
}
