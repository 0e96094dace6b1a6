//! Application setup and wiring

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio_util::sync::CancellationToken;

use repolens_core::Config;
use repolens_llm::{LlmProvider, OpenAiCompatProvider};
use repolens_orchestrator::{
    AcquirerConfig, AppState, DocSynthesizer, JobRegistry, ProjectIntelligenceService,
    RepositoryAcquirer, create_router, spawn_job_reaper,
};

/// Handle returned from create_app for graceful shutdown coordination
pub struct AppHandle {
    pub router: Router,
    pub shutdown_token: CancellationToken,
}

/// Build the router and start background workers.
pub async fn create_app(config: Config) -> Result<AppHandle, Box<dyn std::error::Error>> {
    let shutdown_token = CancellationToken::new();

    let workdir_base = if config.git.workdir_base.is_empty() {
        None
    } else {
        Some(PathBuf::from(&config.git.workdir_base))
    };
    let acquirer = Arc::new(RepositoryAcquirer::new(AcquirerConfig {
        workdir_base,
        clone_timeout: Duration::from_secs(config.git.clone_timeout_seconds),
    })?);

    let registry = Arc::new(JobRegistry::new(Duration::from_secs(
        config.intel.job_ttl_seconds,
    )));

    spawn_job_reaper(
        registry.clone(),
        acquirer.clone(),
        Duration::from_secs(config.intel.reaper_interval_seconds),
        shutdown_token.clone(),
    );

    let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiCompatProvider::new(&config.llm));
    let synthesizer = DocSynthesizer::new(provider, &config.llm);

    let service = Arc::new(ProjectIntelligenceService::new(
        acquirer, registry, synthesizer,
    ));

    let state = AppState::new(service, Arc::new(config));
    let router = create_router(state);

    Ok(AppHandle {
        router,
        shutdown_token,
    })
}
