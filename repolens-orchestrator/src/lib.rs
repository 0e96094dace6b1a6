//! Repository intelligence pipeline.
//!
//! Stage 1 clones a repository and maps its architecture; stage 2 resolves
//! its API contract and synthesizes documentation, then releases the
//! working directory.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

pub use application::service::ProjectIntelligenceService;
pub use application::synthesizer::DocSynthesizer;
pub use infrastructure::acquirer::{AcquirerConfig, RepositoryAcquirer};
pub use infrastructure::contract::ContractResolver;
pub use infrastructure::mapper::StructuralMapper;
pub use infrastructure::registry::{JobRegistry, spawn_job_reaper};
pub use presentation::{AppState, create_router};
