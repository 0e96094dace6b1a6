//! RepoLens - Main application library
//!
//! This is the main binary crate that wires the workspace crates together.

mod app;

pub use app::{AppHandle, create_app};
pub use repolens_core::{Config, init_tracing};

// Re-export for convenience
pub use repolens_core;
pub use repolens_llm;
pub use repolens_orchestrator;
