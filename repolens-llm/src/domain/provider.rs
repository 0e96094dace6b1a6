//! LLM provider trait
//!
//! The credential is passed per call rather than held by the provider: every
//! inbound request carries its own opaque API key, and its absence has to
//! degrade gracefully upstream instead of failing provider construction.

use async_trait::async_trait;

use crate::domain::error::LlmError;
use crate::domain::messages::{CompletionRequest, CompletionResponse};

/// Metadata about a provider
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Provider identifier (e.g., "openai_compat")
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
}

/// Core trait for LLM providers
///
/// Object-safe; used with dynamic dispatch via `Arc<dyn LlmProvider>`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get provider metadata
    fn info(&self) -> ProviderInfo;

    /// Generate a completion using the caller-supplied credential.
    async fn complete(
        &self,
        request: CompletionRequest,
        credential: &str,
    ) -> Result<CompletionResponse, LlmError>;

    /// Get the default model for this provider
    fn default_model(&self) -> &str;
}
