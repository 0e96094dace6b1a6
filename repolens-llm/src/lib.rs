pub mod domain;
pub mod infrastructure;

pub use domain::error::LlmError;
pub use domain::messages::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
pub use domain::provider::{LlmProvider, ProviderInfo};
pub use infrastructure::prompts;
pub use infrastructure::providers::OpenAiCompatProvider;
