mod templates;

pub use templates::{
    OPENAPI_SYSTEM_PROMPT, PromptBuilder, README_SYSTEM_PROMPT,
};
