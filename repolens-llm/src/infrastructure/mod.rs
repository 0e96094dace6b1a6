pub mod prompts;
pub mod providers;
