pub mod error;
pub mod messages;
pub mod provider;
