//! Application layer: documentation synthesis and the pipeline facade.

pub mod service;
pub mod synthesizer;
