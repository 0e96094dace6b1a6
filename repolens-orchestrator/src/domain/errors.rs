//! Error taxonomy for the intelligence pipeline
//!
//! Acquisition failures and expired sessions are fatal and typed; contract
//! unavailability and per-file scan errors are warnings, never errors.

use uuid::Uuid;

/// Errors emitted while materializing a repository into a working directory.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    #[error("Unsupported Git URL scheme for {0}. Only HTTPS is supported.")]
    UnsupportedScheme(String),
    #[error("Clone timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),
    #[error("Blocking clone task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// No valid OpenAPI/Swagger document exists in the repository.
///
/// Deliberately not an exception path: the caller reports it as a warning and
/// may fall back to AI-mediated synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no OpenAPI specification found in repository")]
pub struct ContractUnavailable;

/// Fatal errors surfaced to clients of the intelligence service.
#[derive(Debug, thiserror::Error)]
pub enum IntelligenceError {
    #[error("Repository acquisition failed: {0}")]
    Acquisition(#[from] AcquireError),

    #[error("Analysis session {0} has expired; run the analyze step again")]
    SessionExpired(Uuid),

    #[error("Analysis session {0} is already being documented")]
    SessionBusy(Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
