//! Job registry
//!
//! Tracks every analysis job independently of the working directory's
//! existence, so an expired session is distinguishable from a directory that
//! was never created. Also guards against concurrent stage-2 calls on the
//! same job and reaps abandoned working directories after a TTL.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::{AnalysisJob, JobState};
use crate::domain::errors::IntelligenceError;
use crate::infrastructure::acquirer::RepositoryAcquirer;

struct JobRecord {
    job: AnalysisJob,
    state: JobState,
}

/// In-memory registry of analysis jobs.
pub struct JobRegistry {
    jobs: Mutex<HashMap<Uuid, JobRecord>>,
    job_ttl: Duration,
}

impl JobRegistry {
    pub fn new(job_ttl: Duration) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            job_ttl,
        }
    }

    /// Register a freshly acquired job as ready for documentation.
    pub async fn insert(&self, job: AnalysisJob) {
        let mut jobs = self.jobs.lock().await;
        jobs.insert(
            job.job_id,
            JobRecord {
                job,
                state: JobState::Ready,
            },
        );
    }

    /// Claim a job for the documentation stage.
    ///
    /// Ready jobs transition to Documenting and are returned; a concurrent
    /// claim is rejected with SessionBusy; released or unknown ids report
    /// SessionExpired.
    pub async fn begin_document(&self, job_id: Uuid) -> Result<AnalysisJob, IntelligenceError> {
        let mut jobs = self.jobs.lock().await;
        match jobs.get_mut(&job_id) {
            Some(record) => match record.state {
                JobState::Ready => {
                    record.state = JobState::Documenting;
                    Ok(record.job.clone())
                }
                JobState::Documenting => Err(IntelligenceError::SessionBusy(job_id)),
                JobState::Released => {
                    debug!(job_id = %job_id, "Documentation requested for released job");
                    Err(IntelligenceError::SessionExpired(job_id))
                }
            },
            None => {
                debug!(job_id = %job_id, "Documentation requested for unknown job id");
                Err(IntelligenceError::SessionExpired(job_id))
            }
        }
    }

    /// Mark a job's working directory as gone. Idempotent.
    pub async fn mark_released(&self, job_id: Uuid) {
        let mut jobs = self.jobs.lock().await;
        if let Some(record) = jobs.get_mut(&job_id) {
            record.state = JobState::Released;
        }
    }

    /// Ready jobs whose TTL has elapsed, claimed for release.
    ///
    /// Claiming transitions them to Released so a racing `begin_document`
    /// observes an expired session rather than a half-deleted tree.
    pub async fn claim_expired(&self) -> Vec<AnalysisJob> {
        let now = Utc::now();
        let ttl = chrono::TimeDelta::from_std(self.job_ttl).unwrap_or(chrono::TimeDelta::zero());

        let mut jobs = self.jobs.lock().await;
        let mut expired = Vec::new();
        for record in jobs.values_mut() {
            if record.state == JobState::Ready && now - record.job.created_at >= ttl {
                record.state = JobState::Released;
                expired.push(record.job.clone());
            }
        }
        expired
    }

    /// Number of jobs currently awaiting documentation.
    pub async fn ready_count(&self) -> usize {
        let jobs = self.jobs.lock().await;
        jobs.values()
            .filter(|r| r.state == JobState::Ready)
            .count()
    }
}

/// Spawn a background worker that periodically releases working directories
/// of jobs whose documentation stage never arrived.
/// Respects the cancellation token for graceful shutdown.
pub fn spawn_job_reaper(
    registry: Arc<JobRegistry>,
    acquirer: Arc<RepositoryAcquirer>,
    sweep_interval: Duration,
    shutdown_token: CancellationToken,
) {
    tokio::spawn(async move {
        let mut interval_timer = tokio::time::interval(sweep_interval);
        // Skip the immediate first tick; nothing can be expired at startup.
        interval_timer.tick().await;

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    let expired = registry.claim_expired().await;
                    if expired.is_empty() {
                        continue;
                    }

                    info!(count = expired.len(), "Reaping abandoned analysis jobs");
                    for job in expired {
                        warn!(
                            job_id = %job.job_id,
                            created_at = %job.created_at,
                            "Releasing working directory of abandoned job"
                        );
                        acquirer.release(&job.working_directory).await;
                    }
                }
                _ = shutdown_token.cancelled() => {
                    info!("Job reaper shutting down gracefully");
                    return;
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job() -> AnalysisJob {
        AnalysisJob::new(
            Uuid::new_v4(),
            PathBuf::from("/tmp/repolens/test"),
            "https://example.com/repo.git".to_string(),
        )
    }

    #[tokio::test]
    async fn begin_document_claims_ready_job_once() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job = job();
        let id = job.job_id;
        registry.insert(job).await;

        assert!(registry.begin_document(id).await.is_ok());
        assert!(matches!(
            registry.begin_document(id).await,
            Err(IntelligenceError::SessionBusy(_))
        ));
    }

    #[tokio::test]
    async fn released_and_unknown_jobs_report_expired() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job = job();
        let id = job.job_id;
        registry.insert(job).await;
        registry.mark_released(id).await;

        assert!(matches!(
            registry.begin_document(id).await,
            Err(IntelligenceError::SessionExpired(_))
        ));
        assert!(matches!(
            registry.begin_document(Uuid::new_v4()).await,
            Err(IntelligenceError::SessionExpired(_))
        ));
    }

    #[tokio::test]
    async fn claim_expired_only_takes_stale_ready_jobs() {
        let registry = JobRegistry::new(Duration::ZERO);
        let fresh = job();
        let claimed = job();
        let claimed_id = claimed.job_id;
        registry.insert(fresh).await;
        registry.insert(claimed).await;
        registry.begin_document(claimed_id).await.unwrap();

        // TTL is zero, so the Ready job is immediately stale; the
        // Documenting one must be left alone.
        let expired = registry.claim_expired().await;
        assert_eq!(expired.len(), 1);
        assert_ne!(expired[0].job_id, claimed_id);

        // A second sweep finds nothing new.
        assert!(registry.claim_expired().await.is_empty());
    }

    #[tokio::test]
    async fn mark_released_is_idempotent() {
        let registry = JobRegistry::new(Duration::from_secs(60));
        let job = job();
        let id = job.job_id;
        registry.insert(job).await;

        registry.mark_released(id).await;
        registry.mark_released(id).await;
        registry.mark_released(Uuid::new_v4()).await;
        assert_eq!(registry.ready_count().await, 0);
    }
}
