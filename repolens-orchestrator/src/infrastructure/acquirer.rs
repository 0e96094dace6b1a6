//! Repository acquisition
//!
//! Materializes a remote repository into a per-job working directory under a
//! single base path. The job id is the directory name; no two acquisitions
//! share a directory. Cleanup is idempotent and tolerates missing trees.

use std::path::{Path, PathBuf};
use std::time::Duration;

use git2::{FetchOptions, build::RepoBuilder, opts};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::AnalysisJob;
use crate::domain::errors::AcquireError;

/// Configuration for the repository acquirer.
#[derive(Debug, Clone)]
pub struct AcquirerConfig {
    /// Parent directory for per-job working directories.
    /// Defaults to `<system temp dir>/repolens`.
    pub workdir_base: Option<PathBuf>,
    /// Timeout applied to the clone as a whole and to libgit2 network I/O.
    pub clone_timeout: Duration,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            workdir_base: None,
            clone_timeout: Duration::from_secs(60),
        }
    }
}

/// Service responsible for cloning repositories into per-job directories.
#[derive(Debug)]
pub struct RepositoryAcquirer {
    workdir_base: PathBuf,
    clone_timeout: Duration,
}

impl RepositoryAcquirer {
    pub fn new(config: AcquirerConfig) -> std::io::Result<Self> {
        let workdir_base = config
            .workdir_base
            .unwrap_or_else(|| std::env::temp_dir().join("repolens"));

        if !workdir_base.exists() {
            std::fs::create_dir_all(&workdir_base)?;
        }

        Ok(Self {
            workdir_base,
            clone_timeout: config.clone_timeout,
        })
    }

    /// Clone `source_location` at shallow depth into a fresh working
    /// directory. On failure the partially created directory is removed
    /// before the error propagates.
    pub async fn acquire(&self, source_location: &str) -> Result<AnalysisJob, AcquireError> {
        if !source_location.starts_with("https://") {
            return Err(AcquireError::UnsupportedScheme(source_location.to_string()));
        }

        let job_id = Uuid::new_v4();
        let working_directory = self.workdir_base.join(job_id.to_string());
        std::fs::create_dir_all(&working_directory)?;

        info!(job_id = %job_id, repository = %source_location, "Starting repository clone");

        Self::configure_git_timeouts(self.clone_timeout)?;

        let dest = working_directory.clone();
        let url = source_location.to_string();
        let clone_task =
            tokio::task::spawn_blocking(move || Self::perform_clone(dest.as_path(), &url));

        let clone_result = match tokio::time::timeout(self.clone_timeout, clone_task).await {
            Ok(joined) => joined.map_err(AcquireError::from).and_then(|r| r),
            Err(_) => Err(AcquireError::Timeout {
                seconds: self.clone_timeout.as_secs(),
            }),
        };

        let head_commit = match clone_result {
            Ok(head) => head,
            Err(e) => {
                self.remove_tree(&working_directory).await;
                return Err(e);
            }
        };

        debug!(job_id = %job_id, path = %working_directory.display(), "Repository clone completed");

        let mut job = AnalysisJob::new(job_id, working_directory, source_location.to_string());
        job.head_commit = head_commit;
        Ok(job)
    }

    fn perform_clone(destination: &Path, url: &str) -> Result<Option<String>, AcquireError> {
        let mut fetch_options = FetchOptions::new();
        fetch_options.download_tags(git2::AutotagOption::None);
        fetch_options.update_fetchhead(true);
        fetch_options.depth(1);

        let mut builder = RepoBuilder::new();
        builder.fetch_options(fetch_options);
        builder.clone(url, destination)?;

        let repo = git2::Repository::open(destination)?;
        let head = repo
            .head()
            .ok()
            .and_then(|h| h.target())
            .map(|oid| oid.to_string());
        Ok(head)
    }

    fn configure_git_timeouts(timeout: Duration) -> Result<(), AcquireError> {
        let timeout_ms = timeout.as_millis().clamp(1, i32::MAX as u128) as i32;
        unsafe {
            opts::set_server_connect_timeout_in_milliseconds(timeout_ms)?;
            opts::set_server_timeout_in_milliseconds(timeout_ms)?;
        }
        Ok(())
    }

    /// Remove a job's working directory. Idempotent: releasing an already
    /// released or never-created tree is not an error.
    pub async fn release(&self, working_directory: &Path) {
        self.remove_tree(working_directory).await;
    }

    async fn remove_tree(&self, path: &Path) {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed working directory"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove working directory"),
        }
    }

    /// Base directory that holds all per-job working directories.
    pub fn workdir_base(&self) -> &Path {
        &self.workdir_base
    }
}
