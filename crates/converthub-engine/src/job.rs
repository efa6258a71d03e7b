//! Conversion jobs and their lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{error, info};

use converthub_core::types::JobId;
use converthub_module::module::FileDoneFn;
use converthub_module::{FileRef, Module, ResolvedOptions};

use crate::error::EngineError;
use crate::stats::Statistics;

/// Callback fired with a fresh status after each file settles.
pub type StepFn<'a> = dyn Fn(&JobStatus) + Send + Sync + 'a;

/// Lifecycle position of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStep {
    /// Created, not started.
    Pending,
    /// Conversion in progress.
    Running,
    /// Every file converted.
    Done,
    /// Conversion stopped on an error.
    Failed,
}

impl JobStep {
    /// Whether the job has stopped moving.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running => 1,
            Self::Done => 2,
            Self::Failed => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Pending,
            1 => Self::Running,
            2 => Self::Done,
            _ => Self::Failed,
        }
    }
}

impl std::fmt::Display for JobStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Progress of a job at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    /// Lifecycle position.
    pub step: JobStep,
    /// Files settled so far.
    pub files_converted: usize,
    /// Files in the job.
    pub total_files: usize,
    /// Failure message, once failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Public projection of a job.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Job identifier.
    pub id: JobId,
    /// Current progress.
    pub status: JobStatus,
    /// Label of the module converting the job.
    pub module: String,
    /// Whether results stay available after being taken.
    pub unlimited_downloads: bool,
    /// Resolved options the job runs with.
    pub options: ResolvedOptions,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
}

/// One submission of files to one module.
///
/// A job runs at most once. Its step only moves forward:
/// `pending -> running -> done | failed`.
#[derive(Debug)]
pub struct Job {
    id: JobId,
    module: Arc<Module>,
    options: Arc<ResolvedOptions>,
    files: RwLock<Vec<FileRef>>,
    total_files: usize,
    step: AtomicU8,
    files_converted: AtomicUsize,
    started: AtomicBool,
    error: Mutex<Option<String>>,
    unlimited_downloads: bool,
    created_at: DateTime<Utc>,
    stats: Arc<Statistics>,
}

impl Job {
    /// Create a pending job. Options are resolved against the module's
    /// defaults; validation is the caller's responsibility.
    pub(crate) fn new(
        module: Arc<Module>,
        files: Vec<FileRef>,
        raw_options: &serde_json::Map<String, serde_json::Value>,
        unlimited_downloads: bool,
        stats: Arc<Statistics>,
    ) -> Self {
        let options = ResolvedOptions::resolve(module.options(), raw_options);
        Self {
            id: JobId::new(),
            total_files: files.len(),
            module,
            options: Arc::new(options),
            files: RwLock::new(files),
            step: AtomicU8::new(JobStep::Pending.as_u8()),
            files_converted: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            error: Mutex::new(None),
            unlimited_downloads,
            created_at: Utc::now(),
            stats,
        }
    }

    /// Job identifier.
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Module converting this job.
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Resolved options.
    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// When the job was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current lifecycle position.
    pub fn step(&self) -> JobStep {
        JobStep::from_u8(self.step.load(Ordering::Acquire))
    }

    /// Snapshot of the job's progress.
    pub fn status(&self) -> JobStatus {
        JobStatus {
            step: self.step(),
            files_converted: self.files_converted.load(Ordering::Acquire),
            total_files: self.total_files,
            error: self.error_message(),
        }
    }

    /// Public projection of the job.
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            status: self.status(),
            module: self.module.label().to_string(),
            unlimited_downloads: self.unlimited_downloads,
            options: self.options.as_ref().clone(),
            created_at: self.created_at,
        }
    }

    /// Current file descriptors. Converted descriptors once done, the
    /// submitted ones before that.
    pub async fn files(&self) -> Vec<FileRef> {
        self.files.read().await.clone()
    }

    /// Run the conversion to completion.
    ///
    /// `on_step` is called after every settled file with a fresh status.
    /// On failure the job moves to `failed`, the message is recorded, and
    /// the error is also returned.
    pub async fn run(&self, on_step: Option<&StepFn<'_>>) -> Result<JobStatus, EngineError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(EngineError::JobAlreadyStarted { id: self.id });
        }

        self.set_step(JobStep::Running);
        info!(
            job_id = %self.id,
            module = %self.module.label(),
            files = self.total_files,
            "Job started"
        );

        let submitted = self.files().await;
        let on_file_done: &FileDoneFn<'_> = &|original: &FileRef, _converted: &FileRef| {
            self.files_converted.fetch_add(1, Ordering::AcqRel);
            self.stats.record_file(original.size);
            if let Some(callback) = on_step {
                callback(&self.status());
            }
        };

        let outcome = self
            .module
            .convert(&submitted, Arc::clone(&self.options), Some(on_file_done))
            .await;

        match outcome {
            Ok(converted) => {
                *self.files.write().await = converted;
                self.set_step(JobStep::Done);
                info!(
                    job_id = %self.id,
                    module = %self.module.label(),
                    files = self.total_files,
                    "Job completed"
                );
                Ok(self.status())
            }
            Err(e) => {
                self.record_error(e.to_string());
                self.set_step(JobStep::Failed);
                error!(
                    job_id = %self.id,
                    module = %self.module.label(),
                    converted = self.files_converted.load(Ordering::Acquire),
                    error = %e,
                    "Job failed"
                );
                Err(e.into())
            }
        }
    }

    fn set_step(&self, step: JobStep) {
        self.step.store(step.as_u8(), Ordering::Release);
    }

    fn record_error(&self, message: String) {
        let mut guard = match self.error.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(message);
    }

    fn error_message(&self) -> Option<String> {
        match self.error.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
