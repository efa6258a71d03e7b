//! Orchestrator: owns registered modules and live jobs.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use converthub_core::config::EngineConfig;
use converthub_core::mime::{self, MimeDescription};
use converthub_core::traits::mime::MimeLookup;
use converthub_core::types::JobId;
use converthub_module::{FileRef, Module, ModuleBuilder, ModuleInfo, ModuleRegistry};

use crate::error::EngineError;
use crate::job::{Job, JobStatus, JobStep, JobSummary, StepFn};
use crate::stats::{Statistics, StatisticsSnapshot};

/// Central coordinator for conversion modules and jobs.
///
/// Modules are registered once at startup. Jobs are created from
/// submissions, run on request, and removed once their results are taken
/// or they are explicitly deleted.
#[derive(Debug)]
pub struct Orchestrator {
    /// Engine settings.
    config: EngineConfig,
    /// Media type lookup handed to every module built here.
    mime: Arc<dyn MimeLookup>,
    /// Registered modules.
    modules: ModuleRegistry,
    /// Live jobs.
    jobs: RwLock<HashMap<JobId, Arc<Job>>>,
    /// Conversion counters shared with every job.
    stats: Arc<Statistics>,
}

impl Orchestrator {
    /// Create an orchestrator with no modules and no jobs.
    pub fn new(config: EngineConfig, mime: Arc<dyn MimeLookup>) -> Self {
        info!(
            clear_job_on_download = config.clear_job_on_download,
            file_size_limit_bytes = ?config.file_size_limit_bytes,
            "Orchestrator initialized"
        );
        Self {
            config,
            mime,
            modules: ModuleRegistry::new(),
            jobs: RwLock::new(HashMap::new()),
            stats: Arc::new(Statistics::new()),
        }
    }

    /// Engine settings in effect.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Media type lookup in effect.
    pub fn mime_lookup(&self) -> Arc<dyn MimeLookup> {
        Arc::clone(&self.mime)
    }

    // ── Modules ──────────────────────────────────────────────────

    /// Build a module definition against this orchestrator's media type
    /// lookup and register it.
    pub async fn register_module(&self, builder: ModuleBuilder) -> Result<Arc<Module>, EngineError> {
        let module = builder.build(Arc::clone(&self.mime))?;
        self.register(module).await
    }

    /// Register an already-built module. Labels are unique.
    pub async fn register(&self, module: Module) -> Result<Arc<Module>, EngineError> {
        Ok(self.modules.register(module).await?)
    }

    /// Find a registered module by label.
    pub async fn find_module(&self, label: &str) -> Option<Arc<Module>> {
        self.modules.get(label).await
    }

    /// Public descriptions of all modules, sorted by label.
    pub async fn list_modules(&self) -> Vec<ModuleInfo> {
        self.modules.list().await
    }

    /// Number of registered modules.
    pub async fn module_count(&self) -> usize {
        self.modules.count().await
    }

    /// Describe a media type string.
    pub fn describe_mime_type(&self, value: &str) -> MimeDescription {
        mime::describe(self.mime.as_ref(), value)
    }

    // ── Jobs ─────────────────────────────────────────────────────

    /// Create a pending job for a registered module.
    ///
    /// Every key in `raw_options` must name a declared option and pass its
    /// validation, and every required option must be present. The job is
    /// added to the job set before it is returned.
    pub async fn create_job(
        &self,
        files: Vec<FileRef>,
        module: &Arc<Module>,
        raw_options: &Map<String, Value>,
    ) -> Result<Arc<Job>, EngineError> {
        if !self.modules.contains(module).await {
            return Err(EngineError::InvalidModuleReference {
                label: module.label().to_string(),
            });
        }

        for (key, value) in raw_options {
            let option = module.option(key).ok_or_else(|| EngineError::UnknownOption {
                module: module.label().to_string(),
                label: key.clone(),
            })?;
            option.validate(Some(value))?;
        }
        for option in module.options() {
            if !raw_options.contains_key(option.label()) {
                option.validate(None)?;
            }
        }

        let job = Arc::new(Job::new(
            Arc::clone(module),
            files,
            raw_options,
            !self.config.clear_job_on_download,
            Arc::clone(&self.stats),
        ));

        self.jobs.write().await.insert(job.id(), Arc::clone(&job));

        info!(
            job_id = %job.id(),
            module = %module.label(),
            files = job.status().total_files,
            "Job created"
        );

        Ok(job)
    }

    /// Validate an inbound submission and create a job for it.
    ///
    /// File media types are normalized first. The batch must be non-empty,
    /// within the configured size limit, and accepted by the module.
    pub async fn submit_job(
        &self,
        mut files: Vec<FileRef>,
        module_label: &str,
        raw_options: &Map<String, Value>,
    ) -> Result<Arc<Job>, EngineError> {
        let module = self
            .find_module(module_label)
            .await
            .ok_or_else(|| EngineError::UnknownModule {
                label: module_label.to_string(),
            })?;

        if files.is_empty() {
            return Err(EngineError::EmptyFileList);
        }

        for file in &mut files {
            file.normalize_mime_type();
        }

        if let Some(limit) = self.config.file_size_limit_bytes {
            let total: u64 = files.iter().map(|f| f.size).sum();
            if total > limit {
                warn!(module = %module_label, total, limit, "Submission over size limit");
                return Err(EngineError::FileSizeLimitExceeded { total, limit });
            }
        }

        if let Some(file) = files.iter().find(|f| !module.converts_from(&f.mime_type)) {
            return Err(EngineError::UnsupportedMimeType {
                module: module.label().to_string(),
                mime: file.mime_type.clone(),
                supported: module.from_types().to_vec(),
            });
        }

        self.create_job(files, &module, raw_options).await
    }

    /// Run a job to completion.
    pub async fn start_job(
        &self,
        id: JobId,
        on_progress: Option<&StepFn<'_>>,
    ) -> Result<JobStatus, EngineError> {
        let job = self
            .find_job(id)
            .await
            .ok_or(EngineError::JobNotFound { id })?;
        job.run(on_progress).await
    }

    /// Find a job by identifier.
    pub async fn find_job(&self, id: JobId) -> Option<Arc<Job>> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Public projection of one job.
    pub async fn job_summary(&self, id: JobId) -> Result<JobSummary, EngineError> {
        self.find_job(id)
            .await
            .map(|job| job.summary())
            .ok_or(EngineError::JobNotFound { id })
    }

    /// Public projections of every live job, oldest first.
    pub async fn list_jobs(&self) -> Vec<JobSummary> {
        let jobs = self.jobs.read().await;
        let mut summaries: Vec<JobSummary> = jobs.values().map(|j| j.summary()).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Number of live jobs.
    pub async fn job_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Remove a finished job.
    pub async fn delete_job(&self, id: JobId) -> Result<(), EngineError> {
        let mut jobs = self.jobs.write().await;
        let job = jobs.get(&id).ok_or(EngineError::JobNotFound { id })?;

        let step = job.step();
        if !step.is_terminal() {
            return Err(EngineError::JobNotTerminal { id, step });
        }

        jobs.remove(&id);
        debug!(job_id = %id, step = %step, "Job deleted");
        Ok(())
    }

    /// Remove every done or failed job. Returns how many were removed.
    pub async fn delete_terminal_jobs(&self) -> usize {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|_, job| !job.step().is_terminal());
        let removed = before - jobs.len();
        if removed > 0 {
            info!(removed, "Terminal jobs deleted");
        }
        removed
    }

    /// Hand out a done job's converted files.
    ///
    /// With `clear_job_on_download` the job leaves the job set in the same
    /// step, so a second call reports the job as missing.
    pub async fn take_results(&self, id: JobId) -> Result<Vec<FileRef>, EngineError> {
        let job = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get(&id).cloned().ok_or(EngineError::JobNotFound { id })?;

            match job.step() {
                JobStep::Done => {}
                JobStep::Failed => {
                    return Err(EngineError::JobFailed {
                        id,
                        reason: job.status().error.unwrap_or_default(),
                    });
                }
                step => return Err(EngineError::JobNotTerminal { id, step }),
            }

            if self.config.clear_job_on_download {
                jobs.remove(&id);
            }
            job
        };

        let files = job.files().await;
        info!(
            job_id = %id,
            files = files.len(),
            cleared = self.config.clear_job_on_download,
            "Job results taken"
        );
        Ok(files)
    }

    /// Snapshot of the conversion counters.
    pub fn statistics(&self) -> StatisticsSnapshot {
        self.stats.snapshot()
    }
}
