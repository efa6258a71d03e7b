//! Job execution engine for ConvertHub.
//!
//! This crate provides:
//! - The [`Job`] state machine binding a module, a batch of files, and
//!   resolved options
//! - Process-wide conversion [`Statistics`]
//! - The [`Orchestrator`], sole owner of registered modules and live jobs

pub mod error;
pub mod job;
pub mod orchestrator;
pub mod stats;

pub use error::EngineError;
pub use job::{Job, JobStatus, JobStep, JobSummary, StepFn};
pub use orchestrator::Orchestrator;
pub use stats::{Statistics, StatisticsSnapshot};
