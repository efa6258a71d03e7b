//! File conversion command.

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use serde_json::{Map, Value};
use tabled::Tabled;
use tracing::{debug, warn};

use converthub_core::error::AppError;
use converthub_engine::{JobStatus, Orchestrator, StepFn};
use converthub_module::{FileRef, ResolvedOptions};

use crate::output::{self, OutputFormat};

/// Arguments for the convert command
#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Label of the module to convert with
    #[arg(short, long)]
    pub module: String,

    /// Module option as `key=value`; values are read as JSON, otherwise as text
    #[arg(short = 'o', long = "option", value_parser = parse_option)]
    pub options: Vec<(String, Value)>,

    /// Directory the converted files are written to
    #[arg(long, default_value = "converted")]
    pub out_dir: PathBuf,

    /// Files to convert
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Converted file display row
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File name
    name: String,
    /// Media type
    mimetype: String,
    /// Encoding
    encoding: String,
    /// Size
    size: String,
    /// Stored path
    path: String,
}

impl From<&FileRef> for FileRow {
    fn from(file: &FileRef) -> Self {
        Self {
            name: file.original_name.clone(),
            mimetype: file.mime_type.clone(),
            encoding: file.encoding.clone(),
            size: output::format_bytes(file.size),
            path: file.path.display().to_string(),
        }
    }
}

/// Parse a `key=value` option argument
fn parse_option(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("missing option name in '{raw}'"));
    }

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Prefix of the hidden copies inputs are converted from
const STAGING_PREFIX: &str = ".converthub-staging";

/// Execute the convert command
pub async fn execute(
    args: &ConvertArgs,
    orchestrator: &Orchestrator,
    format: OutputFormat,
) -> Result<(), AppError> {
    tokio::fs::create_dir_all(&args.out_dir).await?;

    let mut files = Vec::with_capacity(args.files.len());
    for (index, source) in args.files.iter().enumerate() {
        match stage(source, &args.out_dir, index).await {
            Ok(file) => files.push(file),
            Err(e) => {
                discard(&files).await;
                return Err(e);
            }
        }
    }
    let staged = files.clone();

    match run(args, orchestrator, format, files).await {
        Ok(()) => Ok(()),
        Err(e) => {
            discard(&staged).await;
            Err(e)
        }
    }
}

/// Submit and run the job, then print its results
async fn run(
    args: &ConvertArgs,
    orchestrator: &Orchestrator,
    format: OutputFormat,
    files: Vec<FileRef>,
) -> Result<(), AppError> {
    let raw_options: Map<String, Value> = args.options.iter().cloned().collect();
    let job = orchestrator
        .submit_job(files, &args.module, &raw_options)
        .await?;

    if format == OutputFormat::Table {
        println!(
            "Job {} created ({} files, module {})",
            job.id(),
            job.status().total_files,
            args.module
        );
    }

    let on_progress: &StepFn<'_> = &|status: &JobStatus| {
        if format == OutputFormat::Table {
            println!(
                "  [{}/{}] converted",
                status.files_converted, status.total_files
            );
        }
    };
    orchestrator.start_job(job.id(), Some(on_progress)).await?;

    let summary = orchestrator.job_summary(job.id()).await?;
    let mut results = orchestrator.take_results(job.id()).await?;
    for file in &mut results {
        settle_name(file).await?;
    }
    let statistics = orchestrator.statistics();

    match format {
        OutputFormat::Json => output::print_json(&serde_json::json!({
            "job": summary,
            "files": results,
            "statistics": statistics,
        })),
        OutputFormat::Table => {
            output::print_success(&format!("Job {} {}", summary.id, summary.status.step));
            output::print_kv("Options", &describe_options(&summary.options));
            let rows: Vec<FileRow> = results.iter().map(FileRow::from).collect();
            output::print_list(&rows, format);
            println!("Statistics");
            output::print_kv("Initialized at", &statistics.initialized_at.to_rfc3339());
            output::print_kv("Files converted", &statistics.files_converted.to_string());
            output::print_kv(
                "Data converted",
                &format!("{:.3} MB", statistics.data_converted_mb),
            );
        }
    }

    Ok(())
}

/// Resolved options as `key=value` pairs
fn describe_options(options: &ResolvedOptions) -> String {
    if options.is_empty() {
        return "none".to_string();
    }
    options
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Copy a source file to a hidden staging name in the output directory
/// and describe it. The source itself is never written.
async fn stage(source: &Path, out_dir: &Path, index: usize) -> Result<FileRef, AppError> {
    if !source.is_file() {
        return Err(AppError::not_found(format!(
            "File not found: {}",
            source.display()
        )));
    }

    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AppError::validation(format!("Invalid file name: {}", source.display())))?
        .to_string();

    let mime = mime_guess::from_path(source)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    let destination = out_dir.join(format!("{STAGING_PREFIX}-{index}-{name}"));
    if tokio::fs::try_exists(&destination).await?
        && tokio::fs::canonicalize(&destination).await? == tokio::fs::canonicalize(source).await?
    {
        return Err(AppError::validation(format!(
            "Refusing to stage '{}' onto itself",
            source.display()
        )));
    }

    let size = tokio::fs::copy(source, &destination).await?;

    debug!(source = %source.display(), staged = %destination.display(), %mime, "File staged");
    Ok(FileRef::new(name, mime, destination, size))
}

/// Remove staged copies left behind by a failed run
async fn discard(files: &[FileRef]) {
    for file in files {
        if let Err(e) = tokio::fs::remove_file(&file.path).await {
            warn!(path = %file.path.display(), error = %e, "Failed to remove staged file");
        }
    }
}

/// Move a converted file from its staging name to its converted name.
/// Existing files are never replaced; a numbered name is picked instead.
async fn settle_name(file: &mut FileRef) -> Result<(), AppError> {
    let name = free_name(&file.destination, &file.original_name).await?;
    let target = file.destination.join(&name);

    tokio::fs::rename(&file.path, &target).await?;
    file.original_name = name.clone();
    file.file_name = name;
    file.path = target;
    Ok(())
}

/// First name in `dir` derived from `name` that no file uses yet
/// (`a.txt`, `a-1.txt`, `a-2.txt`, ...)
async fn free_name(dir: &Path, name: &str) -> Result<String, AppError> {
    if !tokio::fs::try_exists(dir.join(name)).await? {
        return Ok(name.to_string());
    }

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
        _ => (name, None),
    };

    for n in 1.. {
        let candidate = match extension {
            Some(extension) => format!("{stem}-{n}.{extension}"),
            None => format!("{stem}-{n}"),
        };
        if !tokio::fs::try_exists(dir.join(&candidate)).await? {
            return Ok(candidate);
        }
    }

    Err(AppError::storage(format!("No free file name for '{name}'")))
}
