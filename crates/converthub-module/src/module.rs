//! Conversion module descriptors and per-file conversion.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info};

use converthub_core::traits::mime::MimeLookup;
use converthub_core::types::ModuleId;

use crate::error::ModuleError;
use crate::file::{FileRef, replace_file_extension};
use crate::option::{ModuleOption, OptionConfig, ResolvedOptions, check_description, check_label};
use crate::transform::{ClosureTransform, Transform, TransformError};
use crate::validate;

/// How a module's transform reports its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnMode {
    /// The transform returns nothing; the module retags the file itself.
    #[default]
    Mutate,
    /// The transform returns a full replacement descriptor, which is validated.
    Replace,
}

/// Callback fired once per settled file with its before and after state.
///
/// The lifetime lets the callback borrow caller state for the duration of
/// one `convert` call.
pub type FileDoneFn<'a> = dyn Fn(&FileRef, &FileRef) + Send + Sync + 'a;

/// Public description of a module, as listed to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Unique identifier.
    pub id: ModuleId,
    /// Unique label.
    pub label: String,
    /// Human-readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Accepted input media types.
    pub from: Vec<String>,
    /// Output media type.
    pub to: String,
    /// Declared options.
    pub options: Vec<ModuleOption>,
    /// Return mode of the transform.
    pub return_mode: ReturnMode,
}

/// An immutable, validated conversion capability.
///
/// Built once at startup through [`Module::builder`] and shared read-only
/// by every job that references it.
#[derive(Debug)]
pub struct Module {
    id: ModuleId,
    label: String,
    description: Option<String>,
    from: Vec<String>,
    to: String,
    options: Vec<ModuleOption>,
    transform: Arc<dyn Transform>,
    return_mode: ReturnMode,
    mime: Arc<dyn MimeLookup>,
}

impl Module {
    /// Start building a module with the given label.
    pub fn builder(label: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder::new(label)
    }

    /// Unique identifier.
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Unique label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Accepted input media types.
    pub fn from_types(&self) -> &[String] {
        &self.from
    }

    /// Output media type.
    pub fn to_type(&self) -> &str {
        &self.to
    }

    /// Declared options, in declaration order.
    pub fn options(&self) -> &[ModuleOption] {
        &self.options
    }

    /// Look up a declared option by label.
    pub fn option(&self, label: &str) -> Option<&ModuleOption> {
        self.options.iter().find(|o| o.label() == label)
    }

    /// Return mode of the transform.
    pub fn return_mode(&self) -> ReturnMode {
        self.return_mode
    }

    /// Media type lookup this module was built with.
    pub fn mime_lookup(&self) -> &dyn MimeLookup {
        self.mime.as_ref()
    }

    /// Whether this module accepts files of the given media type.
    pub fn converts_from(&self, mime: &str) -> bool {
        self.from.iter().any(|m| m == mime)
    }

    /// Whether this module produces files of the given media type.
    pub fn converts_to(&self, mime: &str) -> bool {
        self.to == mime
    }

    /// Public description of this module.
    pub fn info(&self) -> ModuleInfo {
        ModuleInfo {
            id: self.id,
            label: self.label.clone(),
            description: self.description.clone(),
            from: self.from.clone(),
            to: self.to.clone(),
            options: self.options.clone(),
            return_mode: self.return_mode,
        }
    }

    /// Convert every file in parallel and wait for all of them.
    ///
    /// One task is spawned per file. As each task finishes, its output is
    /// checked against the module's return mode and `on_file_done` is called
    /// with the original and converted descriptor. Callbacks fire in
    /// completion order, never concurrently. The first failure is returned
    /// and the remaining tasks are aborted; files already settled are not
    /// rolled back.
    pub async fn convert(
        &self,
        files: &[FileRef],
        options: Arc<ResolvedOptions>,
        on_file_done: Option<&FileDoneFn<'_>>,
    ) -> Result<Vec<FileRef>, ModuleError> {
        let mut tasks = JoinSet::new();

        for (index, file) in files.iter().cloned().enumerate() {
            let transform = Arc::clone(&self.transform);
            let options = Arc::clone(&options);
            tasks.spawn(async move {
                let outcome = transform.apply(&file, &options).await;
                (index, file, outcome)
            });
        }

        let mut converted: Vec<Option<FileRef>> = vec![None; files.len()];

        while let Some(joined) = tasks.join_next().await {
            let (index, original, outcome) = joined?;
            let updated = self.settle(&original, outcome)?;

            debug!(
                module = %self.label,
                from = %original.original_name,
                to = %updated.original_name,
                "File converted"
            );

            if let Some(callback) = on_file_done {
                callback(&original, &updated);
            }
            converted[index] = Some(updated);
        }

        Ok(converted.into_iter().flatten().collect())
    }

    /// Check one transform outcome against the return mode and produce the
    /// file's new state.
    fn settle(
        &self,
        original: &FileRef,
        outcome: Result<Option<FileRef>, TransformError>,
    ) -> Result<FileRef, ModuleError> {
        let output = outcome.map_err(|e| ModuleError::TransformFailed {
            module: self.label.clone(),
            file: original.original_name.clone(),
            reason: e.to_string(),
        })?;

        let violation = |reason: String| ModuleError::ContractViolation {
            module: self.label.clone(),
            file: original.original_name.clone(),
            reason,
        };

        match (self.return_mode, output) {
            (ReturnMode::Mutate, None) => Ok(self.retag(original)),
            (ReturnMode::Mutate, Some(_)) => Err(violation(
                "transform returned a file descriptor, but the module mutates files in place"
                    .to_string(),
            )),
            (ReturnMode::Replace, Some(replacement)) => {
                validate::validate_replacement(self, &replacement).map_err(violation)?;
                Ok(replacement)
            }
            (ReturnMode::Replace, None) => Err(violation(
                "transform returned nothing, but the module replaces files".to_string(),
            )),
        }
    }

    /// Retag a file's metadata to this module's output type.
    fn retag(&self, original: &FileRef) -> FileRef {
        let mut file = original.clone();
        file.mime_type = self.to.clone();

        if let Some(charset) = self.mime.charset_of(&self.to) {
            file.encoding = charset;
        }
        if let Some(extension) = self.mime.extension_of(&self.to) {
            file.original_name = replace_file_extension(&file.original_name, &extension);
        }

        file
    }
}

/// Builder that validates and freezes a [`Module`].
#[derive(Debug)]
pub struct ModuleBuilder {
    label: String,
    description: Option<String>,
    from: Vec<String>,
    to: Option<String>,
    options: Vec<OptionConfig>,
    transform: Option<Arc<dyn Transform>>,
    return_mode: ReturnMode,
}

impl ModuleBuilder {
    /// Start a module definition.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
            from: Vec::new(),
            to: None,
            options: Vec::new(),
            transform: None,
            return_mode: ReturnMode::default(),
        }
    }

    /// Set the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add an accepted input media type.
    pub fn from(mut self, mime: impl Into<String>) -> Self {
        self.from.push(mime.into());
        self
    }

    /// Add several accepted input media types.
    pub fn from_many<I, S>(mut self, mimes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.from.extend(mimes.into_iter().map(Into::into));
        self
    }

    /// Set the output media type.
    pub fn to(mut self, mime: impl Into<String>) -> Self {
        self.to = Some(mime.into());
        self
    }

    /// Declare an option.
    pub fn option(mut self, option: OptionConfig) -> Self {
        self.options.push(option);
        self
    }

    /// Set the transform.
    pub fn transform(mut self, transform: impl Transform + 'static) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Set the transform from an async closure.
    pub fn transform_fn<F, Fut>(self, func: F) -> Self
    where
        F: Fn(FileRef, Arc<ResolvedOptions>) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<Option<FileRef>, TransformError>>
            + Send
            + 'static,
    {
        let name = self.label.clone();
        self.transform(ClosureTransform::new(name, func))
    }

    /// Set the return mode.
    pub fn return_mode(mut self, mode: ReturnMode) -> Self {
        self.return_mode = mode;
        self
    }

    /// Validate the definition and freeze it into a [`Module`].
    ///
    /// Media types are checked against `mime` unless the module replaces
    /// files, in which case it vouches for its own output shape.
    pub fn build(self, mime: Arc<dyn MimeLookup>) -> Result<Module, ModuleError> {
        let label = self.label;
        let invalid = |field: &'static str, reason: String| ModuleError::InvalidModuleConfig {
            module: label.clone(),
            field,
            reason,
        };

        check_label(&label).map_err(|r| invalid("label", r))?;
        check_description(self.description.as_deref()).map_err(|r| invalid("description", r))?;

        let checks_types = self.return_mode == ReturnMode::Mutate;

        if self.from.is_empty() {
            return Err(invalid("from", "at least one media type is required".to_string()));
        }
        if checks_types {
            if let Some(unknown) = self.from.iter().find(|m| !mime.is_known_type(m)) {
                return Err(invalid(
                    "from",
                    format!("'{unknown}' is not a recognized media type"),
                ));
            }
        }

        let to = self
            .to
            .ok_or_else(|| invalid("to", "a target media type is required".to_string()))?;
        if checks_types && !mime.is_known_type(&to) {
            return Err(invalid("to", format!("'{to}' is not a recognized media type")));
        }

        let transform = self
            .transform
            .ok_or_else(|| invalid("transform", "a transform is required".to_string()))?;

        let mut seen = HashSet::new();
        let mut options = Vec::with_capacity(self.options.len());
        for config in self.options {
            if !seen.insert(config.label.clone()) {
                return Err(invalid(
                    "options",
                    format!("duplicate option label '{}'", config.label),
                ));
            }
            options.push(ModuleOption::new(config)?);
        }

        info!(
            module = %label,
            from = ?self.from,
            to = %to,
            return_mode = ?self.return_mode,
            options = options.len(),
            "Module built"
        );

        Ok(Module {
            id: ModuleId::new(),
            label,
            description: self.description,
            from: self.from,
            to,
            options,
            transform,
            return_mode: self.return_mode,
            mime,
        })
    }
}
