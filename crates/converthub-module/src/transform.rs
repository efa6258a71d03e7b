//! The transform seam integrators implement to convert file contents.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::file::FileRef;
use crate::option::ResolvedOptions;

/// Error type a transform may fail with. Opaque to the engine.
pub type TransformError = Box<dyn std::error::Error + Send + Sync>;

/// Per-file conversion logic supplied by a module author.
///
/// The return value must agree with the module's [`ReturnMode`]:
/// `Mutate` modules return `Ok(None)` and leave metadata retagging to the
/// module, `Replace` modules return `Ok(Some(file))` with the full new
/// descriptor.
///
/// [`ReturnMode`]: crate::module::ReturnMode
#[async_trait]
pub trait Transform: Send + Sync + std::fmt::Debug {
    /// Convert one file.
    async fn apply(
        &self,
        file: &FileRef,
        options: &ResolvedOptions,
    ) -> Result<Option<FileRef>, TransformError>;
}

type BoxedTransformFn = Arc<
    dyn Fn(
            FileRef,
            Arc<ResolvedOptions>,
        ) -> Pin<Box<dyn Future<Output = Result<Option<FileRef>, TransformError>> + Send>>
        + Send
        + Sync,
>;

/// A closure-based transform for quick module creation.
pub struct ClosureTransform {
    /// Name shown in debug output.
    name: String,
    /// Transform function.
    func: BoxedTransformFn,
}

impl std::fmt::Debug for ClosureTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureTransform")
            .field("name", &self.name)
            .field("func", &"<closure>")
            .finish()
    }
}

impl ClosureTransform {
    /// Wrap an async closure. The closure receives its own copy of the file
    /// descriptor and a shared handle to the resolved options.
    pub fn new<F, Fut>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(FileRef, Arc<ResolvedOptions>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<FileRef>, TransformError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(move |file, options| Box::pin(func(file, options))),
        }
    }
}

#[async_trait]
impl Transform for ClosureTransform {
    async fn apply(
        &self,
        file: &FileRef,
        options: &ResolvedOptions,
    ) -> Result<Option<FileRef>, TransformError> {
        (self.func)(file.clone(), Arc::new(options.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_closure_transform_passes_inputs() {
        let transform = ClosureTransform::new("upper", |mut file: FileRef, _options| async move {
            file.original_name = file.original_name.to_uppercase();
            Ok::<_, TransformError>(Some(file))
        });

        let file = FileRef::new("a.txt", "text/plain", "/tmp/a", 1);
        let out = transform
            .apply(&file, &ResolvedOptions::default())
            .await
            .expect("apply")
            .expect("replacement");
        assert_eq!(out.original_name, "A.TXT");
        assert_eq!(file.original_name, "a.txt");
    }

    #[tokio::test]
    async fn test_closure_transform_error() {
        let transform = ClosureTransform::new("broken", |_file, _options| async move {
            Err::<Option<FileRef>, TransformError>("disk full".into())
        });
        let file = FileRef::new("a.txt", "text/plain", "/tmp/a", 1);
        let err = transform
            .apply(&file, &ResolvedOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }
}
