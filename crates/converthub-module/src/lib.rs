//! # converthub-module
//!
//! Conversion modules for ConvertHub. Provides:
//!
//! - Typed option descriptors with defaults and value validation
//! - Immutable module descriptors built and checked through [`ModuleBuilder`]
//! - The [`Transform`] seam integrators implement to do the actual conversion
//! - Parallel per-file conversion with mutate/replace contract enforcement
//! - A label-unique [`ModuleRegistry`]

pub mod error;
pub mod file;
pub mod module;
pub mod option;
pub mod registry;
pub mod transform;
pub mod validate;

pub use error::ModuleError;
pub use file::{FileRef, replace_file_extension};
pub use module::{Module, ModuleBuilder, ModuleInfo, ReturnMode};
pub use option::{ModuleOption, OptionConfig, OptionType, ResolvedOptions};
pub use registry::ModuleRegistry;
pub use transform::{ClosureTransform, Transform, TransformError};
