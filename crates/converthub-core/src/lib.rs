//! # converthub-core
//!
//! Core crate for ConvertHub. Contains the unified error system, typed
//! identifiers, configuration schemas, and the media type lookup
//! capability shared by the module and engine crates.
//!
//! This crate has **no** internal dependencies on other ConvertHub crates.

pub mod config;
pub mod error;
pub mod mime;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use mime::GuessMimeLookup;
pub use result::AppResult;
pub use traits::mime::MimeLookup;
