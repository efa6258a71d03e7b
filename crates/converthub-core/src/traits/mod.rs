//! Capability traits injected into the module and engine crates.

pub mod mime;

pub use mime::MimeLookup;
