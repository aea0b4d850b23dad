//! Core types shared across the isofit workspace.
//!
//! This crate holds the error taxonomy and the immutable fit-result value
//! types; it has no numerical dependencies so every other crate can depend
//! on it freely.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Chi2FitResult, MlFitResult};
