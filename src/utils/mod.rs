//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`path_validation`] - lexical containment checks for archive entry names
//! - [`progress`] - progress bars and spinners for downloads

pub mod path_validation;
pub mod progress;

pub use path_validation::resolve_within;
pub use progress::{ProgressBar, ProgressStyle};
