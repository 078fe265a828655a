//! Core types shared by every pipeline phase.
//!
//! - [`error`] - the [`UpdaterError`] taxonomy and user-facing [`ErrorContext`]

pub mod error;

pub use error::{ErrorClass, ErrorContext, UpdaterError, user_friendly_error};

/// Result alias for library operations that fail with a typed [`UpdaterError`].
pub type UpdaterResult<T> = Result<T, UpdaterError>;
