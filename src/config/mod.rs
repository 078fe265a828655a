//! Configuration management for prelaunch
//!
//! Configuration has two layers:
//!
//! 1. [`UpdaterConfig`] - the on-disk `prelaunch.toml`, deserialized with serde,
//!    every field defaulted except the source URL
//! 2. [`RunContext`] - the resolved, read-only view of one run (absolute paths,
//!    parsed source URL, normalized archive extension)
//!
//! The CLI loads the file, applies flag overrides, and resolves a context once.
//! Pipeline components receive the context at construction and never consult
//! the environment themselves.

pub mod context;
pub mod updater;

pub use context::{RunContext, has_archive_extension, split_archive_extension};
pub use updater::{
    CONFIG_FILE_NAME, CONFIG_PATH_ENV, DownloadConfig, HttpConfig, RecordsConfig, SourceConfig,
    SourceKind, UpdaterConfig,
};
