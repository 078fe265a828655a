//! The `prelaunch.toml` configuration file.
//!
//! ```toml
//! [source]
//! kind = "metadata"                       # or "listing" (default)
//! url = "https://example.com/plugin/latest.json"
//!
//! [download]
//! dir = ".prelaunch/downloads"            # relative to the install root
//! extension = ".zip"
//!
//! [http]
//! user_agent = "prelaunch/0.1.0"
//! client_id = "prelaunch"
//! accept = "text/html,application/json;q=0.9,*/*;q=0.8"
//!
//! [records]
//! success_marker = "prelaunch-success.txt"
//! error_log = "prelaunch-error.log"
//! ```
//!
//! Every field except `source.url` has a default, so a minimal file only needs
//! the `[source]` table. The file is located in this order:
//!
//! 1. an explicit path (`--config`)
//! 2. the `PRELAUNCH_CONFIG_PATH` environment variable
//! 3. `prelaunch.toml` in the install root
//!
//! A missing file at step 3 is not an error; the defaults apply and the source
//! URL must then come from `--source-url`.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// File name looked up in the install root.
pub const CONFIG_FILE_NAME: &str = "prelaunch.toml";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "PRELAUNCH_CONFIG_PATH";

/// Which [`crate::source::ReleaseLocator`] strategy reads the update source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// HTML page with anchors pointing at archives.
    #[default]
    Listing,
    /// JSON-like document with `version` and `url` fields.
    Metadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_dir")]
    pub dir: PathBuf,

    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            dir: default_download_dir(),
            extension: default_extension(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_accept")]
    pub accept: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            client_id: default_client_id(),
            accept: default_accept(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordsConfig {
    #[serde(default = "default_success_marker")]
    pub success_marker: PathBuf,

    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            success_marker: default_success_marker(),
            error_log: default_error_log(),
        }
    }
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".prelaunch").join("downloads")
}

fn default_extension() -> String {
    ".zip".to_string()
}

fn default_user_agent() -> String {
    format!("prelaunch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_client_id() -> String {
    "prelaunch".to_string()
}

fn default_accept() -> String {
    "text/html,application/json;q=0.9,*/*;q=0.8".to_string()
}

fn default_success_marker() -> PathBuf {
    PathBuf::from("prelaunch-success.txt")
}

fn default_error_log() -> PathBuf {
    PathBuf::from("prelaunch-error.log")
}

/// Top-level contents of `prelaunch.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdaterConfig {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub records: RecordsConfig,
}

impl UpdaterConfig {
    /// Locate and load the configuration for an install root.
    ///
    /// An explicit path must exist. Without one, the environment variable and
    /// then `<install_root>/prelaunch.toml` are tried, falling back to defaults.
    pub async fn load(install_root: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            return Self::load_from(path).await;
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::load_from(&path).await;
            }
            debug!("{} points at missing file {}", CONFIG_PATH_ENV, path.display());
        }

        let path = install_root.join(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, install_root.display());
            Ok(Self::default())
        }
    }

    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
