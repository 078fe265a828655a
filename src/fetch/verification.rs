use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{debug, info};

use crate::core::{UpdaterError, UpdaterResult};

const READ_BUFFER: usize = 64 * 1024;

/// Verifies a downloaded archive against a published SHA-256 digest.
///
/// Runs only when the release source publishes a digest. It catches truncated
/// or corrupted downloads before anything is extracted.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the SHA-256 digest of a file as `sha256:<hex>`.
    pub async fn compute_sha256(file_path: &Path) -> UpdaterResult<String> {
        debug!("Computing SHA256 checksum for: {:?}", file_path);

        let mut file =
            File::open(file_path).await.map_err(|e| UpdaterError::fs("open", file_path, &e))?;

        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; READ_BUFFER];
        loop {
            let read =
                file.read(&mut buffer).await.map_err(|e| UpdaterError::fs("read", file_path, &e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
    }

    /// Verify a downloaded file against an expected digest.
    ///
    /// The expected value may carry a `sha256:` prefix and may be uppercase.
    /// A mismatch is reported as [`UpdaterError::TransportError`] for `url`.
    pub async fn verify_checksum(file_path: &Path, expected: &str, url: &str) -> UpdaterResult<()> {
        info!("Verifying checksum for: {:?}", file_path);

        let actual = Self::compute_sha256(file_path).await?;
        let expected = normalize(expected);

        if normalize(&actual) != expected {
            return Err(UpdaterError::TransportError {
                url: url.to_string(),
                reason: format!("checksum mismatch: expected sha256:{expected}, got {actual}"),
            });
        }

        info!("Checksum verification successful");
        Ok(())
    }
}

fn normalize(digest: &str) -> String {
    let digest = digest.trim().to_lowercase();
    digest.strip_prefix("sha256:").map(str::to_string).unwrap_or(digest)
}
