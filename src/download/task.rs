// ─── Download Task ───
// Per-artifact pipeline: verify the local copy, fetch with bounded retry,
// re-verify every attempt, write atomically.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{FailedArtifact, LauncherError, LauncherResult};
use crate::plan::ArtifactRef;

use super::DownloadConfig;

/// Terminal state of one task. `Skipped` only appears after a cancel was
/// requested before the task started.
#[derive(Debug)]
pub(crate) enum TaskOutcome {
    /// Local copy matched expectations; no network touched.
    Verified { name: String },
    Fetched {
        name: String,
        bytes: u64,
        attempts: u32,
    },
    Failed(FailedArtifact),
    Skipped { name: String },
}

impl TaskOutcome {
    pub(crate) fn skipped(artifact: &ArtifactRef) -> Self {
        TaskOutcome::Skipped {
            name: artifact.name.clone(),
        }
    }
}

pub(crate) async fn run(
    client: &reqwest::Client,
    config: &DownloadConfig,
    cancel: &CancellationToken,
    artifact: &ArtifactRef,
    root: &Path,
) -> TaskOutcome {
    let dest = root.join(&artifact.path);

    match verify_local(&dest, artifact).await {
        Ok(true) => {
            debug!("Verified cached artifact: {}", artifact.name);
            return TaskOutcome::Verified {
                name: artifact.name.clone(),
            };
        }
        Ok(false) => {}
        Err(e) => {
            // Unreadable local state: treat like a miss and refetch.
            debug!("Could not verify {:?}: {}", dest, e);
        }
    }

    if artifact.url.is_empty() {
        return TaskOutcome::Failed(FailedArtifact {
            name: artifact.name.clone(),
            path: artifact.path.clone(),
            reason: "no source URL and no valid local copy".into(),
        });
    }

    let mut last_error = String::new();
    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            if cancel.is_cancelled() {
                break;
            }
            let backoff = config.initial_backoff * 2u32.pow(attempt - 2);
            tokio::time::sleep(backoff).await;
        }

        match fetch_once(client, artifact, &dest).await {
            Ok(bytes) => {
                return TaskOutcome::Fetched {
                    name: artifact.name.clone(),
                    bytes,
                    attempts: attempt,
                };
            }
            Err(e) => {
                warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt, config.max_attempts, artifact.name, e
                );
                last_error = e.to_string();
            }
        }
    }

    TaskOutcome::Failed(FailedArtifact {
        name: artifact.name.clone(),
        path: artifact.path.clone(),
        reason: last_error,
    })
}

/// Size and content-hash check of an existing file. A ref without any
/// expectation is satisfied by mere presence.
pub(crate) async fn verify_local(dest: &Path, artifact: &ArtifactRef) -> LauncherResult<bool> {
    let metadata = match tokio::fs::metadata(dest).await {
        Ok(m) => m,
        Err(_) => return Ok(false),
    };
    if !metadata.is_file() {
        return Ok(false);
    }

    if let Some(expected_size) = artifact.size {
        if metadata.len() != expected_size {
            debug!(
                "Size mismatch for {:?}: expected {}, found {}",
                dest,
                expected_size,
                metadata.len()
            );
            return Ok(false);
        }
    }

    if let Some(expected) = &artifact.sha1 {
        let bytes = tokio::fs::read(dest).await.map_err(|e| LauncherError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;
        let actual = sha1_hex(&bytes);
        if &actual != expected {
            debug!(
                "Hash mismatch for {:?}: expected {}, got {}",
                dest, expected, actual
            );
            return Ok(false);
        }
    }

    Ok(true)
}

/// One fetch attempt: download to memory, verify, then write atomically via
/// a unique temp file and rename so a crash mid-write can never leave a
/// partial file that passes for a cached artifact.
async fn fetch_once(
    client: &reqwest::Client,
    artifact: &ArtifactRef,
    dest: &Path,
) -> LauncherResult<u64> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| LauncherError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let response = client.get(&artifact.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(LauncherError::HttpStatus {
            url: artifact.url.clone(),
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await?;

    if let Some(expected_size) = artifact.size {
        if bytes.len() as u64 != expected_size {
            return Err(LauncherError::Integrity {
                path: dest.to_path_buf(),
                expected: format!("{} bytes", expected_size),
                actual: format!("{} bytes", bytes.len()),
            });
        }
    }
    if let Some(expected) = &artifact.sha1 {
        let actual = sha1_hex(&bytes);
        if &actual != expected {
            return Err(LauncherError::Integrity {
                path: dest.to_path_buf(),
                expected: expected.clone(),
                actual,
            });
        }
    }

    let tmp = temp_path(dest);
    tokio::fs::write(&tmp, &bytes)
        .await
        .map_err(|e| LauncherError::Io {
            path: tmp.clone(),
            source: e,
        })?;
    if let Err(e) = tokio::fs::rename(&tmp, dest).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(LauncherError::Io {
            path: dest.to_path_buf(),
            source: e,
        });
    }

    debug!("Downloaded: {} -> {:?}", artifact.url, dest);
    Ok(bytes.len() as u64)
}

fn temp_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    dest.with_file_name(format!("{}.{}.part", file_name, Uuid::new_v4().simple()))
}

pub(crate) fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
