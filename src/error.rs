use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the whole launch engine.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Manifests ───────────────────────────────────────
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Cyclic inheritance: version {0} appears twice in its own chain")]
    CyclicInheritance(String),

    #[error("Inheritance chain of {id} exceeds {limit} manifests")]
    InheritanceTooDeep { id: String, limit: usize },

    #[error("Version {id} resolves without a {field}")]
    IncompleteVersion { id: String, field: &'static str },

    // ── Integrity ───────────────────────────────────────
    #[error("Integrity check failed for {path:?}: expected {expected}, got {actual}")]
    Integrity {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Downloads ───────────────────────────────────────
    #[error("{} artifact download(s) failed: {}", .failures.len(), summarize(.failures))]
    DownloadFailed { failures: Vec<FailedArtifact> },

    #[error("download cancelled")]
    Cancelled,

    // ── Launch assembly ─────────────────────────────────
    #[error("no value supplied for launch placeholder ${{{0}}}")]
    MissingSubstitution(String),

    // ── Libraries ───────────────────────────────────────
    #[error("Invalid library specifier: {0}")]
    InvalidSpecifier(String),

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Identity of one artifact that exhausted its retries, as reported inside
/// [`LauncherError::DownloadFailed`]. Successfully fetched siblings stay on
/// disk, so a later run only re-attempts the refs listed here.
#[derive(Debug, Clone)]
pub struct FailedArtifact {
    pub name: String,
    pub path: PathBuf,
    pub reason: String,
}

fn summarize(failures: &[FailedArtifact]) -> String {
    failures
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_failed_names_every_artifact() {
        let err = LauncherError::DownloadFailed {
            failures: vec![
                FailedArtifact {
                    name: "org.lwjgl:lwjgl:3.3.3".into(),
                    path: PathBuf::from("libraries/org/lwjgl/lwjgl/3.3.3/lwjgl-3.3.3.jar"),
                    reason: "HTTP 503".into(),
                },
                FailedArtifact {
                    name: "1.20.4.jar".into(),
                    path: PathBuf::from("versions/1.20.4/1.20.4.jar"),
                    reason: "connection refused".into(),
                },
            ],
        };

        let msg = err.to_string();
        assert!(msg.contains("2 artifact download(s) failed"));
        assert!(msg.contains("org.lwjgl:lwjgl:3.3.3"));
        assert!(msg.contains("1.20.4.jar"));
    }
}
