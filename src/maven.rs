use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{LauncherError, LauncherResult};

/// A parsed library coordinate.
///
/// Supported formats:
///   `group:artifact:version`
///   `group:artifact:version:classifier`
///   `group:artifact:version:classifier@extension`
///   `group:artifact:version@extension`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LibrarySpecifier {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    /// File extension. Defaults to `"jar"`.
    pub extension: String,
}

impl LibrarySpecifier {
    pub fn parse(spec: &str) -> LauncherResult<Self> {
        // Split off @extension first
        let (spec_part, extension) = match spec.rfind('@') {
            Some(idx) => (&spec[..idx], Some(&spec[idx + 1..])),
            None => (spec, None),
        };

        let parts: Vec<&str> = spec_part.split(':').collect();

        match parts.len() {
            3 => Ok(Self {
                group: parts[0].to_string(),
                artifact: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: None,
                extension: extension.unwrap_or("jar").to_string(),
            }),
            4 => Ok(Self {
                group: parts[0].to_string(),
                artifact: parts[1].to_string(),
                version: parts[2].to_string(),
                classifier: Some(parts[3].to_string()),
                extension: extension.unwrap_or("jar").to_string(),
            }),
            _ => Err(LauncherError::InvalidSpecifier(spec.to_string())),
        }
    }

    /// Identity used when a child manifest overrides a parent's library:
    /// same group, artifact and classifier. The version is deliberately
    /// excluded so a child can pin a different one.
    pub fn logical_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}:{}:{}", self.group, self.artifact, c),
            None => format!("{}:{}", self.group, self.artifact),
        }
    }

    /// `artifact-version[-classifier].extension`
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{}-{}.{}", self.artifact, self.version, c, self.extension),
            None => format!("{}-{}.{}", self.artifact, self.version, self.extension),
        }
    }

    /// Path relative to a libraries directory, mirroring the Maven repo
    /// layout: `<group/with/slashes>/<artifact>/<version>/<file_name>`.
    pub fn file_path(&self) -> PathBuf {
        PathBuf::from(self.group.replace('.', "/"))
            .join(&self.artifact)
            .join(&self.version)
            .join(self.file_name())
    }

    /// Full URL of this library under the given repository base.
    pub fn url(&self, repo_base: &str) -> String {
        format!(
            "{}/{}",
            repo_base.trim_end_matches('/'),
            self.file_path().to_string_lossy().replace('\\', "/")
        )
    }

    /// Return a copy with the given classifier attached.
    pub fn with_classifier(&self, classifier: &str) -> Self {
        let mut clone = self.clone();
        clone.classifier = Some(classifier.to_string());
        clone
    }
}

impl fmt::Display for LibrarySpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.classifier {
            Some(c) => write!(
                f,
                "{}:{}:{}:{}",
                self.group, self.artifact, self.version, c
            ),
            None => write!(f, "{}:{}:{}", self.group, self.artifact, self.version),
        }
    }
}
