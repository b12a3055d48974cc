// ─── Version Listing ───
// The remote index of all published versions: id, descriptor URL and the
// descriptor's expected SHA-1.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::error::{LauncherError, LauncherResult};

pub const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";

/// Top-level version listing.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    #[serde(default)]
    pub latest: Option<LatestRefs>,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestRefs {
    pub release: String,
    pub snapshot: String,
}

/// A single entry in the listing.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub version_type: String,
    #[serde(rename = "releaseTime")]
    pub release_time: DateTime<Utc>,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
}

impl VersionManifest {
    /// Fetch the listing from its canonical location.
    pub async fn fetch(client: &reqwest::Client) -> LauncherResult<Self> {
        Self::fetch_from(client, VERSION_MANIFEST_URL).await
    }

    pub async fn fetch_from(client: &reqwest::Client, url: &str) -> LauncherResult<Self> {
        let response = client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let manifest: VersionManifest = response.json().await?;
        info!("Loaded {} versions from listing", manifest.versions.len());
        Ok(manifest)
    }

    /// Find a specific version entry by id (e.g. "1.20.4").
    pub fn find_version(&self, id: &str) -> Option<&VersionEntry> {
        self.versions.iter().find(|v| v.id == id)
    }

    /// Translate the "release"/"snapshot" aliases to a concrete id.
    /// Any other input is returned unchanged.
    pub fn resolve_alias<'a>(&'a self, id: &'a str) -> &'a str {
        match (id, &self.latest) {
            ("release", Some(latest)) => latest.release.as_str(),
            ("snapshot", Some(latest)) => latest.snapshot.as_str(),
            _ => id,
        }
    }

    /// All stable versions, newest first as published.
    pub fn releases(&self) -> Vec<&VersionEntry> {
        self.versions
            .iter()
            .filter(|v| v.version_type == "release")
            .collect()
    }
}
