use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LauncherError, LauncherResult};

pub const RESOURCES_URL: &str = "https://resources.download.minecraft.net";

/// Top-level asset index JSON structure. Objects are keyed by logical asset
/// name; the stored files are content-addressed by hash.
#[derive(Debug, Clone, Deserialize)]
pub struct AssetIndexDoc {
    pub objects: BTreeMap<String, AssetObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetObject {
    pub hash: String,
    pub size: u64,
}

impl AssetObject {
    /// Content-addressed relative location: `<first two hash chars>/<hash>`.
    pub fn object_path(&self) -> String {
        format!("{}/{}", &self.hash[..2], self.hash)
    }

    pub fn url(&self, resources_base: &str) -> String {
        format!(
            "{}/{}",
            resources_base.trim_end_matches('/'),
            self.object_path()
        )
    }
}

impl AssetIndexDoc {
    /// Parse a materialized index file from disk.
    pub async fn load(path: &Path) -> LauncherResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LauncherError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;
        Ok(serde_json::from_str(&raw)?)
    }
}
