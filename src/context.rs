// ─── Install Context ───
// Owns the on-disk layout under the install root. Paths are stable across
// runs so hash verification can short-circuit re-downloads.

use std::path::{Path, PathBuf};

pub(crate) const VERSIONS_DIR: &str = "versions";
pub(crate) const LIBRARIES_DIR: &str = "libraries";
pub(crate) const ASSETS_DIR: &str = "assets";

/// The directory tree the engine owns: versions cache, libraries, assets,
/// log configs and per-version natives. Created lazily by the downloader;
/// this type only computes paths.
///
/// There is no implicit global context; the store, the planner and the
/// launch assembler all take one by reference.
#[derive(Debug, Clone)]
pub struct Context {
    root: PathBuf,
}

impl Context {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The platform-conventional game directory (`.minecraft` equivalent).
    pub fn default_root() -> PathBuf {
        let base = if cfg!(target_os = "macos") {
            dirs::data_dir().map(|d| d.join("minecraft"))
        } else if cfg!(target_os = "windows") {
            dirs::config_dir().map(|d| d.join(".minecraft"))
        } else {
            dirs::home_dir().map(|d| d.join(".minecraft"))
        };
        base.unwrap_or_else(|| PathBuf::from(".minecraft"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join(VERSIONS_DIR)
    }

    pub fn version_dir(&self, id: &str) -> PathBuf {
        self.versions_dir().join(id)
    }

    /// On-disk cache location of a version descriptor: `versions/<id>/<id>.json`.
    pub fn version_manifest_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.json", id))
    }

    /// `versions/<id>/<id>.jar`, the client jar for a resolved version.
    pub fn version_jar_path(&self, id: &str) -> PathBuf {
        self.version_dir(id).join(format!("{}.jar", id))
    }

    /// Natives are re-extracted per launch under the owning version.
    pub fn natives_dir(&self, id: &str) -> PathBuf {
        self.version_dir(id).join("natives")
    }

    pub fn libraries_dir(&self) -> PathBuf {
        self.root.join(LIBRARIES_DIR)
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.join(ASSETS_DIR)
    }

    pub fn asset_indexes_dir(&self) -> PathBuf {
        self.assets_dir().join("indexes")
    }

    pub fn asset_objects_dir(&self) -> PathBuf {
        self.assets_dir().join("objects")
    }

    pub fn log_configs_dir(&self) -> PathBuf {
        self.assets_dir().join("log_configs")
    }
}
