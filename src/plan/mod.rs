// ─── Artifact Plan ───
// The deduplicated, ordered set of files a version needs on disk, plus the
// classpath ordering derived from it.

mod planner;

pub use planner::{ArtifactPlanner, DuplicatePolicy};

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::assets::AssetIndexDoc;
use crate::context::ASSETS_DIR;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Library,
    Native,
    ClientJar,
    AssetIndex,
    Asset,
    LogConfig,
}

/// One downloadable file: logical identity, target path relative to the
/// install root, source URL and expected size/hash when known.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactRef {
    pub kind: ArtifactKind,
    pub name: String,
    pub path: PathBuf,
    pub url: String,
    pub sha1: Option<String>,
    pub size: Option<u64>,
}

/// Output of the planner. Built in two phases: everything except individual
/// assets up front, then the asset expansion once the index file itself has
/// been materialized.
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub version_id: String,
    pub asset_index_id: String,
    pub artifacts: Vec<ArtifactRef>,
    /// Library paths in resolution order, client jar last. Relative to the
    /// install root, like every [`ArtifactRef::path`].
    pub classpath: Vec<PathBuf>,
    /// Native jars to unpack into the natives directory before launch.
    pub natives: Vec<PathBuf>,
    resources_base: String,
    assets_expanded: bool,
}

impl ArtifactPlan {
    pub(crate) fn new(version_id: String, asset_index_id: String, resources_base: String) -> Self {
        Self {
            version_id,
            asset_index_id,
            artifacts: Vec::new(),
            classpath: Vec::new(),
            natives: Vec::new(),
            resources_base,
            assets_expanded: false,
        }
    }

    pub fn assets_expanded(&self) -> bool {
        self.assets_expanded
    }

    pub fn asset_index_ref(&self) -> Option<&ArtifactRef> {
        self.artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::AssetIndex)
    }

    /// Second planning phase: turn a materialized asset index into one
    /// content-addressed ref per distinct object. Returns how many refs
    /// were added; objects sharing a hash collapse into one ref.
    pub fn expand_assets(&mut self, index: &AssetIndexDoc) -> usize {
        if self.assets_expanded {
            return 0;
        }

        let objects_dir = Path::new(ASSETS_DIR).join("objects");
        let mut seen: HashSet<&str> = HashSet::new();
        let mut added = 0;

        for (name, object) in &index.objects {
            if !seen.insert(object.hash.as_str()) {
                debug!("Asset {} shares an already-planned object", name);
                continue;
            }
            self.artifacts.push(ArtifactRef {
                kind: ArtifactKind::Asset,
                name: name.clone(),
                path: objects_dir.join(&object.hash[..2]).join(&object.hash),
                url: object.url(&self.resources_base),
                sha1: Some(object.hash.clone()),
                size: Some(object.size),
            });
            added += 1;
        }

        self.assets_expanded = true;
        added
    }
}
