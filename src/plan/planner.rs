// ─── Artifact Planner ───
// Applies rule evaluation and platform-native selection to an effective
// version spec and emits the deduplicated artifact plan.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::context::{ASSETS_DIR, LIBRARIES_DIR, VERSIONS_DIR};
use crate::error::{LauncherError, LauncherResult};
use crate::maven::LibrarySpecifier;
use crate::plan::{ArtifactKind, ArtifactPlan, ArtifactRef};
use crate::rules::{evaluate, RuleContext};
use crate::version::descriptor::LibraryEntry;
use crate::version::resolve::EffectiveVersionSpec;

/// Which contributor wins when two refs target the same local path.
/// The child-most manifest winning matches how inheriting launchers behave,
/// but the policy is observational rather than schema-mandated, so it stays
/// selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    #[default]
    PreferChild,
    PreferParent,
}

#[derive(Debug)]
pub struct ArtifactPlanner {
    duplicate_policy: DuplicatePolicy,
    resources_base: String,
}

impl Default for ArtifactPlanner {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            resources_base: crate::assets::RESOURCES_URL.to_string(),
        }
    }
}

impl ArtifactPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_duplicate_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            duplicate_policy,
            ..Self::default()
        }
    }

    /// Point asset object URLs at a non-canonical store (mirrors, tests).
    pub fn resources_base(mut self, base: impl Into<String>) -> Self {
        self.resources_base = base.into();
        self
    }

    /// First planning phase: libraries, natives, client jar, asset index
    /// and log config. Individual assets are added later by
    /// [`ArtifactPlan::expand_assets`] once the index is on disk.
    pub fn plan(
        &self,
        spec: &EffectiveVersionSpec,
        rules_ctx: &RuleContext,
    ) -> LauncherResult<ArtifactPlan> {
        let mut plan = ArtifactPlan::new(
            spec.id.clone(),
            spec.asset_index.id.clone(),
            self.resources_base.clone(),
        );
        // (kind, path) → index into plan.artifacts, for duplicate arbitration.
        let mut by_path: HashMap<(ArtifactKind, PathBuf), usize> = HashMap::new();
        let mut excluded = 0usize;

        for library in &spec.libraries {
            let entry = &library.entry;
            if !evaluate(&entry.rules, rules_ctx) {
                debug!("Skipping library (rules): {}", entry.name);
                excluded += 1;
                continue;
            }

            if let Some(artifact_ref) = self.library_artifact(entry)? {
                let path = artifact_ref.path.clone();
                self.keep(&mut plan, &mut by_path, artifact_ref);
                if !plan.classpath.contains(&path) {
                    plan.classpath.push(path);
                }
            }

            if let Some(native_ref) = self.native_artifact(entry, rules_ctx) {
                let path = native_ref.path.clone();
                self.keep(&mut plan, &mut by_path, native_ref);
                if !plan.natives.contains(&path) {
                    plan.natives.push(path);
                }
            }
        }

        // The client jar closes the classpath.
        let client = spec
            .client_download
            .as_ref()
            .ok_or_else(|| LauncherError::IncompleteVersion {
                id: spec.id.clone(),
                field: "client download",
            })?;
        let client_path = Path::new(VERSIONS_DIR)
            .join(&spec.id)
            .join(format!("{}.jar", spec.id));
        let client_ref = ArtifactRef {
            kind: ArtifactKind::ClientJar,
            name: format!("{}.jar", spec.id),
            path: client_path.clone(),
            url: client.url.clone(),
            sha1: Some(client.sha1.clone()),
            size: Some(client.size),
        };
        self.keep(&mut plan, &mut by_path, client_ref);
        plan.classpath.push(client_path);

        // Referenced asset index file (expanded into objects later).
        let index_ref = ArtifactRef {
            kind: ArtifactKind::AssetIndex,
            name: format!("{}.json", spec.asset_index.id),
            path: Path::new(ASSETS_DIR)
                .join("indexes")
                .join(format!("{}.json", spec.asset_index.id)),
            url: spec.asset_index.url.clone(),
            sha1: spec.asset_index.sha1.clone(),
            size: spec.asset_index.size,
        };
        self.keep(&mut plan, &mut by_path, index_ref);

        // Logging configuration, when the version declares one.
        if let Some(logging) = &spec.logging {
            let log_ref = ArtifactRef {
                kind: ArtifactKind::LogConfig,
                name: logging.file.id.clone(),
                path: Path::new(ASSETS_DIR)
                    .join("log_configs")
                    .join(&logging.file.id),
                url: logging.file.url.clone(),
                sha1: Some(logging.file.sha1.clone()),
                size: Some(logging.file.size),
            };
            self.keep(&mut plan, &mut by_path, log_ref);
        }

        info!(
            "Planned {} artifacts for {} ({} libraries excluded by rules)",
            plan.artifacts.len(),
            spec.id,
            excluded
        );
        Ok(plan)
    }

    /// The library's main artifact, if it has one to download or to put on
    /// the classpath. Loader metadata sometimes declares a coordinate plus
    /// a repository base instead of explicit download info.
    fn library_artifact(&self, entry: &LibraryEntry) -> LauncherResult<Option<ArtifactRef>> {
        if let Some(artifact) = entry.downloads.as_ref().and_then(|d| d.artifact.as_ref()) {
            return Ok(Some(ArtifactRef {
                kind: ArtifactKind::Library,
                name: entry.name.clone(),
                path: Path::new(LIBRARIES_DIR).join(&artifact.path),
                url: artifact.url.clone(),
                sha1: Some(artifact.sha1.clone()),
                size: Some(artifact.size),
            }));
        }

        if let Some(repo_base) = &entry.url {
            let spec = LibrarySpecifier::parse(&entry.name)?;
            return Ok(Some(ArtifactRef {
                kind: ArtifactKind::Library,
                name: entry.name.clone(),
                path: Path::new(LIBRARIES_DIR).join(spec.file_path()),
                url: spec.url(repo_base),
                sha1: None,
                size: None,
            }));
        }

        // Classifier-only entries carry no main artifact.
        Ok(None)
    }

    /// The platform-specific native classifier artifact, when the library
    /// declares per-platform variants and one matches the current platform.
    /// No match is not an error; most libraries are platform-agnostic.
    fn native_artifact(&self, entry: &LibraryEntry, rules_ctx: &RuleContext) -> Option<ArtifactRef> {
        let natives = entry.natives.as_ref()?;
        let classifier_template = natives.get(&rules_ctx.os_name)?;
        let classifier = classifier_template.replace("${arch}", arch_bits(&rules_ctx.arch));

        let downloads = entry.downloads.as_ref()?;
        let Some(artifact) = downloads.classifiers.get(&classifier) else {
            debug!(
                "Library {} has no classifier {:?} for this platform",
                entry.name, classifier
            );
            return None;
        };

        Some(ArtifactRef {
            kind: ArtifactKind::Native,
            name: format!("{}:{}", entry.name, classifier),
            path: Path::new(LIBRARIES_DIR).join(&artifact.path),
            url: artifact.url.clone(),
            sha1: Some(artifact.sha1.clone()),
            size: Some(artifact.size),
        })
    }

    /// Insert a ref, arbitrating collisions on the target path. Libraries
    /// arrive child-most first, so on a collision the existing entry is the
    /// more child-ward contributor. Duplicates are logged, never fatal.
    fn keep(
        &self,
        plan: &mut ArtifactPlan,
        by_path: &mut HashMap<(ArtifactKind, PathBuf), usize>,
        artifact: ArtifactRef,
    ) {
        match by_path.get(&(artifact.kind, artifact.path.clone())) {
            None => {
                by_path.insert((artifact.kind, artifact.path.clone()), plan.artifacts.len());
                plan.artifacts.push(artifact);
            }
            Some(&existing) => match self.duplicate_policy {
                DuplicatePolicy::PreferChild => {
                    debug!(
                        "Dropping duplicate artifact {} for {:?} (child contribution wins)",
                        artifact.name, artifact.path
                    );
                }
                DuplicatePolicy::PreferParent => {
                    debug!(
                        "Replacing artifact {} at {:?} (parent contribution wins)",
                        plan.artifacts[existing].name, artifact.path
                    );
                    plan.artifacts[existing] = artifact;
                }
            },
        }
    }
}

fn arch_bits(arch: &str) -> &'static str {
    if arch.contains("64") {
        "64"
    } else {
        "32"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::descriptor::AssetIndexRef;
    use crate::version::resolve::ResolvedLibrary;

    fn linux_ctx() -> RuleContext {
        RuleContext {
            os_name: "linux".into(),
            os_version: String::new(),
            arch: "x86_64".into(),
            features: Default::default(),
        }
    }

    fn lib(json: serde_json::Value) -> LibraryEntry {
        serde_json::from_value(json).unwrap()
    }

    fn base_spec(libraries: Vec<ResolvedLibrary>) -> EffectiveVersionSpec {
        EffectiveVersionSpec {
            id: "1.20.4".into(),
            chain: vec!["1.20.4".into()],
            main_class: "net.minecraft.client.main.Main".into(),
            asset_index: AssetIndexRef {
                id: "12".into(),
                url: "https://example.com/12.json".into(),
                sha1: Some("ab".into()),
                size: Some(10),
                total_size: None,
            },
            client_download: Some(crate::version::descriptor::DownloadInfo {
                sha1: "cc".into(),
                size: 100,
                url: "https://example.com/client.jar".into(),
            }),
            libraries,
            game_args: Vec::new(),
            jvm_args: Vec::new(),
            java_version: None,
            logging: None,
            release_type: "release".into(),
            minimum_launcher_version: None,
        }
    }

    #[test]
    fn foreign_platform_library_contributes_nothing() {
        let entry = lib(serde_json::json!({
            "name": "ca.weblite:java-objc-bridge:1.1",
            "rules": [{"action": "allow", "os": {"name": "osx"}}],
            "downloads": {"artifact": {
                "path": "ca/weblite/java-objc-bridge/1.1/java-objc-bridge-1.1.jar",
                "sha1": "aa", "size": 1, "url": "https://example.com/objc.jar"
            }}
        }));
        let spec = base_spec(vec![ResolvedLibrary { entry, depth: 0 }]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        assert!(!plan
            .artifacts
            .iter()
            .any(|a| a.kind == ArtifactKind::Library));
        // Classpath is just the client jar.
        assert_eq!(plan.classpath.len(), 1);
    }

    #[test]
    fn client_jar_is_last_on_classpath() {
        let entry = lib(serde_json::json!({
            "name": "com.mojang:brigadier:1.1.8",
            "downloads": {"artifact": {
                "path": "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar",
                "sha1": "aa", "size": 1, "url": "https://example.com/brigadier.jar"
            }}
        }));
        let spec = base_spec(vec![ResolvedLibrary { entry, depth: 0 }]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        assert_eq!(plan.classpath.len(), 2);
        assert!(plan
            .classpath
            .last()
            .unwrap()
            .ends_with("versions/1.20.4/1.20.4.jar"));
    }

    #[test]
    fn duplicate_paths_keep_the_child_contribution() {
        let child = lib(serde_json::json!({
            "name": "org.example:shared:2.0",
            "downloads": {"artifact": {
                "path": "org/example/shared/shared.jar",
                "sha1": "child", "size": 2, "url": "https://example.com/child.jar"
            }}
        }));
        let parent = lib(serde_json::json!({
            "name": "org.other:shared-too:1.0",
            "downloads": {"artifact": {
                "path": "org/example/shared/shared.jar",
                "sha1": "parent", "size": 1, "url": "https://example.com/parent.jar"
            }}
        }));
        let spec = base_spec(vec![
            ResolvedLibrary {
                entry: child,
                depth: 0,
            },
            ResolvedLibrary {
                entry: parent,
                depth: 1,
            },
        ]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        let shared: Vec<&ArtifactRef> = plan
            .artifacts
            .iter()
            .filter(|a| a.path.ends_with("shared.jar"))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].sha1.as_deref(), Some("child"));

        // And the parent-wins policy flips the outcome.
        let plan = ArtifactPlanner::with_duplicate_policy(DuplicatePolicy::PreferParent)
            .plan(&spec, &linux_ctx())
            .unwrap();
        let shared: Vec<&ArtifactRef> = plan
            .artifacts
            .iter()
            .filter(|a| a.path.ends_with("shared.jar"))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].sha1.as_deref(), Some("parent"));
    }

    #[test]
    fn natives_select_the_platform_classifier() {
        let entry = lib(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.2.2",
            "natives": {"linux": "natives-linux", "windows": "natives-windows-${arch}"},
            "downloads": {
                "artifact": {
                    "path": "org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2.jar",
                    "sha1": "aa", "size": 1, "url": "https://example.com/lwjgl.jar"
                },
                "classifiers": {
                    "natives-linux": {
                        "path": "org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2-natives-linux.jar",
                        "sha1": "bb", "size": 2, "url": "https://example.com/lwjgl-natives.jar"
                    }
                }
            }
        }));
        let spec = base_spec(vec![ResolvedLibrary { entry, depth: 0 }]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        assert_eq!(plan.natives.len(), 1);
        assert!(plan.natives[0].ends_with("lwjgl-3.2.2-natives-linux.jar"));
        // Natives never join the classpath.
        assert!(!plan
            .classpath
            .iter()
            .any(|p| p.ends_with("lwjgl-3.2.2-natives-linux.jar")));
    }

    #[test]
    fn missing_native_variant_is_not_an_error() {
        let entry = lib(serde_json::json!({
            "name": "org.lwjgl:lwjgl:3.2.2",
            "natives": {"windows": "natives-windows"},
            "downloads": {"artifact": {
                "path": "org/lwjgl/lwjgl/3.2.2/lwjgl-3.2.2.jar",
                "sha1": "aa", "size": 1, "url": "https://example.com/lwjgl.jar"
            }}
        }));
        let spec = base_spec(vec![ResolvedLibrary { entry, depth: 0 }]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        assert!(plan.natives.is_empty());
        assert_eq!(
            plan.artifacts
                .iter()
                .filter(|a| a.kind == ArtifactKind::Library)
                .count(),
            1
        );
    }

    #[test]
    fn coordinate_plus_repo_base_derives_path_and_url() {
        let entry = lib(serde_json::json!({
            "name": "net.fabricmc:fabric-loader:0.15.6",
            "url": "https://maven.fabricmc.net/"
        }));
        let spec = base_spec(vec![ResolvedLibrary { entry, depth: 0 }]);

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        let lib_ref = plan
            .artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::Library)
            .unwrap();
        assert_eq!(
            lib_ref.url,
            "https://maven.fabricmc.net/net/fabricmc/fabric-loader/0.15.6/fabric-loader-0.15.6.jar"
        );
        assert!(lib_ref
            .path
            .ends_with("net/fabricmc/fabric-loader/0.15.6/fabric-loader-0.15.6.jar"));
        assert_eq!(lib_ref.sha1, None);
    }

    #[test]
    fn plan_includes_index_and_log_config() {
        let mut spec = base_spec(Vec::new());
        spec.logging = Some(
            serde_json::from_value(serde_json::json!({
                "argument": "-Dlog4j.configurationFile=${path}",
                "file": {
                    "id": "client-1.12.xml",
                    "sha1": "dd", "size": 888,
                    "url": "https://example.com/client-1.12.xml"
                },
                "type": "log4j2-xml"
            }))
            .unwrap(),
        );

        let plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();
        let index = plan.asset_index_ref().unwrap();
        assert!(index.path.ends_with("assets/indexes/12.json"));
        let log = plan
            .artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::LogConfig)
            .unwrap();
        assert!(log.path.ends_with("assets/log_configs/client-1.12.xml"));
    }

    #[test]
    fn asset_expansion_dedups_shared_objects() {
        let spec = base_spec(Vec::new());
        let mut plan = ArtifactPlanner::new().plan(&spec, &linux_ctx()).unwrap();

        let index: crate::assets::AssetIndexDoc = serde_json::from_value(serde_json::json!({
            "objects": {
                "icons/icon_16x16.png": {"hash": "aaaa00000000000000000000000000000000aaaa", "size": 3},
                "icons/icon_copy.png":  {"hash": "aaaa00000000000000000000000000000000aaaa", "size": 3},
                "minecraft/lang/en_us.json": {"hash": "bbbb00000000000000000000000000000000bbbb", "size": 9}
            }
        }))
        .unwrap();

        let added = plan.expand_assets(&index);
        assert_eq!(added, 2);
        assert!(plan.assets_expanded());
        assert_eq!(
            plan.artifacts
                .iter()
                .filter(|a| a.kind == ArtifactKind::Asset)
                .count(),
            2
        );
        // Second expansion is a no-op.
        assert_eq!(plan.expand_assets(&index), 0);
    }
}
