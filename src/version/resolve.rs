// ─── Version Resolver ───
// Walks the inheritance chain through the manifest store and merges it into
// one effective version spec. The walk is an explicit loop with a visited
// set and a depth cap, so cycles and pathological chains fail instead of
// recursing forever.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{LauncherError, LauncherResult};
use crate::maven::LibrarySpecifier;
use crate::version::descriptor::{
    Argument, AssetIndexRef, DownloadInfo, JavaVersionInfo, LibraryEntry, LoggingClient,
    VersionDescriptor,
};
use crate::version::store::ManifestStore;

/// Hard cap on chain length. Real chains are 2–3 manifests deep; anything
/// near this limit is a broken or hostile manifest set.
pub const MAX_INHERITANCE_DEPTH: usize = 16;

/// A library entry surviving the merge, tagged with how far from the
/// requested version it was declared (0 = the requested version itself).
/// Entries are ordered child-most first, so downstream duplicate
/// arbitration can rely on encounter order; the depth records provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLibrary {
    pub entry: LibraryEntry,
    pub depth: usize,
}

/// The merge result of a full inheritance chain. Immutable once built;
/// identical chains always merge to identical specs.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveVersionSpec {
    /// The requested (leaf) version id.
    pub id: String,
    /// Chain ids, root-most ancestor first.
    pub chain: Vec<String>,
    pub main_class: String,
    pub asset_index: AssetIndexRef,
    pub client_download: Option<DownloadInfo>,
    /// Child-most entries first; a child's library shadows a parent's with
    /// the same logical name. This order is also the classpath order.
    pub libraries: Vec<ResolvedLibrary>,
    pub game_args: Vec<Argument>,
    pub jvm_args: Vec<Argument>,
    pub java_version: Option<JavaVersionInfo>,
    pub logging: Option<LoggingClient>,
    pub release_type: String,
    pub minimum_launcher_version: Option<u32>,
}

/// Resolve `id` through the store into an effective spec.
pub async fn resolve_version(
    store: &ManifestStore,
    id: &str,
) -> LauncherResult<EffectiveVersionSpec> {
    let mut chain: Vec<Arc<VersionDescriptor>> = Vec::new();
    let mut chain_ids: Vec<String> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut current = id.to_string();

    loop {
        if !visited.insert(current.clone()) {
            return Err(LauncherError::CyclicInheritance(current));
        }
        if chain.len() >= MAX_INHERITANCE_DEPTH {
            return Err(LauncherError::InheritanceTooDeep {
                id: id.to_string(),
                limit: MAX_INHERITANCE_DEPTH,
            });
        }

        let descriptor = store.get(&current).await?;
        let parent = descriptor.inherits_from.clone();
        chain_ids.push(current.clone());
        chain.push(descriptor);

        match parent {
            Some(parent_id) => {
                debug!("{} inherits from {}", current, parent_id);
                current = parent_id;
            }
            None => break,
        }
    }

    // The walk collected leaf → root; the merge wants root first.
    chain.reverse();
    chain_ids.reverse();
    merge_chain(id, chain_ids, &chain)
}

/// Merge a chain ordered root-most first. Pure: the only inputs are the
/// descriptors themselves.
fn merge_chain(
    id: &str,
    chain_ids: Vec<String>,
    chain: &[Arc<VersionDescriptor>],
) -> LauncherResult<EffectiveVersionSpec> {
    // Scalars: the child-most manifest that defines a field wins.
    let main_class = nearest(chain, |d| d.main_class.clone()).ok_or_else(|| {
        LauncherError::IncompleteVersion {
            id: id.to_string(),
            field: "main class",
        }
    })?;
    let asset_index = nearest(chain, |d| d.asset_index.clone()).ok_or_else(|| {
        LauncherError::IncompleteVersion {
            id: id.to_string(),
            field: "asset index",
        }
    })?;
    let client_download = nearest(chain, |d| {
        d.downloads.as_ref().and_then(|dl| dl.client.clone())
    });
    let java_version = nearest(chain, |d| d.java_version.clone());
    let logging = nearest(chain, |d| {
        d.logging.as_ref().and_then(|l| l.client.clone())
    });
    let minimum_launcher_version = nearest(chain, |d| d.minimum_launcher_version);
    let release_type =
        nearest(chain, |d| d.release_type.clone()).unwrap_or_else(|| "release".to_string());

    // Argument templates concatenate root→leaf. A legacy minecraftArguments
    // string on a child is a full replacement of whatever it inherited.
    let mut game_args: Vec<Argument> = Vec::new();
    let mut jvm_args: Vec<Argument> = Vec::new();
    for descriptor in chain {
        if let Some(legacy) = &descriptor.minecraft_arguments {
            game_args = legacy
                .split_whitespace()
                .map(|s| Argument::Plain(s.to_string()))
                .collect();
        }
        if let Some(templates) = &descriptor.arguments {
            game_args.extend(templates.game.iter().cloned());
            jvm_args.extend(templates.jvm.iter().cloned());
        }
    }

    // Libraries: child entries come first and shadow parent entries that
    // share the same logical name (version excluded, so a child can pin a
    // different one).
    let mut libraries: Vec<ResolvedLibrary> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (depth, descriptor) in chain.iter().rev().enumerate() {
        for entry in &descriptor.libraries {
            let key = match LibrarySpecifier::parse(&entry.name) {
                Ok(spec) => spec.logical_name(),
                Err(_) => entry.name.clone(),
            };
            if !seen.insert(key) {
                debug!("Library {} shadowed by a child manifest", entry.name);
                continue;
            }
            libraries.push(ResolvedLibrary {
                entry: entry.clone(),
                depth,
            });
        }
    }

    Ok(EffectiveVersionSpec {
        id: id.to_string(),
        chain: chain_ids,
        main_class,
        asset_index,
        client_download,
        libraries,
        game_args,
        jvm_args,
        java_version,
        logging,
        release_type,
        minimum_launcher_version,
    })
}

/// Walk the chain child-most first and return the first defined value.
fn nearest<T>(
    chain: &[Arc<VersionDescriptor>],
    field: impl Fn(&VersionDescriptor) -> Option<T>,
) -> Option<T> {
    chain.iter().rev().find_map(|d| field(d))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::version::store::{ManifestSource, ManifestStore, RawDescriptor};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticSource {
        descriptors: HashMap<String, String>,
    }

    #[async_trait]
    impl ManifestSource for StaticSource {
        async fn fetch_raw(&self, id: &str) -> LauncherResult<Option<RawDescriptor>> {
            Ok(self.descriptors.get(id).map(|raw| RawDescriptor {
                raw: raw.clone(),
                sha1: None,
            }))
        }

        async fn expected_sha1(&self, _id: &str) -> LauncherResult<Option<String>> {
            Ok(None)
        }
    }

    fn store_with(root: &std::path::Path, entries: &[(&str, serde_json::Value)]) -> ManifestStore {
        let descriptors = entries
            .iter()
            .map(|(id, v)| (id.to_string(), v.to_string()))
            .collect();
        ManifestStore::new(Context::new(root), Box::new(StaticSource { descriptors }))
    }

    #[tokio::test]
    async fn child_scalars_win_parent_fills_gaps() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[
                (
                    "1.20",
                    serde_json::json!({
                        "id": "1.20",
                        "inheritsFrom": "1.20-common",
                        "mainClass": "child.Main"
                    }),
                ),
                (
                    "1.20-common",
                    serde_json::json!({
                        "id": "1.20-common",
                        "mainClass": "parent.Main",
                        "assetIndex": {"id": "8", "url": "https://example.com/8.json"}
                    }),
                ),
            ],
        );

        let spec = resolve_version(&store, "1.20").await.unwrap();
        assert_eq!(spec.main_class, "child.Main");
        assert_eq!(spec.asset_index.id, "8");
        assert_eq!(spec.chain, vec!["1.20-common", "1.20"]);
    }

    #[tokio::test]
    async fn cyclic_chain_fails_instead_of_hanging() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[
                (
                    "a",
                    serde_json::json!({"id": "a", "inheritsFrom": "b", "mainClass": "a.Main"}),
                ),
                (
                    "b",
                    serde_json::json!({"id": "b", "inheritsFrom": "a", "mainClass": "b.Main"}),
                ),
            ],
        );

        assert!(matches!(
            resolve_version(&store, "a").await,
            Err(LauncherError::CyclicInheritance(_))
        ));
    }

    #[tokio::test]
    async fn over_deep_chain_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut entries = Vec::new();
        for i in 0..(MAX_INHERITANCE_DEPTH + 2) {
            entries.push((
                format!("v{}", i),
                serde_json::json!({
                    "id": format!("v{}", i),
                    "inheritsFrom": format!("v{}", i + 1),
                    "mainClass": "x.Main"
                }),
            ));
        }
        let borrowed: Vec<(&str, serde_json::Value)> = entries
            .iter()
            .map(|(id, v)| (id.as_str(), v.clone()))
            .collect();
        let store = store_with(tmp.path(), &borrowed);

        assert!(matches!(
            resolve_version(&store, "v0").await,
            Err(LauncherError::InheritanceTooDeep { .. })
        ));
    }

    #[tokio::test]
    async fn libraries_child_first_with_logical_override() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[
                (
                    "leaf",
                    serde_json::json!({
                        "id": "leaf",
                        "inheritsFrom": "base",
                        "mainClass": "l.Main",
                        "libraries": [
                            {"name": "com.mojang:brigadier:1.1.8"},
                            {"name": "net.fabricmc:fabric-loader:0.15.6"}
                        ]
                    }),
                ),
                (
                    "base",
                    serde_json::json!({
                        "id": "base",
                        "mainClass": "b.Main",
                        "assetIndex": {"id": "12", "url": "https://example.com/12.json"},
                        "libraries": [
                            {"name": "com.mojang:brigadier:1.0.17"},
                            {"name": "org.slf4j:slf4j-api:2.0.9"}
                        ]
                    }),
                ),
            ],
        );

        let spec = resolve_version(&store, "leaf").await.unwrap();
        let names: Vec<&str> = spec
            .libraries
            .iter()
            .map(|l| l.entry.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "com.mojang:brigadier:1.1.8",
                "net.fabricmc:fabric-loader:0.15.6",
                "org.slf4j:slf4j-api:2.0.9"
            ]
        );
        assert_eq!(spec.libraries[0].depth, 0);
        assert_eq!(spec.libraries[2].depth, 1);
    }

    #[tokio::test]
    async fn argument_lists_concatenate_root_to_leaf() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[
                (
                    "leaf",
                    serde_json::json!({
                        "id": "leaf",
                        "inheritsFrom": "base",
                        "mainClass": "l.Main",
                        "arguments": {"game": ["--leaf"], "jvm": ["-Dleaf=1"]}
                    }),
                ),
                (
                    "base",
                    serde_json::json!({
                        "id": "base",
                        "mainClass": "b.Main",
                        "assetIndex": {"id": "12", "url": "https://example.com/12.json"},
                        "arguments": {"game": ["--base"], "jvm": ["-Dbase=1"]}
                    }),
                ),
            ],
        );

        let spec = resolve_version(&store, "leaf").await.unwrap();
        assert_eq!(
            spec.game_args,
            vec![
                Argument::Plain("--base".into()),
                Argument::Plain("--leaf".into())
            ]
        );
        assert_eq!(
            spec.jvm_args,
            vec![
                Argument::Plain("-Dbase=1".into()),
                Argument::Plain("-Dleaf=1".into())
            ]
        );
    }

    #[tokio::test]
    async fn legacy_arguments_replace_inherited_game_args() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[
                (
                    "leaf",
                    serde_json::json!({
                        "id": "leaf",
                        "inheritsFrom": "base",
                        "mainClass": "l.Main",
                        "minecraftArguments": "--username ${auth_player_name}"
                    }),
                ),
                (
                    "base",
                    serde_json::json!({
                        "id": "base",
                        "mainClass": "b.Main",
                        "assetIndex": {"id": "8", "url": "https://example.com/8.json"},
                        "arguments": {"game": ["--base"]}
                    }),
                ),
            ],
        );

        let spec = resolve_version(&store, "leaf").await.unwrap();
        assert_eq!(
            spec.game_args,
            vec![
                Argument::Plain("--username".into()),
                Argument::Plain("${auth_player_name}".into())
            ]
        );
    }

    #[tokio::test]
    async fn missing_main_class_is_incomplete() {
        let tmp = tempfile::tempdir().unwrap();
        let store = store_with(
            tmp.path(),
            &[(
                "headless",
                serde_json::json!({
                    "id": "headless",
                    "assetIndex": {"id": "8", "url": "https://example.com/8.json"}
                }),
            )],
        );

        assert!(matches!(
            resolve_version(&store, "headless").await,
            Err(LauncherError::IncompleteVersion { field: "main class", .. })
        ));
    }

    #[tokio::test]
    async fn resolution_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let entries = [
            (
                "leaf",
                serde_json::json!({
                    "id": "leaf",
                    "inheritsFrom": "base",
                    "mainClass": "l.Main",
                    "libraries": [{"name": "a:b:2.0"}, {"name": "c:d:1.0"}]
                }),
            ),
            (
                "base",
                serde_json::json!({
                    "id": "base",
                    "mainClass": "b.Main",
                    "assetIndex": {"id": "12", "url": "https://example.com/12.json"},
                    "libraries": [{"name": "a:b:1.0"}, {"name": "e:f:3.0"}]
                }),
            ),
        ];
        let store = store_with(tmp.path(), &entries);

        let first = resolve_version(&store, "leaf").await.unwrap();
        let second = resolve_version(&store, "leaf").await.unwrap();
        assert_eq!(first, second);
    }
}
