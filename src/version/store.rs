// ─── Manifest Store ───
// Loads and caches raw version descriptors by id: memory, then the on-disk
// versions cache, then the remote source. No interpretation and no retry;
// retry policy lives in the download orchestrator.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use sha1::{Digest, Sha1};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{LauncherError, LauncherResult};
use crate::version::descriptor::VersionDescriptor;
use crate::version::manifest::VersionManifest;

/// A raw descriptor as served by a [`ManifestSource`], together with the
/// expected SHA-1 of its content when the source publishes one.
#[derive(Debug, Clone)]
pub struct RawDescriptor {
    pub raw: String,
    pub sha1: Option<String>,
}

/// Where descriptors come from when the local cache misses or is stale.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Fetch the raw descriptor for `id`. `Ok(None)` means the source does
    /// not know the id at all.
    async fn fetch_raw(&self, id: &str) -> LauncherResult<Option<RawDescriptor>>;

    /// The expected content hash of `id`'s descriptor, when known. Used to
    /// validate on-disk cache hits without fetching.
    async fn expected_sha1(&self, id: &str) -> LauncherResult<Option<String>>;
}

/// The canonical remote source: the published version listing plus one URL
/// per version descriptor.
pub struct MojangSource {
    client: reqwest::Client,
    manifest_url: Option<String>,
    listing: OnceCell<VersionManifest>,
}

impl MojangSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            manifest_url: None,
            listing: OnceCell::new(),
        }
    }

    /// Point the listing at a non-canonical URL (mirrors, tests).
    pub fn with_manifest_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            manifest_url: Some(url.into()),
            listing: OnceCell::new(),
        }
    }

    /// The listing is fetched once per source instance and memoized.
    pub async fn listing(&self) -> LauncherResult<&VersionManifest> {
        self.listing
            .get_or_try_init(|| async {
                match &self.manifest_url {
                    Some(url) => VersionManifest::fetch_from(&self.client, url).await,
                    None => VersionManifest::fetch(&self.client).await,
                }
            })
            .await
    }
}

#[async_trait]
impl ManifestSource for MojangSource {
    async fn fetch_raw(&self, id: &str) -> LauncherResult<Option<RawDescriptor>> {
        let listing = self.listing().await?;
        let Some(entry) = listing.find_version(id) else {
            return Ok(None);
        };

        let response = self.client.get(&entry.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::HttpStatus {
                url: entry.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(Some(RawDescriptor {
            raw: response.text().await?,
            sha1: entry.sha1.clone(),
        }))
    }

    async fn expected_sha1(&self, id: &str) -> LauncherResult<Option<String>> {
        let listing = self.listing().await?;
        Ok(listing.find_version(id).and_then(|e| e.sha1.clone()))
    }
}

/// Descriptor cache keyed by version id.
///
/// Side effect of a remote fetch: the raw descriptor is persisted to
/// `versions/<id>/<id>.json` so later runs resolve offline.
pub struct ManifestStore {
    context: Context,
    source: Box<dyn ManifestSource>,
    memo: Mutex<HashMap<String, Arc<VersionDescriptor>>>,
}

impl ManifestStore {
    pub fn new(context: Context, source: Box<dyn ManifestSource>) -> Self {
        Self {
            context,
            source,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Load the descriptor for `id`, preferring memory, then the disk
    /// cache (hash-validated when the source knows an expected SHA-1),
    /// then the remote source.
    pub async fn get(&self, id: &str) -> LauncherResult<Arc<VersionDescriptor>> {
        if let Some(hit) = self.memo.lock().await.get(id) {
            return Ok(hit.clone());
        }

        let cache_path = self.context.version_manifest_path(id);
        let mut stale: Option<(String, String)> = None;

        if cache_path.is_file() {
            let raw = tokio::fs::read_to_string(&cache_path)
                .await
                .map_err(|e| LauncherError::Io {
                    path: cache_path.clone(),
                    source: e,
                })?;

            // An unreachable source must not invalidate a usable cache;
            // offline launches resolve entirely from disk.
            let expected = match self.source.expected_sha1(id).await {
                Ok(expected) => expected,
                Err(e) => {
                    debug!("No expected hash for {} ({}); trusting cache", id, e);
                    None
                }
            };

            match expected {
                Some(expected) => {
                    let actual = sha1_hex(raw.as_bytes());
                    if actual == expected {
                        return self.parse_and_memo(id, &raw).await;
                    }
                    debug!(
                        "Cached descriptor for {} is stale (expected {}, got {})",
                        id, expected, actual
                    );
                    stale = Some((expected, actual));
                }
                // Nothing to validate against: trust the cache.
                None => return self.parse_and_memo(id, &raw).await,
            }
        }

        match self.source.fetch_raw(id).await? {
            Some(fetched) => {
                if let Some(expected) = &fetched.sha1 {
                    let actual = sha1_hex(fetched.raw.as_bytes());
                    if &actual != expected {
                        return Err(LauncherError::Integrity {
                            path: cache_path,
                            expected: expected.clone(),
                            actual,
                        });
                    }
                }

                self.persist(&cache_path, &fetched.raw).await?;
                info!("Fetched and cached descriptor for {}", id);
                self.parse_and_memo(id, &fetched.raw).await
            }
            None => match stale {
                // A known-bad cached copy with no remote replacement is an
                // integrity failure, not a missing version.
                Some((expected, actual)) => Err(LauncherError::Integrity {
                    path: cache_path,
                    expected,
                    actual,
                }),
                None => Err(LauncherError::VersionNotFound(id.to_string())),
            },
        }
    }

    async fn parse_and_memo(&self, id: &str, raw: &str) -> LauncherResult<Arc<VersionDescriptor>> {
        let descriptor: VersionDescriptor = serde_json::from_str(raw)?;
        let descriptor = Arc::new(descriptor);
        self.memo
            .lock()
            .await
            .insert(id.to_string(), descriptor.clone());
        Ok(descriptor)
    }

    async fn persist(&self, path: &Path, raw: &str) -> LauncherResult<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        tokio::fs::write(path, raw)
            .await
            .map_err(|e| LauncherError::Io {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
