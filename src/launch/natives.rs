// ─── Natives Extraction ───
// Unpacks platform-native shared libraries out of the downloaded native
// jars into the version's natives directory before launch.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::{LauncherError, LauncherResult};
use crate::plan::ArtifactPlan;

/// Extract `.so`/`.dll`/`.dylib`/`.jnilib` entries from every native jar in
/// the plan into a fresh natives directory. The directory is wiped first:
/// it is a per-launch scratch area, not a cache.
pub async fn extract_natives(plan: &ArtifactPlan, context: &Context) -> LauncherResult<PathBuf> {
    let natives_dir = context.natives_dir(&plan.version_id);

    if natives_dir.exists() {
        let _ = tokio::fs::remove_dir_all(&natives_dir).await;
    }
    tokio::fs::create_dir_all(&natives_dir)
        .await
        .map_err(|e| LauncherError::Io {
            path: natives_dir.clone(),
            source: e,
        })?;

    for rel in &plan.natives {
        let jar_path = context.root().join(rel);
        let jar_bytes = tokio::fs::read(&jar_path)
            .await
            .map_err(|e| LauncherError::Io {
                path: jar_path.clone(),
                source: e,
            })?;

        let dest_dir = natives_dir.clone();
        tokio::task::spawn_blocking(move || {
            let cursor = std::io::Cursor::new(jar_bytes);
            let mut archive = match zip::ZipArchive::new(cursor) {
                Ok(a) => a,
                Err(e) => {
                    warn!("Cannot open native jar {:?}: {}", jar_path, e);
                    return;
                }
            };

            for i in 0..archive.len() {
                let Ok(mut file) = archive.by_index(i) else {
                    continue;
                };
                let name = file.name().to_string();

                // Only top-level shared libraries; metadata and nested
                // directories never belong in the natives dir.
                if name.contains("META-INF") || name.contains('/') || name.contains('\\') {
                    continue;
                }
                let is_native = name.ends_with(".so")
                    || name.ends_with(".dll")
                    || name.ends_with(".dylib")
                    || name.ends_with(".jnilib");
                if !is_native {
                    continue;
                }

                let dest = dest_dir.join(&name);
                let mut out = match std::fs::File::create(&dest) {
                    Ok(file) => file,
                    Err(_) => continue,
                };
                let _ = std::io::copy(&mut file, &mut out);
                debug!("Extracted native: {}", name);
            }
        })
        .await
        .map_err(|e| LauncherError::Other(format!("Task join error: {}", e)))?;
    }

    Ok(natives_dir)
}
