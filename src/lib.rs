// ─── piston-launch ───
// Resolution-and-launch engine for Minecraft-style launchers: rebuilds the
// runtime artifact set for a requested version and assembles the process
// invocation to run it.
//
// Architecture (data flows strictly forward):
//   version::store    — descriptor cache (memory → disk → remote source)
//   version::resolve  — inheritance chain walk + merge
//   rules             — platform/feature conditional inclusion
//   plan              — deduplicated artifact plan + classpath ordering
//   download          — concurrent fetch pipeline with verify/retry
//   launch            — argument templating into the final LaunchSpec
//
// The CLI shell, progress rendering, authentication flow and process
// spawning are external collaborators; the engine's responsibility ends at
// a validated command plus a fully materialized install root.

pub mod assets;
pub mod context;
pub mod download;
pub mod error;
pub mod http;
pub mod launch;
pub mod maven;
pub mod plan;
pub mod rules;
pub mod session;
pub mod version;

pub use context::Context;
pub use download::{DownloadConfig, DownloadEvent, DownloadReport, Downloader};
pub use error::{FailedArtifact, LauncherError, LauncherResult};
pub use launch::{assemble_launch, extract_natives, LaunchOptions, LaunchSpec};
pub use plan::{ArtifactKind, ArtifactPlan, ArtifactPlanner, ArtifactRef, DuplicatePolicy};
pub use rules::{Rule, RuleContext};
pub use session::Session;
pub use version::{
    resolve_version, EffectiveVersionSpec, ManifestSource, ManifestStore, MojangSource,
    VersionManifest,
};
