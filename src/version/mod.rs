pub mod descriptor;
pub mod manifest;
pub mod resolve;
pub mod store;

pub use descriptor::VersionDescriptor;
pub use manifest::{VersionEntry, VersionManifest};
pub use resolve::{resolve_version, EffectiveVersionSpec, ResolvedLibrary};
pub use store::{ManifestSource, ManifestStore, MojangSource, RawDescriptor};
