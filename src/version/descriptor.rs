// ─── Version Descriptor ───
// Serde model of one version JSON, byte-for-byte aligned with the external
// schema. Parsed by the manifest store and never mutated afterwards; the
// resolver merges whole inheritance chains into an EffectiveVersionSpec.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::rules::{evaluate, Rule, RuleContext};

/// A fully parsed version JSON.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub inherits_from: Option<String>,
    #[serde(default)]
    pub main_class: Option<String>,
    #[serde(default)]
    pub asset_index: Option<AssetIndexRef>,
    #[serde(default)]
    pub downloads: Option<VersionDownloads>,
    #[serde(default)]
    pub libraries: Vec<LibraryEntry>,
    #[serde(default)]
    pub arguments: Option<ArgumentTemplates>,
    /// Legacy `minecraftArguments` field (pre-1.13). A child declaring it
    /// fully replaces the game arguments inherited from its ancestors.
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub java_version: Option<JavaVersionInfo>,
    #[serde(default)]
    pub logging: Option<LoggingInfo>,
    #[serde(default)]
    pub minimum_launcher_version: Option<u32>,
    #[serde(rename = "type", default)]
    pub release_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersionInfo {
    pub major_version: u32,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VersionDownloads {
    pub client: Option<DownloadInfo>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DownloadInfo {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexRef {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub total_size: Option<u64>,
}

// ─── Libraries ───

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LibraryEntry {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    /// Maven repository base for entries that carry only a coordinate
    /// (loader-style metadata).
    #[serde(default)]
    pub url: Option<String>,
    /// OS family → natives classifier, possibly containing `${arch}`.
    #[serde(default)]
    pub natives: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: BTreeMap<String, LibraryArtifact>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LibraryArtifact {
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

// ─── Arguments ───

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ArgumentTemplates {
    #[serde(default)]
    pub game: Vec<Argument>,
    #[serde(default)]
    pub jvm: Vec<Argument>,
}

/// One argument template entry: either a plain string or a rule-guarded
/// value that only applies when its rules allow the current context.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Argument {
    Plain(String),
    Conditional {
        #[serde(default)]
        rules: Vec<Rule>,
        value: ArgumentValue,
    },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgumentValue {
    Single(String),
    Many(Vec<String>),
}

impl Argument {
    /// The template strings this entry contributes under `ctx`; empty when
    /// its rules exclude it.
    pub fn templates<'a>(&'a self, ctx: &RuleContext) -> Vec<&'a str> {
        match self {
            Argument::Plain(s) => vec![s.as_str()],
            Argument::Conditional { rules, value } => {
                if !evaluate(rules, ctx) {
                    return Vec::new();
                }
                match value {
                    ArgumentValue::Single(s) => vec![s.as_str()],
                    ArgumentValue::Many(many) => many.iter().map(String::as_str).collect(),
                }
            }
        }
    }
}

// ─── Logging ───

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingInfo {
    #[serde(default)]
    pub client: Option<LoggingClient>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingClient {
    /// JVM argument template referencing the config file as `${path}`.
    pub argument: String,
    pub file: LoggingFile,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingFile {
    pub id: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}
