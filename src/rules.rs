// ─── Rule Evaluator ───
// Pure predicate evaluation for platform/feature conditional inclusion,
// shared by library filtering and argument filtering.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

/// Platform half of a rule. All present fields must match.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct OsMatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    /// Regex pattern matched against the OS version string, not an equality.
    #[serde(default)]
    pub version: Option<String>,
}

/// One conditional-inclusion rule as declared in a version manifest.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsMatch>,
    #[serde(default)]
    pub features: Option<BTreeMap<String, bool>>,
}

/// The platform/feature context rules are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleContext {
    /// Manifest OS family name: "windows", "osx" or "linux".
    pub os_name: String,
    /// Raw OS version string; empty when unknown.
    pub os_version: String,
    pub arch: String,
    pub features: BTreeMap<String, bool>,
}

impl RuleContext {
    /// Context for the host platform. The OS version string is left empty;
    /// callers that care about version-gated rules set it explicitly.
    pub fn current() -> Self {
        Self {
            os_name: current_os_name().to_string(),
            os_version: String::new(),
            arch: std::env::consts::ARCH.to_string(),
            features: BTreeMap::new(),
        }
    }

    pub fn with_os_version(mut self, version: impl Into<String>) -> Self {
        self.os_version = version.into();
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), enabled);
        self
    }

    /// A feature absent from the context counts as disabled, not as an error.
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

/// The manifest OS family name for the current platform.
pub fn current_os_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "osx"
    } else {
        "linux"
    }
}

/// Evaluate an ordered rule list against a context.
///
/// Semantics (Mojang schema):
/// - No rules at all → allowed.
/// - Otherwise start from "disallowed"; each rule whose conditions match
///   sets the state to its action. The last matching rule wins.
pub fn evaluate(rules: &[Rule], ctx: &RuleContext) -> bool {
    if rules.is_empty() {
        return true;
    }

    let mut allowed = false;
    for rule in rules {
        if rule_matches(rule, ctx) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

fn rule_matches(rule: &Rule, ctx: &RuleContext) -> bool {
    if let Some(os) = &rule.os {
        if let Some(name) = &os.name {
            if name != &ctx.os_name {
                return false;
            }
        }
        if let Some(arch) = &os.arch {
            if !arch.eq_ignore_ascii_case(&ctx.arch) {
                return false;
            }
        }
        if let Some(pattern) = &os.version {
            match regex::Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(&ctx.os_version) {
                        return false;
                    }
                }
                Err(e) => {
                    warn!("Unparseable os.version rule pattern {:?}: {}", pattern, e);
                    return false;
                }
            }
        }
    }

    if let Some(features) = &rule.features {
        for (name, wanted) in features {
            if ctx.feature_enabled(name) != *wanted {
                return false;
            }
        }
    }

    true
}
