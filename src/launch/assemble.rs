// ─── Launch Assembler ───
// Turns an effective spec, the planned local paths and a session object
// into the final process invocation. Pure assembly: no filesystem or
// network access, and an unresolved placeholder is a hard error. A
// refused launch beats a malformed one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::context::Context;
use crate::error::{LauncherError, LauncherResult};
use crate::plan::{ArtifactKind, ArtifactPlan};
use crate::rules::RuleContext;
use crate::session::Session;
use crate::version::resolve::EffectiveVersionSpec;

use super::classpath_separator;

/// Caller-side launch knobs. The Java executable comes from outside; this
/// engine does not manage runtimes.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub java_executable: PathBuf,
    pub min_memory_mb: Option<u32>,
    pub max_memory_mb: Option<u32>,
    /// Window geometry; also enables the `has_custom_resolution` feature.
    pub resolution: Option<(u32, u32)>,
    /// Enables the `is_demo_user` feature.
    pub demo: bool,
    pub extra_jvm_args: Vec<String>,
    pub extra_game_args: Vec<String>,
    pub launcher_name: String,
    pub launcher_version: String,
}

impl LaunchOptions {
    pub fn new(java_executable: impl Into<PathBuf>) -> Self {
        Self {
            java_executable: java_executable.into(),
            min_memory_mb: None,
            max_memory_mb: None,
            resolution: None,
            demo: false,
            extra_jvm_args: Vec::new(),
            extra_game_args: Vec::new(),
            launcher_name: "piston-launch".into(),
            launcher_version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::new("java")
    }
}

/// The assembled invocation, handed to an external process-launching
/// collaborator. Built once per launch.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub jvm_args: Vec<String>,
    pub main_class: String,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    /// Full argv, executable first.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.jvm_args.len() + self.game_args.len() + 2);
        argv.push(self.executable.to_string_lossy().into_owned());
        argv.extend(self.jvm_args.iter().cloned());
        argv.push(self.main_class.clone());
        argv.extend(self.game_args.iter().cloned());
        argv
    }
}

/// Assemble the launch invocation for `spec` with the artifacts at the
/// paths `plan` resolved. Argument templates are rule-filtered exactly
/// like libraries were, then every `${...}` placeholder is substituted.
pub fn assemble_launch(
    spec: &EffectiveVersionSpec,
    plan: &ArtifactPlan,
    context: &Context,
    session: &Session,
    options: &LaunchOptions,
    rules_ctx: &RuleContext,
) -> LauncherResult<LaunchSpec> {
    let mut ctx = rules_ctx.clone();
    ctx.features
        .entry("is_demo_user".to_string())
        .or_insert(options.demo);
    ctx.features
        .entry("has_custom_resolution".to_string())
        .or_insert(options.resolution.is_some());

    let vars = substitution_map(spec, plan, context, session, options);

    let mut jvm_args: Vec<String> = Vec::new();
    if let Some(min) = options.min_memory_mb {
        jvm_args.push(format!("-Xms{}M", min));
    }
    if let Some(max) = options.max_memory_mb {
        jvm_args.push(format!("-Xmx{}M", max));
    }

    // Versions predating JVM argument templates still need the natives path
    // and the classpath wired in.
    if spec.jvm_args.is_empty() {
        for template in [
            "-Djava.library.path=${natives_directory}",
            "-cp",
            "${classpath}",
        ] {
            jvm_args.push(substitute(template, &vars)?);
        }
    } else {
        for argument in &spec.jvm_args {
            for template in argument.templates(&ctx) {
                jvm_args.push(substitute(template, &vars)?);
            }
        }
    }

    if let Some(logging) = &spec.logging {
        if plan
            .artifacts
            .iter()
            .any(|a| a.kind == ArtifactKind::LogConfig)
        {
            jvm_args.push(substitute(&logging.argument, &vars)?);
        }
    }
    jvm_args.extend(options.extra_jvm_args.iter().cloned());

    let mut game_args: Vec<String> = Vec::new();
    for argument in &spec.game_args {
        for template in argument.templates(&ctx) {
            game_args.push(substitute(template, &vars)?);
        }
    }
    game_args.extend(options.extra_game_args.iter().cloned());

    Ok(LaunchSpec {
        executable: options.java_executable.clone(),
        jvm_args,
        main_class: spec.main_class.clone(),
        game_args,
        working_dir: context.root().to_path_buf(),
        env: native_library_env(&context.natives_dir(&spec.id)),
    })
}

fn substitution_map(
    spec: &EffectiveVersionSpec,
    plan: &ArtifactPlan,
    context: &Context,
    session: &Session,
    options: &LaunchOptions,
) -> HashMap<String, String> {
    let mut vars: HashMap<String, String> = HashMap::new();

    // Session fields: empty values stay out of the map so templates that
    // reference them fail loudly instead of emitting blanks.
    put_nonempty(&mut vars, "auth_player_name", &session.username);
    put_nonempty(&mut vars, "auth_uuid", &session.uuid);
    put_nonempty(&mut vars, "auth_access_token", &session.access_token);
    put_nonempty(&mut vars, "auth_xuid", &session.xuid);
    put_nonempty(&mut vars, "user_type", &session.user_type);
    put_nonempty(&mut vars, "clientid", &session.client_id);
    if !session.access_token.is_empty() && !session.uuid.is_empty() {
        vars.insert("auth_session".to_string(), session.session_token());
    }

    vars.insert("user_properties".into(), "{}".into());
    vars.insert("version_name".into(), spec.id.clone());
    vars.insert("version_type".into(), spec.release_type.clone());
    vars.insert("game_directory".into(), path_str(context.root()));
    vars.insert("assets_root".into(), path_str(&context.assets_dir()));
    vars.insert("game_assets".into(), path_str(&context.assets_dir()));
    vars.insert("assets_index_name".into(), plan.asset_index_id.clone());
    vars.insert(
        "natives_directory".into(),
        path_str(&context.natives_dir(&spec.id)),
    );
    vars.insert(
        "library_directory".into(),
        path_str(&context.libraries_dir()),
    );
    vars.insert("launcher_name".into(), options.launcher_name.clone());
    vars.insert("launcher_version".into(), options.launcher_version.clone());
    vars.insert(
        "classpath_separator".into(),
        classpath_separator().to_string(),
    );
    vars.insert("classpath".into(), classpath_string(plan, context));

    if let Some((width, height)) = options.resolution {
        vars.insert("resolution_width".into(), width.to_string());
        vars.insert("resolution_height".into(), height.to_string());
    }

    if let Some(logging) = &spec.logging {
        let config_path = context.log_configs_dir().join(&logging.file.id);
        vars.insert("path".into(), path_str(&config_path));
    }

    vars
}

fn put_nonempty(vars: &mut HashMap<String, String>, key: &str, value: &str) {
    if !value.is_empty() {
        vars.insert(key.to_string(), value.to_string());
    }
}

fn classpath_string(plan: &ArtifactPlan, context: &Context) -> String {
    plan.classpath
        .iter()
        .map(|rel| path_str(&context.root().join(rel)))
        .collect::<Vec<_>>()
        .join(classpath_separator())
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Replace every `${key}` in `template`. A key with no supplied value
/// fails with `MissingSubstitution` naming it; an unterminated `${` is
/// kept literally.
fn substitute(template: &str, vars: &HashMap<String, String>) -> LauncherResult<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        match rest.find("${") {
            None => {
                out.push_str(rest);
                return Ok(out);
            }
            Some(start) => {
                out.push_str(&rest[..start]);
                let tail = &rest[start + 2..];
                match tail.find('}') {
                    None => {
                        out.push_str(&rest[start..]);
                        return Ok(out);
                    }
                    Some(end) => {
                        let key = &tail[..end];
                        let value = vars
                            .get(key)
                            .ok_or_else(|| LauncherError::MissingSubstitution(key.to_string()))?;
                        out.push_str(value);
                        rest = &tail[end + 1..];
                    }
                }
            }
        }
    }
}

/// The dynamic-linker search path override pointing the process at the
/// extracted natives.
fn native_library_env(natives_dir: &Path) -> Vec<(String, String)> {
    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };

    let natives = path_str(natives_dir);
    let value = match std::env::var(var) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", natives, path_list_separator(), existing)
        }
        _ => natives,
    };

    vec![(var.to_string(), value)]
}

fn path_list_separator() -> &'static str {
    if cfg!(target_os = "windows") {
        ";"
    } else {
        ":"
    }
}
