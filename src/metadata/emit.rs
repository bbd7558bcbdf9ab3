use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::vars::{VarOrigin, Variable, VariableSet};
use crate::report::Reporter;

/// Group variables file, relative to the output directory.
pub const GROUP_VARS_FILE: &str = "group_vars/all";
/// Shell export file, relative to the output directory.
pub const ENV_FILE: &str = "env";

static INVALID_ENV_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("static regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFiles {
    pub group_vars: PathBuf,
    pub env: PathBuf,
}

/// Render variables as a YAML mapping, one top-level key per variable.
///
/// Terraform outputs go through the YAML serializer (`foo: bar`). Extra
/// vars keep their JSON form (`foo: "bar"`), so multi-line strings stay on
/// one line with `\n` escapes.
pub fn render_yaml(vars: &VariableSet) -> Result<String> {
    let mut out = String::new();
    for (key, var) in vars.iter() {
        let value = var.value.to_json();
        match var.origin {
            VarOrigin::Terraform => {
                let mut entry = BTreeMap::new();
                entry.insert(key.as_str(), &value);
                let rendered = serde_yaml::to_string(&entry)
                    .with_context(|| format!("Failed to render variable {} as YAML", key))?;
                out.push_str(&rendered);
            }
            VarOrigin::Extra => {
                let rendered = serde_json::to_string(&value)
                    .with_context(|| format!("Failed to render variable {} as JSON", key))?;
                out.push_str(&format!("{}: {}\n", yaml_key(key)?, rendered));
            }
        }
    }
    Ok(out)
}

fn yaml_key(key: &str) -> Result<String> {
    let rendered = serde_yaml::to_string(key)
        .with_context(|| format!("Failed to render key {}", key))?;
    Ok(rendered.trim_end().to_string())
}

/// Two variables whose keys map to the same shell name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKeyCollision {
    pub name: String,
    pub kept: String,
    pub dropped: String,
}

/// Render variables as `export key="value"` lines, one per shell name.
///
/// When several keys map to the same name an extra var beats a Terraform
/// output, and within one origin a key that is already a valid name beats
/// one that had to be rewritten. Every dropped key is returned.
pub fn render_env(vars: &VariableSet) -> (String, Vec<EnvKeyCollision>) {
    let mut entries: BTreeMap<String, (&String, &Variable)> = BTreeMap::new();
    let mut collisions = Vec::new();

    for (key, var) in vars.iter() {
        match entries.entry(env_key(key)) {
            Entry::Vacant(slot) => {
                slot.insert((key, var));
            }
            Entry::Occupied(mut slot) => {
                let name = slot.key().clone();
                let (current_key, current) = *slot.get();
                let replace = env_rank(key, var, &name) > env_rank(current_key, current, &name);
                let (kept, dropped) = if replace {
                    (key, current_key)
                } else {
                    (current_key, key)
                };
                collisions.push(EnvKeyCollision {
                    name,
                    kept: kept.clone(),
                    dropped: dropped.clone(),
                });
                if replace {
                    slot.insert((key, var));
                }
            }
        }
    }

    let content: String = entries
        .iter()
        .map(|(name, (_, var))| {
            format!(
                "export {}=\"{}\"\n",
                name,
                escape_double_quoted(&var.value.to_plain_string())
            )
        })
        .collect();
    (content, collisions)
}

fn env_rank(key: &str, var: &Variable, name: &str) -> (bool, bool) {
    (var.origin == VarOrigin::Extra, key == name)
}

/// Turn an arbitrary key into a valid shell variable name.
pub fn env_key(key: &str) -> String {
    let cleaned = INVALID_ENV_CHARS.replace_all(key, "_").into_owned();
    match cleaned.chars().next() {
        None => "_".to_string(),
        Some(c) if c.is_ascii_digit() => format!("_{}", cleaned),
        Some(_) => cleaned,
    }
}

/// Escape a value for use inside shell double quotes. Newlines become a
/// literal `\n`.
pub fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Write the YAML and env renderings under `output`.
pub fn write_outputs(
    output: &Path,
    vars: &VariableSet,
    reporter: &mut Reporter,
) -> Result<EmittedFiles> {
    let group_vars = output.join(GROUP_VARS_FILE);
    reporter.progress(&format!(
        "Extracting Terraform outputs as YAML to {}",
        group_vars.display()
    ));
    write_file(&group_vars, &render_yaml(vars)?)?;

    let env = output.join(ENV_FILE);
    reporter.progress(&format!(
        "Extracting Terraform outputs as a shell export file to {}",
        env.display()
    ));
    let (content, collisions) = render_env(vars);
    for collision in collisions {
        reporter.warning(format!(
            "Warning: variables {} and {} both export as {}, keeping {}",
            collision.kept, collision.dropped, collision.name, collision.kept
        ));
    }
    write_file(&env, &content)?;

    Ok(EmittedFiles { group_vars, env })
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
