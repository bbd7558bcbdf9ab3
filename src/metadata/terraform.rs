use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};

use super::vars::VarValue;
use crate::config::MetadataSource;
use crate::error::ToolkitError;
use crate::report::Reporter;

/// One entry of `terraform output -json`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OutputEntry {
    value: JsonValue,
    #[serde(rename = "type")]
    kind: Option<JsonValue>,
    sensitive: Option<bool>,
}

/// Find the metadata file: the primary path if it exists, otherwise the
/// fallback (with a warning). `None` when neither exists.
pub fn locate(source: &MetadataSource, reporter: &mut Reporter) -> Option<PathBuf> {
    if source.primary.is_file() {
        return Some(source.primary.clone());
    }

    let fallback = source.fallback.as_ref()?;
    reporter.warning(format!(
        "Warning: Terraform metadata file {} does not exist, falling back to {}",
        source.primary.display(),
        fallback.display()
    ));

    if fallback.is_file() {
        Some(fallback.clone())
    } else {
        debug!("Fallback metadata file {} does not exist", fallback.display());
        None
    }
}

/// Like [`locate`], but a missing file is an error.
pub fn locate_required(source: &MetadataSource, reporter: &mut Reporter) -> Result<PathBuf> {
    locate(source, reporter).ok_or_else(|| {
        ToolkitError::MetadataNotFound {
            primary: source.primary.clone(),
            fallback: source.fallback.clone(),
        }
        .into()
    })
}

/// Read and parse a metadata file into `(key, value)` pairs, sorted by key.
pub fn load(path: &Path) -> Result<Vec<(String, VarValue)>> {
    info!("Reading Terraform metadata from {}", path.display());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read Terraform metadata file {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid Terraform metadata file {}", path.display()))
}

/// Parse metadata content. The document must be a mapping (JSON or YAML).
/// Entries shaped like `terraform output -json` are reduced to their value.
pub fn parse(content: &str) -> Result<Vec<(String, VarValue)>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document: JsonValue =
        serde_yaml::from_str(content).map_err(ToolkitError::InvalidMetadata)?;

    let JsonValue::Object(outputs) = document else {
        return Err(ToolkitError::NotAnObject {
            name: "Terraform metadata".to_string(),
        }
        .into());
    };

    let mut vars: Vec<(String, VarValue)> = outputs
        .into_iter()
        .map(|(key, value)| (key, VarValue::from(unwrap_output_entry(value))))
        .collect();
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    debug!("Parsed {} Terraform outputs", vars.len());
    Ok(vars)
}

fn unwrap_output_entry(value: JsonValue) -> JsonValue {
    if !value.is_object() {
        return value;
    }
    match OutputEntry::deserialize(&value) {
        Ok(entry) if entry.kind.is_some() || entry.sensitive.is_some() => entry.value,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::write_tree;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_flat_metadata() {
        let vars = parse(r#"{"terraform": "output", "count": 3}"#).unwrap();
        assert_eq!(
            vars,
            vec![
                ("count".to_string(), VarValue::from(json!(3))),
                ("terraform".to_string(), VarValue::from("output")),
            ]
        );
    }

    #[test]
    fn test_parse_terraform_output_json() {
        let vars = parse(
            r#"{
                "ip": {"sensitive": false, "type": "string", "value": "10.0.0.1"},
                "ids": {"sensitive": false, "type": ["list", "string"], "value": ["a", "b"]},
                "plain_map": {"value": "kept as map", "other": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(vars[0], ("ids".to_string(), VarValue::from(json!(["a", "b"]))));
        assert_eq!(vars[1], ("ip".to_string(), VarValue::from("10.0.0.1")));
        assert_eq!(
            vars[2],
            (
                "plain_map".to_string(),
                VarValue::from(json!({"value": "kept as map", "other": 1}))
            )
        );
    }

    #[test]
    fn test_parse_yaml_metadata() {
        let vars = parse("foo: bar with spaces\n").unwrap();
        assert_eq!(vars, vec![("foo".to_string(), VarValue::from("bar with spaces"))]);
    }

    #[test]
    fn test_parse_rejects_non_mapping() {
        let err = parse(r#"["a", "b"]"#).unwrap_err();
        assert!(err.to_string().contains("must be a JSON object"));
        assert!(parse("{ broken").is_err());
        assert!(parse("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_locate_prefers_primary() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("metadata", "{}"), ("default", "{}")]);
        let source = MetadataSource {
            primary: tmp.path().join("metadata"),
            fallback: Some(tmp.path().join("default")),
        };
        let mut reporter = Reporter::quiet();
        assert_eq!(locate(&source, &mut reporter), Some(tmp.path().join("metadata")));
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_locate_falls_back_with_warning() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("metadata", "{}")]);
        let source = MetadataSource {
            primary: tmp.path().join("fake-file"),
            fallback: Some(tmp.path().join("metadata")),
        };
        let mut reporter = Reporter::quiet();
        assert_eq!(locate(&source, &mut reporter), Some(tmp.path().join("metadata")));
        assert_eq!(reporter.warnings().len(), 1);
        assert!(reporter.warnings()[0].starts_with("Warning:"));
        assert!(reporter.warnings()[0].contains("does not exist"));
    }

    #[test]
    fn test_locate_required_errors_when_missing() {
        let tmp = TempDir::new().unwrap();
        let source = MetadataSource {
            primary: tmp.path().join("fake-file"),
            fallback: None,
        };
        let mut reporter = Reporter::quiet();
        let err = locate_required(&source, &mut reporter).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ToolkitError>(),
            Some(ToolkitError::MetadataNotFound { .. })
        ));
        assert!(err.to_string().ends_with("does not exist"));
    }

    #[test]
    fn test_locate_required_names_fallback_when_both_missing() {
        let tmp = TempDir::new().unwrap();
        let source = MetadataSource {
            primary: tmp.path().join("fake-file"),
            fallback: Some(tmp.path().join("fake-default")),
        };
        let mut reporter = Reporter::quiet();
        let err = locate_required(&source, &mut reporter).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&tmp.path().join("fake-file").display().to_string()));
        assert!(message.contains(&tmp.path().join("fake-default").display().to_string()));
        assert_eq!(reporter.warnings().len(), 1);
    }

    #[test]
    fn test_load_reports_path_on_error() {
        let tmp = TempDir::new().unwrap();
        write_tree(tmp.path(), &[("metadata", "[1]")]);
        let err = load(&tmp.path().join("metadata")).unwrap_err();
        assert!(err.to_string().starts_with("Invalid Terraform metadata file"));
    }
}
