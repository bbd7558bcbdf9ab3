//! Run configuration, built once from parsed command-line arguments.
//!
//! Every option can also come from an environment variable (see
//! [`crate::cli`]); by the time a config struct exists all JSON inputs have
//! been parsed and validated.

use anyhow::Result;
use clap::ArgMatches;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ToolkitError;
use crate::metadata::vars::VarValue;

/// Where to look for Terraform output metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataSource {
    pub primary: PathBuf,
    pub fallback: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeConfig {
    pub stack_root: PathBuf,
    pub stack_path: Option<PathBuf>,
    pub config_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub output: PathBuf,
    pub extra_paths: Vec<PathBuf>,
    pub extra_vars: BTreeMap<String, VarValue>,
    pub metadata: MetadataSource,
}

impl MergeConfig {
    pub fn new(
        stack_root: impl Into<PathBuf>,
        config_root: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        MergeConfig {
            stack_root: stack_root.into(),
            stack_path: None,
            config_root: config_root.into(),
            config_path: None,
            output: output.into(),
            extra_paths: Vec::new(),
            extra_vars: BTreeMap::new(),
            metadata: MetadataSource {
                primary: PathBuf::from("terraform/metadata"),
                fallback: None,
            },
        }
    }

    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Ok(MergeConfig {
            stack_root: required_path(matches, "stack-root"),
            stack_path: optional_path(matches, "stack-path"),
            config_root: required_path(matches, "config-root"),
            config_path: optional_path(matches, "config-path"),
            output: required_path(matches, "output"),
            extra_paths: parse_extra_paths(optional_str(matches, "extra-paths"))?,
            extra_vars: parse_extra_vars(optional_str(matches, "extra-vars"))?,
            metadata: metadata_source(matches),
        })
    }

    /// Stack directory: the stack root joined with the optional sub-path.
    pub fn stack_dir(&self) -> PathBuf {
        join_optional(&self.stack_root, self.stack_path.as_ref())
    }

    pub fn config_dir(&self) -> PathBuf {
        join_optional(&self.config_root, self.config_path.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub output: PathBuf,
    pub extra_vars: BTreeMap<String, VarValue>,
    pub metadata: MetadataSource,
}

impl ExtractConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        Ok(ExtractConfig {
            output: required_path(matches, "output"),
            extra_vars: parse_extra_vars(optional_str(matches, "extra-vars"))?,
            metadata: metadata_source(matches),
        })
    }
}

fn optional_str<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches
        .get_one::<String>(id)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

fn optional_path(matches: &ArgMatches, id: &str) -> Option<PathBuf> {
    optional_str(matches, id).map(PathBuf::from)
}

fn required_path(matches: &ArgMatches, id: &str) -> PathBuf {
    optional_path(matches, id).unwrap_or_else(|| PathBuf::from("."))
}

fn metadata_source(matches: &ArgMatches) -> MetadataSource {
    MetadataSource {
        primary: required_path(matches, "terraform-metadata"),
        fallback: optional_path(matches, "terraform-default-metadata"),
    }
}

fn join_optional(root: &Path, sub: Option<&PathBuf>) -> PathBuf {
    match sub {
        Some(sub) => root.join(sub),
        None => root.to_path_buf(),
    }
}

/// Parse the extra-paths JSON array. Missing or empty input means no paths.
pub fn parse_extra_paths(raw: Option<&str>) -> Result<Vec<PathBuf>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let paths: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| ToolkitError::InvalidExtraPaths(e.to_string()))?;

    Ok(paths
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Parse the extra-vars JSON object. Missing or empty input means no vars.
pub fn parse_extra_vars(raw: Option<&str>) -> Result<BTreeMap<String, VarValue>> {
    let Some(raw) = raw else {
        return Ok(BTreeMap::new());
    };

    let value: JsonValue =
        serde_json::from_str(raw).map_err(|source| ToolkitError::InvalidJson {
            name: "EXTRA_ANSIBLE_VARS".to_string(),
            source,
        })?;

    match value {
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| (key, VarValue::from(value)))
            .collect()),
        _ => Err(ToolkitError::NotAnObject {
            name: "EXTRA_ANSIBLE_VARS".to_string(),
        }
        .into()),
    }
}
