use anyhow::Result;
use log::{debug, info};
use std::fmt;
use std::path::PathBuf;

use crate::config::MergeConfig;
use crate::error::ToolkitError;
use crate::report::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Stack,
    Config,
    /// Position in the caller-supplied extra path list.
    Extra(usize),
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerKind::Stack => write!(f, "stack"),
            LayerKind::Config => write!(f, "config"),
            LayerKind::Extra(index) => write!(f, "extra[{}]", index),
        }
    }
}

/// A source directory to copy into the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    pub kind: LayerKind,
    pub path: PathBuf,
}

/// Resolve the directories taking part in the merge, lowest precedence
/// first: stack, config, then extra paths in the order given.
///
/// A missing stack directory is fatal. A missing config directory or extra
/// path only produces a warning and is left out.
pub fn resolve_layers(config: &MergeConfig, reporter: &mut Reporter) -> Result<Vec<Layer>> {
    let stack_dir = config.stack_dir();
    if !stack_dir.is_dir() {
        return Err(ToolkitError::MissingStack(stack_dir).into());
    }

    let mut layers = vec![Layer {
        kind: LayerKind::Stack,
        path: stack_dir,
    }];

    let config_dir = config.config_dir();
    if config_dir.is_dir() {
        layers.push(Layer {
            kind: LayerKind::Config,
            path: config_dir,
        });
    } else {
        reporter.warning(format!(
            "Warning, CONFIG_PATH if not configured or missing, \
             the config directory {} does not exist and is skipped",
            config_dir.display()
        ));
    }

    for (index, extra) in config.extra_paths.iter().enumerate() {
        if extra.is_dir() {
            debug!("Adding extra path {} at position {}", extra.display(), index);
            layers.push(Layer {
                kind: LayerKind::Extra(index),
                path: extra.clone(),
            });
        } else {
            reporter.warning(format!(
                "Warning, the extra directory {} does not exist and is skipped",
                extra.display()
            ));
        }
    }

    info!(
        "Resolved {} layers: {}",
        layers.len(),
        layers
            .iter()
            .map(|l| format!("{}={}", l.kind, l.path.display()))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(layers)
}
