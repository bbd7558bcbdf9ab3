use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::layers::Layer;
use crate::error::ToolkitError;

/// Files and directories written while copying one layer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
}

impl std::ops::AddAssign for CopyStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.dirs += other.dirs;
    }
}

/// Empty the output directory so every run starts from scratch.
///
/// Fails if the output directory is one of the layers, lives inside one,
/// or contains one: clearing or filling it would then corrupt a source.
pub fn prepare_output(output: &Path, layers: &[Layer]) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;

    let canonical_output = canonicalize(output)?;
    for layer in layers {
        let canonical_layer = canonicalize(&layer.path)?;
        if canonical_layer.starts_with(&canonical_output)
            || canonical_output.starts_with(&canonical_layer)
        {
            return Err(ToolkitError::OutputOverlapsSource {
                output: output.to_path_buf(),
                source_dir: layer.path.clone(),
            }
            .into());
        }
    }

    debug!("Clearing output directory {}", output.display());
    fs::remove_dir_all(output)
        .with_context(|| format!("Failed to clear output directory {}", output.display()))?;
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    Ok(())
}

/// Copy every layer into `output` in order. Files from later layers replace
/// files at the same relative path from earlier ones.
pub fn copy_layers(layers: &[Layer], output: &Path) -> Result<CopyStats> {
    let mut total = CopyStats::default();
    for layer in layers {
        let stats = copy_layer(layer, output)?;
        info!(
            "Merged {} layer {}: {} files, {} directories",
            layer.kind,
            layer.path.display(),
            stats.files,
            stats.dirs
        );
        total += stats;
    }
    Ok(total)
}

/// Copy a single layer's tree into `output`, skipping `.git` directories.
pub fn copy_layer(layer: &Layer, output: &Path) -> Result<CopyStats> {
    let mut stats = CopyStats::default();

    let walker = WalkDir::new(&layer.path)
        .follow_links(true)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", layer.path.display()))?;
        let relative = entry
            .path()
            .strip_prefix(&layer.path)
            .with_context(|| {
                format!(
                    "{} is outside {}",
                    entry.path().display(),
                    layer.path.display()
                )
            })?;
        let dest = output.join(relative);

        if entry.file_type().is_dir() {
            if dest.is_file() {
                fs::remove_file(&dest)
                    .with_context(|| format!("Failed to replace file {}", dest.display()))?;
            }
            fs::create_dir_all(&dest)
                .with_context(|| format!("Failed to create directory {}", dest.display()))?;
            stats.dirs += 1;
        } else {
            if dest.is_dir() {
                fs::remove_dir_all(&dest)
                    .with_context(|| format!("Failed to replace directory {}", dest.display()))?;
            } else if dest.symlink_metadata().is_ok() {
                // An earlier layer's copy may be read-only.
                fs::remove_file(&dest)
                    .with_context(|| format!("Failed to replace file {}", dest.display()))?;
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {}", parent.display()))?;
            }
            debug!("Copying {} -> {}", entry.path().display(), dest.display());
            fs::copy(entry.path(), &dest).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    dest.display()
                )
            })?;
            stats.files += 1;
        }
    }

    Ok(stats)
}

fn canonicalize(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))
}
