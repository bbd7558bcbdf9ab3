use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::{CommandRunner, Invocation};
use crate::report::Reporter;

pub const TAG_FILE: &str = "tag";

/// Short commit ids of the stack and config checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub stack: String,
    pub config: String,
}

impl fmt::Display for TagInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.stack, self.config)
    }
}

/// Short HEAD commit of the git working tree containing `root`, or `None`
/// when `root` is not in a git repository or git is unavailable.
pub fn short_head(runner: &dyn CommandRunner, root: &Path) -> Option<String> {
    let invocation = Invocation::new("git")
        .arg("rev-parse")
        .arg("--short")
        .arg("HEAD")
        .current_dir(root);

    match runner.run(&invocation) {
        Ok(output) if output.success() => {
            let head = output.stdout.trim().to_string();
            if head.is_empty() {
                None
            } else {
                Some(head)
            }
        }
        Ok(output) => {
            debug!(
                "{} is not a git checkout (exit code {}): {}",
                root.display(),
                output.exit_code,
                output.stderr.trim()
            );
            None
        }
        Err(e) => {
            debug!("Unable to query git in {}: {}", root.display(), e);
            None
        }
    }
}

/// Build the tag from both checkouts. A tag needs both commit ids; when only
/// one side is a git checkout a warning is reported and no tag is produced.
pub fn extract_tag(
    runner: &dyn CommandRunner,
    stack_root: &Path,
    config_root: &Path,
    reporter: &mut Reporter,
) -> Option<TagInfo> {
    let stack = short_head(runner, stack_root);
    let config = if config_root == stack_root {
        stack.clone()
    } else {
        short_head(runner, config_root)
    };

    match (stack, config) {
        (Some(stack), Some(config)) => Some(TagInfo { stack, config }),
        (None, None) => {
            debug!("Neither stack nor config is a git checkout, no tag extracted");
            None
        }
        (Some(_), None) | (None, Some(_)) => {
            reporter.warning(format!(
                "Warning, only one of {} and {} is a git checkout, no tag file written",
                stack_root.display(),
                config_root.display()
            ));
            None
        }
    }
}

pub fn write_tag(output: &Path, tag: &TagInfo) -> Result<PathBuf> {
    let path = output.join(TAG_FILE);
    fs::write(&path, format!("{}\n", tag))
        .with_context(|| format!("Failed to write tag file {}", path.display()))?;
    info!("Wrote tag {} to {}", tag, path.display());
    Ok(path)
}
