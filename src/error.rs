use std::path::{Path, PathBuf};
use thiserror::Error;

/// Domain failures that abort a run with exit code 1.
///
/// I/O failures are not listed here: they travel as `anyhow::Error` with the
/// offending path attached as context.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("the stack directory {} does not exist", .0.display())]
    MissingStack(PathBuf),

    #[error(
        "Terraform metadata file {} does not exist{}",
        .primary.display(),
        fallback_note(.fallback.as_deref())
    )]
    MetadataNotFound {
        primary: PathBuf,
        fallback: Option<PathBuf>,
    },

    #[error("{name} is not valid JSON")]
    InvalidJson {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot parse Terraform metadata")]
    InvalidMetadata(#[source] serde_yaml::Error),

    #[error("{name} must be a JSON object")]
    NotAnObject { name: String },

    #[error("EXTRA_PATH must be a JSON array of strings: {0}")]
    InvalidExtraPaths(String),

    #[error(
        "output directory {} overlaps source directory {}",
        .output.display(),
        .source_dir.display()
    )]
    OutputOverlapsSource {
        output: PathBuf,
        source_dir: PathBuf,
    },
}

fn fallback_note(fallback: Option<&Path>) -> String {
    match fallback {
        Some(path) => format!(" (fallback {} does not exist either)", path.display()),
        None => String::new(),
    }
}
