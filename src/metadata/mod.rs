pub mod emit;
pub mod git;
pub mod terraform;
pub mod vars;

use anyhow::Result;
use log::info;
use std::collections::BTreeMap;

pub use emit::EmittedFiles;
pub use git::TagInfo;
pub use vars::{VarOrigin, VarValue, Variable, VariableSet};

use crate::config::ExtractConfig;
use crate::report::Reporter;

/// Merge Terraform outputs and extra vars. Extra vars are applied last and
/// replace Terraform outputs with the same key.
pub fn collect_variables(
    terraform: Vec<(String, VarValue)>,
    extra: &BTreeMap<String, VarValue>,
) -> VariableSet {
    let mut vars = VariableSet::new();
    vars.extend(terraform, VarOrigin::Terraform);
    vars.extend(
        extra.iter().map(|(k, v)| (k.clone(), v.clone())),
        VarOrigin::Extra,
    );
    vars
}

/// Standalone extraction: the metadata file must exist, and both output
/// files are always written.
pub fn extract_terraform_outputs(
    config: &ExtractConfig,
    reporter: &mut Reporter,
) -> Result<EmittedFiles> {
    let path = terraform::locate_required(&config.metadata, reporter)?;
    let outputs = terraform::load(&path)?;
    let vars = collect_variables(outputs, &config.extra_vars);
    info!(
        "Extracting {} variables into {}",
        vars.len(),
        config.output.display()
    );
    emit::write_outputs(&config.output, &vars, reporter)
}
