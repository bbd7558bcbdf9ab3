pub mod copier;
pub mod layers;

use anyhow::Result;
use log::info;

pub use copier::CopyStats;
pub use layers::{Layer, LayerKind};

use crate::config::MergeConfig;
use crate::metadata::{self, git, terraform, EmittedFiles, TagInfo};
use crate::process::CommandRunner;
use crate::report::Reporter;

/// What a merge run produced.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub layers: Vec<Layer>,
    pub copied: CopyStats,
    pub tag: Option<TagInfo>,
    pub variables: usize,
    pub emitted: Option<EmittedFiles>,
}

/// Run the whole merge: resolve layers, copy them into a fresh output
/// directory, then inject the git tag and variable files.
///
/// Stops at the first fatal error; whatever was already written to the
/// output directory stays there.
pub fn run(
    config: &MergeConfig,
    runner: &dyn CommandRunner,
    reporter: &mut Reporter,
) -> Result<MergeSummary> {
    let layers = layers::resolve_layers(config, reporter)?;

    copier::prepare_output(&config.output, &layers)?;
    let copied = copier::copy_layers(&layers, &config.output)?;
    info!(
        "Merged {} files from {} layers into {}",
        copied.files,
        layers.len(),
        config.output.display()
    );

    let tag = git::extract_tag(runner, &config.stack_root, &config.config_root, reporter);
    if let Some(tag) = &tag {
        git::write_tag(&config.output, tag)?;
    }

    let outputs = match terraform::locate(&config.metadata, reporter) {
        Some(path) => terraform::load(&path)?,
        None => {
            reporter.warning(format!(
                "Warning: Terraform metadata file {} does not exist, \
                 no Terraform outputs extracted",
                config.metadata.primary.display()
            ));
            Vec::new()
        }
    };

    let vars = metadata::collect_variables(outputs, &config.extra_vars);
    let emitted = if vars.is_empty() {
        info!("No variables to emit");
        None
    } else {
        Some(metadata::emit::write_outputs(&config.output, &vars, reporter)?)
    };

    Ok(MergeSummary {
        layers,
        copied,
        tag,
        variables: vars.len(),
        emitted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolkitError;
    use crate::process::{CommandOutput, MockCommandRunner};
    use crate::testing::{list_files, write_tree};
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn no_git() -> MockCommandRunner {
        let mut runner = MockCommandRunner::new();
        runner.expect_run().returning(|_| {
            Ok(CommandOutput {
                exit_code: 128,
                stdout: String::new(),
                stderr: "fatal: not a git repository".to_string(),
            })
        });
        runner
    }

    fn fixture() -> (TempDir, MergeConfig) {
        let tmp = TempDir::new().unwrap();
        write_tree(
            tmp.path(),
            &[
                ("stack/stack-file", "File from stack"),
                ("stack/foo/bar", "bar"),
                ("config/config-file", "config"),
                ("config-override/config-file", "config"),
                ("config-override/stack-file", "File from config"),
            ],
        );
        let config = MergeConfig::new(
            tmp.path().join("stack"),
            tmp.path().join("config"),
            tmp.path().join("merged-stack"),
        );
        (tmp, config)
    }

    #[test]
    fn test_basic_merge() {
        let (_tmp, config) = fixture();
        let mut reporter = Reporter::quiet();

        let summary = run(&config, &no_git(), &mut reporter).unwrap();
        assert_eq!(
            list_files(&config.output),
            vec!["config-file", "foo/bar", "stack-file"]
        );
        assert_eq!(summary.layers.len(), 2);
        assert!(summary.tag.is_none());
        assert!(summary.emitted.is_none());
        assert_eq!(summary.variables, 0);
    }

    #[test]
    fn test_config_override_wins() {
        let (tmp, mut config) = fixture();
        config.config_root = tmp.path().join("config-override");
        let mut reporter = Reporter::quiet();

        run(&config, &no_git(), &mut reporter).unwrap();
        assert_eq!(
            fs::read_to_string(config.output.join("stack-file")).unwrap(),
            "File from config"
        );
    }

    #[test]
    fn test_missing_stack_aborts_before_output() {
        let (_tmp, mut config) = fixture();
        config.stack_path = Some(PathBuf::from("fake/directory"));
        let mut reporter = Reporter::quiet();

        let err = run(&config, &MockCommandRunner::new(), &mut reporter).unwrap_err();
        assert!(err.downcast_ref::<ToolkitError>().is_some());
        assert!(!config.output.exists());
    }

    #[test]
    fn test_extra_vars_emitted() {
        let (_tmp, mut config) = fixture();
        config.extra_vars = crate::config::parse_extra_vars(Some(
            r#"{"severallines": "line1\nline2", "foo": "bar"}"#,
        ))
        .unwrap();
        let mut reporter = Reporter::quiet();

        let summary = run(&config, &no_git(), &mut reporter).unwrap();
        let files = summary.emitted.unwrap();
        let yaml = fs::read_to_string(files.group_vars).unwrap();
        assert!(yaml.lines().any(|l| l == r#"foo: "bar""#));
        assert!(yaml.lines().any(|l| l == r#"severallines: "line1\nline2""#));
    }

    #[test]
    fn test_terraform_metadata_merged() {
        let (tmp, mut config) = fixture();
        write_tree(
            tmp.path(),
            &[("terraform-data/metadata", r#"{"terraform": "output"}"#)],
        );
        config.metadata.primary = tmp.path().join("terraform-data/metadata");
        let mut reporter = Reporter::quiet();

        run(&config, &no_git(), &mut reporter).unwrap();
        let yaml = fs::read_to_string(config.output.join("group_vars/all")).unwrap();
        assert!(yaml.lines().any(|l| l == "terraform: output"));
        assert!(reporter
            .warnings()
            .iter()
            .all(|w| !w.contains("Terraform metadata")));
    }

    #[test]
    fn test_git_tag_written() {
        let (_tmp, config) = fixture();
        let mut runner = MockCommandRunner::new();
        runner.expect_run().times(2).returning(|inv| {
            let in_stack = inv.cwd.as_ref().is_some_and(|dir| dir.ends_with("stack"));
            let head = if in_stack { "1a2b3c4" } else { "5d6e7f8" };
            Ok(CommandOutput {
                exit_code: 0,
                stdout: format!("{}\n", head),
                stderr: String::new(),
            })
        });
        let mut reporter = Reporter::quiet();

        let summary = run(&config, &runner, &mut reporter).unwrap();
        assert_eq!(summary.tag.unwrap().to_string(), "1a2b3c4-5d6e7f8");
        assert_eq!(
            fs::read_to_string(config.output.join("tag")).unwrap(),
            "1a2b3c4-5d6e7f8\n"
        );
    }
}
