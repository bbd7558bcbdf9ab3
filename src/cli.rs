use clap::{Arg, ArgAction, Command};

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Increase verbosity (up to -vvv)")
}

fn extra_vars_arg() -> Arg {
    Arg::new("extra-vars")
        .long("extra-vars")
        .env("EXTRA_ANSIBLE_VARS")
        .help("Extra variables as a JSON object, taking precedence over Terraform outputs")
        .value_name("JSON")
}

fn terraform_metadata_arg() -> Arg {
    Arg::new("terraform-metadata")
        .long("terraform-metadata")
        .env("TERRAFORM_METADATA_FILE")
        .help("Terraform output metadata file")
        .value_name("FILE")
        .default_value("terraform/metadata")
}

fn terraform_default_metadata_arg() -> Arg {
    Arg::new("terraform-default-metadata")
        .long("terraform-default-metadata")
        .env("TERRAFORM_DEFAULT_METADATA_FILE")
        .help("Metadata file used when the primary one does not exist")
        .value_name("FILE")
}

pub fn build_cli() -> Command {
    Command::new("stackmerge")
        .about("Merge stack and config directories and inject metadata for Ansible runs")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("merge")
                .about("Merge the stack, config and extra directories into one output tree")
                .visible_alias("merge-stack-and-config")
                .arg(
                    Arg::new("stack-root")
                        .long("stack-root")
                        .env("STACK_ROOT_PATH")
                        .help("Root of the stack checkout")
                        .value_name("DIR")
                        .default_value("stack"),
                )
                .arg(
                    Arg::new("stack-path")
                        .long("stack-path")
                        .env("STACK_PATH")
                        .help("Sub-directory of the stack root to merge")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("config-root")
                        .long("config-root")
                        .env("CONFIG_ROOT_PATH")
                        .help("Root of the config checkout")
                        .value_name("DIR")
                        .default_value("config"),
                )
                .arg(
                    Arg::new("config-path")
                        .long("config-path")
                        .env("CONFIG_PATH")
                        .help("Sub-directory of the config root to merge")
                        .value_name("PATH"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .env("MERGE_OUTPUT_PATH")
                        .help("Directory receiving the merged tree (emptied first)")
                        .value_name("DIR")
                        .default_value("merged-stack"),
                )
                .arg(
                    Arg::new("extra-paths")
                        .long("extra-paths")
                        .env("EXTRA_PATH")
                        .help("Extra override directories as a JSON array of strings")
                        .value_name("JSON"),
                )
                .arg(extra_vars_arg())
                .arg(terraform_metadata_arg())
                .arg(terraform_default_metadata_arg())
                .arg(verbose_arg()),
        )
        .subcommand(
            Command::new("extract-terraform-outputs")
                .about("Write Terraform outputs as Ansible group_vars and a shell env file")
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .env("OUTPUT_VAR_PATH")
                        .help("Directory receiving group_vars/all and env")
                        .value_name("DIR")
                        .default_value("."),
                )
                .arg(extra_vars_arg())
                .arg(terraform_metadata_arg())
                .arg(terraform_default_metadata_arg())
                .arg(verbose_arg()),
        )
}

#[cfg(test)]
mod tests {
    use super::build_cli;

    #[test]
    fn test_build_cli_subcommands() {
        let cmd = build_cli();
        let subcommands: Vec<_> = cmd.get_subcommands().map(|s| s.get_name()).collect();
        assert!(subcommands.contains(&"merge"));
        assert!(subcommands.contains(&"extract-terraform-outputs"));
    }

    #[test]
    fn test_cli_debug_assert() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_merge_flags_parse() {
        let matches = build_cli()
            .try_get_matches_from([
                "stackmerge",
                "merge",
                "--stack-root",
                "s",
                "--output",
                "out",
                "-vv",
            ])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "merge");
        assert_eq!(sub.get_one::<String>("stack-root").unwrap(), "s");
        assert_eq!(sub.get_one::<String>("output").unwrap(), "out");
        assert_eq!(sub.get_count("verbose"), 2);
    }
}
