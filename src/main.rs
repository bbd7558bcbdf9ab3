use stackmerge::config::{ExtractConfig, MergeConfig};
use stackmerge::process::SystemRunner;
use stackmerge::report::{format_error, Reporter};
use stackmerge::{cli, merge, metadata};

use anyhow::Result;
use colored::Colorize;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", format_error(&e).as_str().red());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Delay logger initialization until after parsing arguments
    let matches = cli::build_cli().get_matches();

    // Set log level based on the number of verbose flags
    let log_level = match matches.subcommand() {
        Some((_, sub_matches)) => match sub_matches.get_count("verbose") {
            0 => LevelFilter::Off,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        },
        _ => LevelFilter::Info,
    };

    // Custom log format
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(log_level)
        .init();

    let mut reporter = Reporter::new();

    match matches.subcommand() {
        Some(("merge", sub_matches)) => {
            let config = MergeConfig::from_matches(sub_matches)?;
            info!(
                "Merging stack {} and config {} into {}",
                config.stack_dir().display(),
                config.config_dir().display(),
                config.output.display()
            );
            let summary = merge::run(&config, &SystemRunner, &mut reporter)?;
            info!(
                "Merge completed: {} files, {} variables, tag {}",
                summary.copied.files,
                summary.variables,
                summary
                    .tag
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "none".to_string())
            );
        }
        Some(("extract-terraform-outputs", sub_matches)) => {
            let config = ExtractConfig::from_matches(sub_matches)?;
            let files = metadata::extract_terraform_outputs(&config, &mut reporter)?;
            info!(
                "Wrote {} and {}",
                files.group_vars.display(),
                files.env.display()
            );
        }
        _ => {
            eprintln!("Unknown command");
            std::process::exit(1);
        }
    }

    Ok(())
}
