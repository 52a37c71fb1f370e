//! `vstore` command line tool

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use vstore::DEFAULT_VERSION_KEY;

mod commands;

fn cli() -> Command {
    let version_key = Arg::new("version-key")
        .long("version-key")
        .default_value(DEFAULT_VERSION_KEY)
        .help("Name of the reserved version field");

    Command::new("vstore")
        .version(vstore::VERSION)
        .about("Inspect, check and convert versioned data files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log pipeline stages to stderr"),
        )
        .subcommand(
            Command::new("inspect")
                .about("Show format, version tag and field count")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Data file"),
                )
                .arg(version_key.clone()),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a file against a JSON Schema document")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Data file"),
                )
                .arg(
                    Arg::new("schema")
                        .long("schema")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON Schema document (any supported format)"),
                )
                .arg(
                    Arg::new("current-version")
                        .long("current-version")
                        .value_parser(value_parser!(u32).range(1..))
                        .help("Require this version tag and validate the payload without it"),
                )
                .arg(version_key),
        )
        .subcommand(
            Command::new("convert")
                .about("Re-encode a file in another format, keeping its version tag")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Source file"),
                )
                .arg(
                    Arg::new("output")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Destination file; format follows its extension"),
                )
                .arg(
                    Arg::new("compact")
                        .long("compact")
                        .action(ArgAction::SetTrue)
                        .help("Smallest output the target format supports"),
                ),
        )
}

/// `--verbose` forces debug output; otherwise `RUST_LOG` wins over the warn default
fn env_filter(verbose: bool, from_env: Option<EnvFilter>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    from_env.unwrap_or_else(|| EnvFilter::new("warn"))
}

fn init_tracing(verbose: bool) {
    let from_env = EnvFilter::try_from_default_env().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(verbose, from_env))
        .init();
}

fn required<'a, T>(args: &'a ArgMatches, name: &str) -> Result<&'a T>
where
    T: Clone + Send + Sync + 'static,
{
    args.get_one::<T>(name)
        .with_context(|| format!("missing argument `{name}`"))
}

async fn run(matches: &ArgMatches) -> Result<String> {
    match matches.subcommand() {
        Some(("inspect", args)) => {
            let file = required::<PathBuf>(args, "file")?;
            let key = required::<String>(args, "version-key")?;
            commands::inspect(file, key).await
        }
        Some(("check", args)) => {
            let file = required::<PathBuf>(args, "file")?;
            let schema = required::<PathBuf>(args, "schema")?;
            let key = required::<String>(args, "version-key")?;
            let current = args.get_one::<u32>("current-version").copied();
            commands::check(file, schema, current, key).await
        }
        Some(("convert", args)) => {
            let input = required::<PathBuf>(args, "input")?;
            let output = required::<PathBuf>(args, "output")?;
            commands::convert(input, output, args.get_flag("compact")).await
        }
        _ => anyhow::bail!("unknown command"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"));

    match run(&matches).await {
        Ok(report) => {
            println!("{report}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn check_parses_current_version() {
        let matches = cli()
            .try_get_matches_from([
                "vstore",
                "check",
                "a.json",
                "--schema",
                "s.json",
                "--current-version",
                "3",
            ])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<u32>("current-version"), Some(&3));
        assert_eq!(
            args.get_one::<String>("version-key").map(String::as_str),
            Some(DEFAULT_VERSION_KEY)
        );
    }

    #[test]
    fn check_rejects_version_zero() {
        let result = cli().try_get_matches_from([
            "vstore",
            "check",
            "a.json",
            "--schema",
            "s.json",
            "--current-version",
            "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn rust_log_honoured_unless_verbose() {
        let from_env = || Some(EnvFilter::new("trace"));
        assert_eq!(
            env_filter(false, from_env()).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
        assert_eq!(
            env_filter(false, None).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            env_filter(true, from_env()).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }

    #[test]
    fn verbose_is_global() {
        let matches = cli()
            .try_get_matches_from(["vstore", "inspect", "a.json", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
    }
}
