use std::path::PathBuf;
use std::time::Duration;

use clap::{CommandFactory, FromArgMatches};
use sample_uploader::cli::{Cli, CliError, OutputFormat};
use sample_uploader::config::{ConfigError, PacingMode};

const REQUIRED: [&str; 4] = ["--host", "https://a1000.example.com", "--token", "t"];

/// Parse without `RL_*` fallbacks so the caller's environment cannot leak in
fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
    let argv = std::iter::once("sample-uploader")
        .chain(REQUIRED)
        .chain(args.iter().copied());
    let matches = Cli::command()
        .mut_args(|arg| arg.env(None::<&str>))
        .try_get_matches_from(argv)?;
    Cli::from_arg_matches(&matches)
}

fn parse(args: &[&str]) -> Cli {
    try_parse(args).unwrap()
}

#[test]
fn defaults_match_documented_values() {
    let cli = parse(&["./samples"]);
    let config = cli.to_run_config().unwrap();

    assert_eq!(config.path, PathBuf::from("./samples"));
    assert!(config.verify_tls);
    assert!(!config.recursive);
    assert_eq!(config.sleep, Duration::from_secs(2));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.retry_delay_base, Duration::from_secs(5));
    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.pacing_mode, PacingMode::FromStart);
    assert_eq!(config.concurrency, 1);
    assert_eq!(cli.output_format, OutputFormat::Human);
}

#[test]
fn positional_path_wins_over_flag() {
    let cli = parse(&["positional", "--path", "flag"]);
    assert_eq!(cli.to_run_config().unwrap().path, PathBuf::from("positional"));

    let cli = parse(&["--path", "flag"]);
    assert_eq!(cli.to_run_config().unwrap().path, PathBuf::from("flag"));
}

#[test]
fn missing_path_is_a_config_error() {
    let cli = parse(&[]);
    assert!(matches!(
        cli.to_run_config(),
        Err(CliError::Config(ConfigError::MissingPath))
    ));
}

#[test]
fn tls_flags_last_one_wins() {
    let cli = parse(&["p", "--no-verify-ssl"]);
    assert!(!cli.to_run_config().unwrap().verify_tls);

    let cli = parse(&["p", "--no-verify-ssl", "--verify-ssl"]);
    assert!(cli.to_run_config().unwrap().verify_tls);
}

#[test]
fn recursion_flags() {
    let cli = parse(&["p", "--recursive"]);
    assert!(cli.to_run_config().unwrap().recursive);

    let cli = parse(&["p", "--recursive", "--no-recursive"]);
    assert!(!cli.to_run_config().unwrap().recursive);
}

#[test]
fn tuning_flags() {
    let cli = parse(&[
        "p",
        "--sleep",
        "0.5",
        "--retries",
        "1",
        "--retry-delay",
        "3",
        "--timeout",
        "60",
        "--pace-from",
        "completion",
        "--exclude",
        "*.txt",
        "--exclude",
        "*.log",
        "--output-format",
        "json",
    ]);
    let config = cli.to_run_config().unwrap();

    assert_eq!(config.sleep, Duration::from_millis(500));
    assert_eq!(config.max_attempts(), 2);
    assert_eq!(config.retry_delay_base, Duration::from_secs(3));
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.pacing_mode, PacingMode::FromCompletion);
    assert_eq!(config.exclude_patterns, vec!["*.txt", "*.log"]);
    assert_eq!(cli.output_format, OutputFormat::Json);
}

#[test]
fn invalid_values_are_rejected_by_the_parser() {
    for bad in [
        vec!["p", "--sleep", "-1"],
        vec!["p", "--timeout", "0"],
        vec!["p", "--concurrency", "9"],
        vec!["p", "--pace-from", "sometime"],
        vec!["p", "--output-format", "xml"],
        vec!["p", "--sleep", "1e20"],
        vec!["p", "--retry-delay", "1e20"],
    ] {
        assert!(try_parse(&bad).is_err(), "{bad:?}");
    }
}

#[test]
fn completion_pacing_with_concurrency_is_rejected() {
    let cli = parse(&["p", "--pace-from", "completion", "--concurrency", "2"]);
    assert!(matches!(
        cli.to_run_config(),
        Err(CliError::Config(ConfigError::InvalidValue(_)))
    ));
}

#[test]
fn invalid_exclude_pattern_is_rejected() {
    let cli = parse(&["p", "--exclude", "[oops"]);
    assert!(matches!(
        cli.to_run_config(),
        Err(CliError::Config(ConfigError::InvalidPattern { .. }))
    ));
}
