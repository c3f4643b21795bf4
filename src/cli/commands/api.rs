use std::path::PathBuf;
use std::time::Duration;

use clap::{Arg, ArgMatches, Command};

use crate::config::{normalize_value, AppConfig, DEFAULT_API_BASE_URL, DEFAULT_STATE_DIR};

pub const ARG_API_URL: &str = "api-url";
pub const ARG_ORIGIN: &str = "origin";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_TIMEOUT: &str = "timeout";

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("API base URL, absolute or relative to --origin")
                .env("NOVAMEET_API_BASE_URL")
                .global(true)
                .default_value(DEFAULT_API_BASE_URL),
        )
        .arg(
            Arg::new(ARG_ORIGIN)
                .long("origin")
                .help("Origin a relative --api-url is resolved against")
                .env("NOVAMEET_ORIGIN")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long("state-dir")
                .help("Directory holding the persisted session")
                .env("NOVAMEET_STATE_DIR")
                .global(true)
                .default_value(DEFAULT_STATE_DIR)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT)
                .long("timeout")
                .help("Per-request timeout in seconds")
                .env("NOVAMEET_TIMEOUT_SECONDS")
                .global(true)
                .default_value("30")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Configuration from the global arguments. Blank values fall back to the
/// defaults.
#[must_use]
pub fn config(matches: &ArgMatches) -> AppConfig {
    let defaults = AppConfig::default();

    AppConfig {
        api_base_url: matches
            .get_one::<String>(ARG_API_URL)
            .and_then(|value| normalize_value(value))
            .unwrap_or(defaults.api_base_url),
        origin: matches
            .get_one::<String>(ARG_ORIGIN)
            .and_then(|value| normalize_value(value)),
        timeout: matches
            .get_one::<u64>(ARG_TIMEOUT)
            .copied()
            .map_or(defaults.timeout, Duration::from_secs),
        state_dir: matches
            .get_one::<PathBuf>(ARG_STATE_DIR)
            .cloned()
            .unwrap_or(defaults.state_dir),
    }
}
