//! `-v` / `NOVAMEET_LOG_LEVEL`: repeat the flag or name a level.

use clap::{builder::ValueParser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Levels in verbosity order. Index 0 is the quiet default.
const LEVELS: [(&str, Level); 5] = [
    ("error", Level::ERROR),
    ("warn", Level::WARN),
    ("info", Level::INFO),
    ("debug", Level::DEBUG),
    ("trace", Level::TRACE),
];

/// Accepts a count up to 5 or one of the level names, case-insensitively.
#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(|value: &str| -> Result<u8, String> {
        let value = value.trim();
        if let Ok(count) = value.parse::<u8>() {
            return if count <= 5 {
                Ok(count)
            } else {
                Err(format!("log level {count} is out of range 0-5"))
            };
        }

        LEVELS
            .iter()
            .position(|(name, _)| name.eq_ignore_ascii_case(value))
            .and_then(|index| u8::try_from(index).ok())
            .ok_or_else(|| format!("unknown log level '{value}'"))
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .env("NOVAMEET_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

/// Tracing level for the parsed verbosity. `None` leaves the filter default.
#[must_use]
pub fn level(matches: &ArgMatches) -> Option<Level> {
    match matches.get_one::<u8>(ARG_VERBOSITY).copied().unwrap_or_default() {
        0 => None,
        count => LEVELS
            .get(usize::from(count))
            .or(LEVELS.last())
            .map(|(_, level)| *level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_for(args: &[&str]) -> Option<Level> {
        temp_env::with_var("NOVAMEET_LOG_LEVEL", None::<&str>, || {
            let matches = with_args(Command::new("novameet")).get_matches_from(args);
            level(&matches)
        })
    }

    #[test]
    fn repeated_flag_raises_level() {
        assert_eq!(level_for(&["novameet"]), None);
        assert_eq!(level_for(&["novameet", "-v"]), Some(Level::WARN));
        assert_eq!(level_for(&["novameet", "-vvv"]), Some(Level::DEBUG));
        assert_eq!(level_for(&["novameet", "-vvvvvvv"]), Some(Level::TRACE));
    }

    #[test]
    fn unknown_level_name_is_rejected() {
        temp_env::with_var("NOVAMEET_LOG_LEVEL", Some("loud"), || {
            let result = with_args(Command::new("novameet")).try_get_matches_from(["novameet"]);
            assert!(result.is_err());
        });
    }
}
