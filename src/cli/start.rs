use anyhow::Result;

use crate::cli::{actions::Action, commands, dispatch, telemetry};

/// Parses the command line, installs logging and returns the action to run.
///
/// # Errors
/// Returns an error if logging cannot be installed or the arguments do not
/// map to an action.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();
    telemetry::init(commands::logging::level(&matches))?;
    dispatch::handler(&matches)
}
