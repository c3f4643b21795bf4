//! Maps validated CLI matches to an [`Action`].

use anyhow::{anyhow, Context, Result};
use clap::ArgMatches;
use secrecy::SecretString;

use crate::cli::actions::{session, verify, Action};
use crate::cli::commands::{api, auth};
use crate::verification::VerificationLink;

fn required(matches: &ArgMatches, name: &str) -> Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .with_context(|| format!("missing required argument: --{name}"))
}

/// # Errors
/// Returns an error if required arguments are missing or the verification
/// link cannot be parsed.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let config = api::config(matches);

    let (name, sub_m) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no command given"))?;

    match name {
        auth::CMD_LOGIN => Ok(Action::Login(session::LoginArgs {
            config,
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
        })),
        auth::CMD_LOGOUT => Ok(Action::Logout(session::Args { config })),
        auth::CMD_WHOAMI => Ok(Action::Whoami(session::Args { config })),
        auth::CMD_REGISTER => Ok(Action::Register(session::RegisterArgs {
            config,
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
            first_name: required(sub_m, "first-name")?,
            last_name: required(sub_m, "last-name")?,
        })),
        auth::CMD_VERIFY_EMAIL => {
            let mut link = match sub_m.get_one::<String>("link") {
                Some(raw) => VerificationLink::from_url(raw).context("invalid --link")?,
                None => VerificationLink {
                    token: sub_m.get_one::<String>("token").cloned(),
                    email: None,
                },
            };
            if let Some(email) = sub_m.get_one::<String>("email") {
                link.email = Some(email.clone());
            }
            Ok(Action::VerifyEmail(verify::Args { config, link }))
        }
        auth::CMD_RESEND_VERIFICATION => Ok(Action::ResendVerification(verify::ResendArgs {
            config,
            email: required(sub_m, "email")?,
        })),
        other => Err(anyhow!("unknown command: {other}")),
    }
}
