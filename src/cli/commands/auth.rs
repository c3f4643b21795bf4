use clap::{Arg, ArgGroup, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";
pub const CMD_REGISTER: &str = "register";
pub const CMD_VERIFY_EMAIL: &str = "verify-email";
pub const CMD_RESEND_VERIFICATION: &str = "resend-verification";

fn email_arg() -> Arg {
    Arg::new("email")
        .long("email")
        .short('e')
        .help("Account email address")
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .help("Account password")
        .env("NOVAMEET_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in and persist the session")
                .arg(email_arg().required(true))
                .arg(password_arg()),
        )
        .subcommand(
            Command::new(CMD_LOGOUT).about("End the session and remove the persisted record"),
        )
        .subcommand(
            Command::new(CMD_WHOAMI).about("Show the signed-in user, refreshed from the server"),
        )
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account; a verification link is sent by email")
                .arg(email_arg().required(true))
                .arg(password_arg())
                .arg(
                    Arg::new("first-name")
                        .long("first-name")
                        .help("First name")
                        .required(true),
                )
                .arg(
                    Arg::new("last-name")
                        .long("last-name")
                        .help("Last name")
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_VERIFY_EMAIL)
                .about("Confirm an email address from a verification link")
                .arg(
                    Arg::new("link")
                        .long("link")
                        .help("Verification link as received in the email"),
                )
                .arg(
                    Arg::new("token")
                        .long("token")
                        .help("Verification token"),
                )
                .arg(email_arg().help("Email used to resend the link if verification fails"))
                .group(
                    ArgGroup::new("verification-source")
                        .args(["link", "token"])
                        .required(true),
                ),
        )
        .subcommand(
            Command::new(CMD_RESEND_VERIFICATION)
                .about("Send a new verification link")
                .arg(email_arg().required(true)),
        )
}
