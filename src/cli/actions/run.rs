use crate::cli::actions::{session, verify, Action};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => session::login(args).await,
        Action::Logout(args) => session::logout(args).await,
        Action::Whoami(args) => session::whoami(args).await,
        Action::Register(args) => session::register(args).await,
        Action::VerifyEmail(args) => verify::verify_email(args).await,
        Action::ResendVerification(args) => verify::resend(args).await,
    }
}
