use anyhow::{bail, Context, Result};
use tracing::warn;

use crate::cli::actions::{build_app, report};
use crate::config::AppConfig;
use crate::verification::{VerificationLink, VerificationStatus};

#[derive(Debug)]
pub struct Args {
    pub config: AppConfig,
    pub link: VerificationLink,
}

#[derive(Debug)]
pub struct ResendArgs {
    pub config: AppConfig,
    pub email: String,
}

/// Runs the verification flow. On success waits for the dashboard redirect;
/// on failure resends the link when an email is known.
///
/// # Errors
/// Returns an error if the email could not be verified.
pub async fn verify_email(args: Args) -> Result<()> {
    let app = build_app(args.config)?;
    let mut flow = app.verification_flow(args.link);

    match flow.run().await {
        VerificationStatus::Success => {
            println!("Email verified");
            flow.wait_for_redirect().await;
            report(&app);
            Ok(())
        }
        VerificationStatus::Pending | VerificationStatus::Error => {
            if flow.email().is_some() {
                if let Err(err) = flow.resend().await {
                    warn!("Failed to resend verification link: {err}");
                }
            }
            report(&app);
            bail!("Email verification failed")
        }
    }
}

/// # Errors
/// Returns an error if the email is invalid or the request fails.
pub async fn resend(args: ResendArgs) -> Result<()> {
    let email = args.email.trim();
    if !email.contains('@') {
        bail!("Email address looks invalid: {email}");
    }

    let app = build_app(args.config)?;
    let result = app.auth().resend_verification(email).await;
    report(&app);

    result.context("Failed to resend verification link")?;
    println!("If that email exists, a new link is on the way");
    Ok(())
}
