use anyhow::{bail, Context, Result};
use secrecy::SecretString;
use tracing::debug;

use crate::cli::actions::{build_app, report};
use crate::config::AppConfig;

#[derive(Debug)]
pub struct Args {
    pub config: AppConfig,
}

#[derive(Debug)]
pub struct LoginArgs {
    pub config: AppConfig,
    pub email: String,
    pub password: SecretString,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub config: AppConfig,
    pub email: String,
    pub password: SecretString,
    pub first_name: String,
    pub last_name: String,
}

/// # Errors
/// Returns an error if the credentials are rejected or the session cannot be
/// persisted.
pub async fn login(args: LoginArgs) -> Result<()> {
    let app = build_app(args.config)?;
    let result = app.auth().login(&args.email, args.password).await;
    report(&app);

    let user = result.context("Login failed")?;
    println!("Signed in as {} <{}>", user.display_name(), user.email);
    Ok(())
}

/// # Errors
/// Returns an error if the persisted session cannot be removed.
pub async fn logout(args: Args) -> Result<()> {
    let app = build_app(args.config)?;
    if !app.credentials().is_authenticated() {
        debug!("no active session");
    }
    let result = app.auth().logout().await;
    report(&app);

    result.context("Logout failed")?;
    println!("Signed out");
    Ok(())
}

/// # Errors
/// Returns an error if there is no session or the profile cannot be fetched.
pub async fn whoami(args: Args) -> Result<()> {
    let app = build_app(args.config)?;
    if !app.credentials().is_authenticated() {
        bail!("Not signed in, run `novameet login` first");
    }

    let result = app.auth().fetch_profile().await;
    report(&app);

    let user = result.context("Failed to fetch profile")?;
    println!("{} <{}>", user.display_name(), user.email);
    println!("id: {}", user.id);
    println!(
        "email verified: {}, phone verified: {}",
        user.email_verified, user.phone_verified
    );
    if !user.roles.is_empty() {
        let roles: Vec<&str> = user.roles.iter().map(String::as_str).collect();
        println!("roles: {}", roles.join(", "));
    }
    Ok(())
}

/// # Errors
/// Returns an error if the server rejects the registration.
pub async fn register(args: RegisterArgs) -> Result<()> {
    let app = build_app(args.config)?;
    let result = app
        .auth()
        .register(&args.email, args.password, &args.first_name, &args.last_name)
        .await;
    report(&app);

    let response = result.context("Registration failed")?;
    println!("Registered {}", response.user.email);
    if let Some(detail) = response.detail {
        println!("{detail}");
    }
    Ok(())
}
