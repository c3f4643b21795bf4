#![allow(clippy::unwrap_used)]

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::Result;
use novameet::cli::actions::{session, verify, Action};
use novameet::gateway::{ReqwestTransport, ScriptedTransport};
use novameet::navigation::{Navigation, RecordingNavigator, DASHBOARD_PATH};
use novameet::session::{FileStorage, MemoryStorage, UserUpdate};
use novameet::verification::VerificationLink;
use novameet::{App, AppConfig, User, VerificationStatus};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn user() -> User {
    serde_json::from_value(json!({
        "id": "42",
        "email": "ada@novameet.app",
        "first_name": "Ada",
        "last_name": "Lovelace",
        "email_verified": true,
        "roles": ["host"]
    }))
    .unwrap()
}

#[test]
fn session_survives_a_restart_with_file_storage() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = AppConfig {
        state_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let start = || {
        App::new(
            config.clone(),
            Arc::new(FileStorage::new(dir.path())),
            Arc::new(ScriptedTransport::new()),
            Arc::new(RecordingNavigator::new()),
        )
    };

    let first = start();
    first.credentials().login(user(), "tok".to_string())?;
    first.credentials().update_user(UserUpdate {
        first_name: Some("Augusta".to_string()),
        ..UserUpdate::default()
    })?;
    let before = first.credentials().snapshot();
    drop(first);

    let second = start();
    assert_eq!(second.credentials().snapshot(), before);
    assert_eq!(
        second.credentials().user().map(|u| u.first_name),
        Some("Augusta".to_string())
    );

    second.credentials().logout()?;
    let third = start();
    assert!(!third.credentials().is_authenticated());
    assert_eq!(third.credentials().token(), None);
    Ok(())
}

#[test]
fn update_while_anonymous_never_materializes_a_user() -> Result<()> {
    let app = App::new(
        AppConfig::default(),
        Arc::new(MemoryStorage::new()),
        Arc::new(ScriptedTransport::new()),
        Arc::new(RecordingNavigator::new()),
    );
    app.credentials().update_user(UserUpdate {
        email: Some("ghost@novameet.app".to_string()),
        ..UserUpdate::default()
    })?;
    assert_eq!(app.credentials().user(), None);
    assert!(!app.credentials().is_authenticated());
    Ok(())
}

#[tokio::test]
async fn verification_link_end_to_end() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/verify-email/"))
        .and(body_json(json!({"token": "abc"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"detail": "Email verified."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let navigator = RecordingNavigator::new();
    let app = App::new(
        AppConfig {
            api_base_url: format!("{}/api/v1", server.uri()),
            state_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        },
        Arc::new(FileStorage::new(dir.path())),
        Arc::new(ReqwestTransport::new("novameet-tests")?),
        Arc::new(navigator.clone()),
    );

    let link = VerificationLink::from_url("https://novameet.app/verify-email?token=abc")?;
    let mut flow = app.verification_flow(link);
    assert_eq!(flow.status(), VerificationStatus::Pending);
    assert_eq!(flow.run().await, VerificationStatus::Success);
    assert_eq!(flow.run().await, VerificationStatus::Success);

    assert!(flow.wait_for_redirect().await);
    assert_eq!(
        navigator.history(),
        vec![Navigation::Navigate(DASHBOARD_PATH.to_string())]
    );
    Ok(())
}

#[tokio::test]
async fn cli_login_then_whoami_then_logout() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {"id": 42, "email": "ada@novameet.app"},
            "token": "tok-42"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/auth/me/"))
        .and(header("Authorization", "Token tok-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "email": "ada@novameet.app",
            "first_name": "Ada"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout/"))
        .and(header("Authorization", "Token tok-42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let config = AppConfig {
        api_base_url: format!("{}/api/v1", server.uri()),
        state_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };

    Action::Login(session::LoginArgs {
        config: config.clone(),
        email: "ada@novameet.app".to_string(),
        password: SecretString::from("pw".to_string()),
    })
    .execute()
    .await?;
    assert!(dir.path().join("novameet-auth.json").exists());

    Action::Whoami(session::Args {
        config: config.clone(),
    })
    .execute()
    .await?;

    Action::Logout(session::Args {
        config: config.clone(),
    })
    .execute()
    .await?;
    assert!(!dir.path().join("novameet-auth.json").exists());

    let whoami = Action::Whoami(session::Args { config }).execute().await;
    assert!(whoami.is_err());
    Ok(())
}

#[tokio::test]
async fn cli_verify_without_token_fails_without_calls() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let result = Action::VerifyEmail(verify::Args {
        config: AppConfig {
            api_base_url: format!("{}/api/v1", server.uri()),
            state_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        },
        link: VerificationLink::default(),
    })
    .execute()
    .await;

    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn cli_relative_api_url_without_origin_fails_at_startup() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let result = Action::Login(session::LoginArgs {
        config: AppConfig {
            state_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        },
        email: "ada@novameet.app".to_string(),
        password: SecretString::from("pw".to_string()),
    })
    .execute()
    .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("relative --api-url requires --origin"));
    assert!(!dir.path().join("novameet-auth.json").exists());
    Ok(())
}
