use crate::{
    app_lib::{AppConfig, HttpAuthApi},
    cli::{actions::Action, globals::GlobalArgs},
    features::auth::{
        navigation::LogNavigator, repository::FileRepository, token, AuthError, AuthService,
        Credentials, PrivilegeResolution, SessionDescriptor,
    },
};
use anyhow::{anyhow, Result};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use std::rc::Rc;
use tracing::info;

fn service(globals: &GlobalArgs) -> Result<AuthService> {
    let mut config = AppConfig::load();
    if let Some(api_url) = &globals.api_url {
        config = config.with_api_base_url(api_url.clone());
    }
    config.session_storage_key.clone_from(&globals.storage_key);

    let api = HttpAuthApi::new(&config)?;
    Ok(AuthService::new(
        Rc::new(FileRepository::new(&globals.session_file)),
        Rc::new(api),
        Rc::new(LogNavigator),
    ))
}

fn require_api_url(globals: &GlobalArgs) -> Result<()> {
    if globals.api_url.as_deref().is_some_and(|url| !url.trim().is_empty()) {
        Ok(())
    } else {
        Err(anyhow!("missing --api-url (or RISKGUARD_API_URL)"))
    }
}

/// Session summary safe to print: no token material.
pub fn summary(session: &SessionDescriptor) -> Value {
    let roles: Vec<&str> = session
        .roles
        .iter()
        .map(|role| role.authority.as_str())
        .collect();
    json!({
        "subject": session.subject,
        "roles": roles,
        "expiresAt": session.expires_at_epoch_ms,
        "expired": session.is_expired(),
    })
}

fn resolution_label(resolution: PrivilegeResolution) -> &'static str {
    match resolution {
        PrivilegeResolution::Pending => "pending",
        PrivilegeResolution::Granted => "granted",
        PrivilegeResolution::Denied => "denied",
    }
}

fn print(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Handle the session actions
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Decode { token } => {
            let session = token::decode(token.expose_secret())?;
            print(&summary(&session))?;
        }
        Action::SignIn {
            email,
            password,
            human_key,
        } => {
            require_api_url(globals)?;
            let service = service(globals)?;
            let gate = service.mount_gate().await;
            if human_key.is_some() && !service.on_challenge_response(&gate, human_key).await {
                info!("human verification was not confirmed");
            }

            let credentials = Credentials {
                email: email.trim().to_string(),
                password,
            };
            let session = service.signin(&gate, &credentials).await?;
            print(&summary(&session))?;
        }
        Action::Status => {
            let service = service(globals)?;
            let session = service.store().current();
            print(&json!({
                "authenticated": service.is_authenticated(),
                "authorized": service.is_authorized(),
                "session": session.as_ref().map(summary),
            }))?;
        }
        Action::CheckRole { role } => {
            require_api_url(globals)?;
            let service = service(globals)?;
            let outcome = service.authorize(&role).await;
            let resolution = PrivilegeResolution::from(outcome.clone());
            print(&json!({
                "role": role,
                "resolution": resolution_label(resolution),
                "signedOut": outcome == Err(AuthError::ForcedSignOut),
            }))?;
        }
        Action::SignOut => {
            let service = service(globals)?;
            service.signout()?;
            print(&json!({ "authenticated": false }))?;
        }
    }

    Ok(())
}
