use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

pub fn globals(matches: &clap::ArgMatches) -> GlobalArgs {
    GlobalArgs::new(
        matches.get_one::<String>("api-url").cloned(),
        matches
            .get_one::<String>("storage-key")
            .cloned()
            .unwrap_or_default(),
        matches.get_one::<String>("session-file").map(PathBuf::from),
    )
}

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    // Closure to return a required argument of a subcommand
    let required = |sub_m: &clap::ArgMatches, name: &str| -> Result<String> {
        sub_m
            .get_one::<String>(name)
            .cloned()
            .with_context(|| format!("missing required argument: {name}"))
    };

    match matches.subcommand() {
        Some(("decode", sub_m)) => Ok(Action::Decode {
            token: SecretString::from(required(sub_m, "token")?),
        }),
        Some(("signin", sub_m)) => Ok(Action::SignIn {
            email: required(sub_m, "email")?,
            password: SecretString::from(required(sub_m, "password")?),
            human_key: sub_m.get_one::<String>("human-key").cloned(),
        }),
        Some(("status", _)) => Ok(Action::Status),
        Some(("check-role", sub_m)) => Ok(Action::CheckRole {
            role: required(sub_m, "role")?,
        }),
        Some(("signout", _)) => Ok(Action::SignOut),
        _ => anyhow::bail!("unknown subcommand"),
    }
}
