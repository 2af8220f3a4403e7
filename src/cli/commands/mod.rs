use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};
use crate::app_lib::config::DEFAULT_SESSION_STORAGE_KEY;

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

fn global_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("Console API base URL, example: https://risk.tld/api")
                .env("RISKGUARD_API_URL")
                .global(true),
        )
        .arg(
            Arg::new("session-file")
                .long("session-file")
                .help("File holding the session slot (default: ./<storage-key>.json)")
                .env("RISKGUARD_SESSION_FILE")
                .global(true),
        )
        .arg(
            Arg::new("storage-key")
                .long("storage-key")
                .help("Name of the session slot")
                .default_value(DEFAULT_SESSION_STORAGE_KEY)
                .env("RISKGUARD_STORAGE_KEY")
                .global(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("RISKGUARD_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let command = Command::new("riskguard")
        .about("Session and role checks for the risk console")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("decode")
                .about("Decode a session token without contacting the server")
                .arg(Arg::new("token").help("Raw token").required(true)),
        )
        .subcommand(
            Command::new("signin")
                .about("Sign in and store the session")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Account email")
                        .env("RISKGUARD_EMAIL")
                        .required(true),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Account password")
                        .env("RISKGUARD_PASSWORD")
                        .hide_env_values(true)
                        .required(true),
                )
                .arg(
                    Arg::new("human-key")
                        .long("human-key")
                        .help("Human-verification response, required once the failure threshold is reached"),
                ),
        )
        .subcommand(Command::new("status").about("Show the stored session"))
        .subcommand(
            Command::new("check-role")
                .about("Resolve a role for the stored session, asking the server if needed")
                .arg(Arg::new("role").help("Role name, with or without ROLE_").required(true)),
        )
        .subcommand(Command::new("signout").about("Remove the stored session"));

    global_args(command)
}
