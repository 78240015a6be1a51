//! `taskbell` command-line entry point.
//!
//! # Responsibility
//! - Expose the reminder pass as an externally triggered, authorized command.
//! - Print machine-readable JSON on stdout; diagnostics go to the log.
//!
//! # Exit codes
//! - `0`: command completed (a pass may still embed per-candidate errors).
//! - `1`: setup failure (config, logging, database).
//! - `2`: trigger authorization failure. The database is not opened.

use clap::{value_parser, Arg, ArgMatches, Command};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::process::ExitCode;
use taskbell_core::db::migrations::latest_version;
use taskbell_core::db::{open_db, DbError};
use taskbell_core::{
    hash_token, init_logging, run_triggered_pass, AppConfig, ConfigError, NotificationRepository,
    PassSummary, RepoError, SqliteNotificationRepository, TriggerError, TriggerGuard,
};
use uuid::Uuid;

const ENV_TRIGGER_TOKEN: &str = "TASKBELL_TRIGGER_TOKEN";
const DEFAULT_CONFIG_PATH: &str = "taskbell.toml";
const EXIT_SETUP_FAILURE: u8 = 1;
const EXIT_UNAUTHORIZED: u8 = 2;

#[derive(Debug)]
enum CliError {
    Config(ConfigError),
    Logging(String),
    Db(DbError),
    Repo(RepoError),
    Trigger(TriggerError),
    Output(serde_json::Error),
    Usage(String),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(message) => write!(f, "logging setup failed: {message}"),
            Self::Db(err) => write!(f, "database error: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Trigger(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to render output: {err}"),
            Self::Usage(message) => write!(f, "{message}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Trigger(err) => Some(err),
            Self::Output(err) => Some(err),
            Self::Logging(_) | Self::Usage(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CliError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TriggerError> for CliError {
    fn from(value: TriggerError) -> Self {
        Self::Trigger(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Output(value)
    }
}

fn cli() -> Command {
    let config_arg = Arg::new("config")
        .long("config")
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help("Path to taskbell.toml (defaults apply when the file is missing)");

    Command::new("taskbell")
        .about("Due-date reminder engine")
        .version(taskbell_core::core_version())
        .subcommand_required(true)
        .subcommand(
            Command::new("run-pass")
                .about("Run one reminder pass and print its JSON summary")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("token")
                        .long("token")
                        .value_name("SECRET")
                        .help("Trigger secret; falls back to TASKBELL_TRIGGER_TOKEN"),
                ),
        )
        .subcommand(
            Command::new("notifications")
                .about("List stored notifications for one user as JSON")
                .arg(config_arg.clone())
                .arg(
                    Arg::new("user")
                        .long("user")
                        .value_name("UUID")
                        .required(true),
                )
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_name("N")
                        .value_parser(value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Open the database and apply pending migrations")
                .arg(config_arg),
        )
        .subcommand(
            Command::new("hash-token")
                .about("Print the hex SHA-256 digest to put in [trigger] token_sha256")
                .arg(Arg::new("secret").value_name("SECRET").required(true)),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match dispatch(&matches) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(EXIT_SETUP_FAILURE)
        }
    }
}

fn dispatch(matches: &ArgMatches) -> Result<ExitCode, CliError> {
    match matches.subcommand() {
        Some(("run-pass", args)) => run_pass(args),
        Some(("notifications", args)) => list_notifications(args),
        Some(("migrate", args)) => migrate(args),
        Some(("hash-token", args)) => {
            let secret = required_str(args, "secret")?;
            println!("{}", hash_token(secret));
            Ok(ExitCode::SUCCESS)
        }
        _ => Err(CliError::Usage("unknown subcommand".to_string())),
    }
}

fn run_pass(args: &ArgMatches) -> Result<ExitCode, CliError> {
    let config = bootstrap(args)?;
    let token = args
        .get_one::<String>("token")
        .cloned()
        .or_else(|| std::env::var(ENV_TRIGGER_TOKEN).ok());

    match execute_pass(&config, token.as_deref()) {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(CliError::Trigger(err)) => {
            eprintln!("error: {err}");
            Ok(ExitCode::from(EXIT_UNAUTHORIZED))
        }
        Err(err) => Err(err),
    }
}

/// Authorizes `token`, then opens the database and runs one pass.
fn execute_pass(config: &AppConfig, token: Option<&str>) -> Result<PassSummary, CliError> {
    let guard = TriggerGuard::from_hex_digest(config.trigger.token_sha256.as_deref())
        .map_err(|err| ConfigError::Invalid(err.to_string()))?;
    let clock = config.clock()?;
    info!(
        "event=trigger_received module=cli status=start utc_offset={} trigger_configured={}",
        clock.offset(),
        guard.is_configured()
    );
    run_triggered_pass(&guard, token, &clock, config.engine_settings(), || {
        open_db(&config.storage.database_path).map_err(CliError::from)
    })
}

fn list_notifications(args: &ArgMatches) -> Result<ExitCode, CliError> {
    let raw_user = required_str(args, "user")?;
    let user_id = Uuid::parse_str(raw_user)
        .map_err(|_| CliError::Usage(format!("invalid user id `{raw_user}`")))?;
    let config = bootstrap(args)?;

    let conn = open_db(&config.storage.database_path)?;
    let notifications = SqliteNotificationRepository::new(&conn)
        .list_for_user(user_id, args.get_one::<u32>("limit").copied())?;
    println!("{}", serde_json::to_string_pretty(&notifications)?);
    Ok(ExitCode::SUCCESS)
}

fn migrate(args: &ArgMatches) -> Result<ExitCode, CliError> {
    let config = bootstrap(args)?;
    open_db(&config.storage.database_path)?;
    println!(
        "{}",
        serde_json::json!({
            "database_path": config.storage.database_path.display().to_string(),
            "schema_version": latest_version(),
        })
    );
    Ok(ExitCode::SUCCESS)
}

/// Loads configuration and starts logging.
fn bootstrap(args: &ArgMatches) -> Result<AppConfig, CliError> {
    let config_path = args
        .get_one::<PathBuf>("config")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = AppConfig::load(Some(&config_path))?;
    init_logging(&config.logging.level, config.logging.dir.as_deref())
        .map_err(CliError::Logging)?;
    info!(
        "event=cli_bootstrap module=cli status=ok config={} database={}",
        config_path.display(),
        config.storage.database_path.display()
    );
    Ok(config)
}

fn required_str<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str, CliError> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| CliError::Usage(format!("missing argument `{name}`")))
}

#[cfg(test)]
mod tests {
    use super::{cli, execute_pass, CliError};
    use taskbell_core::{hash_token, AppConfig, ConfigError, TriggerError};

    fn config_in(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.storage.database_path = dir.join("taskbell.db");
        config.trigger.token_sha256 = Some(hash_token("right"));
        config
    }

    #[test]
    fn rejected_run_pass_leaves_no_database_behind() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        assert!(matches!(
            execute_pass(&config, Some("wrong")),
            Err(CliError::Trigger(TriggerError::Unauthorized))
        ));
        assert!(matches!(
            execute_pass(&config, None),
            Err(CliError::Trigger(TriggerError::MissingToken))
        ));
        assert!(!config.storage.database_path.exists());

        let summary = execute_pass(&config, Some("right")).unwrap();
        assert_eq!(summary.candidates, 0);
        assert!(config.storage.database_path.exists());
    }

    #[test]
    fn malformed_digest_is_a_setup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(dir.path());
        config.trigger.token_sha256 = Some("not-hex".to_string());

        assert!(matches!(
            execute_pass(&config, Some("right")),
            Err(CliError::Config(ConfigError::Invalid(_)))
        ));
        assert!(!config.storage.database_path.exists());
    }

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn run_pass_accepts_config_and_token() {
        let matches = cli()
            .try_get_matches_from(["taskbell", "run-pass", "--config", "/tmp/t.toml", "--token", "s"])
            .unwrap();
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "run-pass");
        assert_eq!(args.get_one::<String>("token").map(String::as_str), Some("s"));
    }

    #[test]
    fn notifications_requires_a_user() {
        assert!(cli()
            .try_get_matches_from(["taskbell", "notifications"])
            .is_err());
    }
}
