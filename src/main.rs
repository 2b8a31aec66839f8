use clap::{Parser, Subcommand};
use mongo_bootstrap::config::{Config, ConfigLoader, LogFormat, LoggingConfig, Secret};
use mongo_bootstrap::{
    BootstrapError, BootstrapResult, Bootstrapper, MongoAdminClient, ProvisioningPlan,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit status of `verify` when the server is not provisioned.
const EXIT_NOT_PROVISIONED: u8 = 1;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Provision a MongoDB application database and its readWrite user.",
    long_about = "Creates the target database by writing a keepalive marker, then creates an application user whose only grant is readWrite on that database. Meant to run once at container start; a second run fails because the user already exists."
)]
struct Args {
    /// Configuration file (defaults to the standard resolution order).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// MongoDB connection string of the administrative endpoint.
    #[arg(long, global = true)]
    uri: Option<String>,

    /// Target database name.
    #[arg(long, global = true)]
    database: Option<String>,

    /// Application username.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Application password.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Print the run or verify report to stdout as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Perform the bootstrap (default).
    Run,
    /// Inspect a previously bootstrapped server without writing.
    Verify,
    /// Print the effective configuration as TOML with secrets redacted.
    ShowConfig,
}

impl Args {
    /// Command-line values win over file and environment values.
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(uri) = &self.uri {
            config.server.uri = uri.clone();
        }
        if let Some(database) = &self.database {
            config.target.database_name = database.clone();
        }
        if let Some(username) = &self.username {
            config.app_user.username = username.clone();
        }
        if let Some(password) = &self.password {
            config.app_user.password = Secret::from(password.as_str());
        }
    }
}

fn load_config(args: &Args) -> BootstrapResult<ConfigLoader> {
    let mut loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    args.apply_overrides(loader.config_mut());
    Ok(loader)
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to serialize report"),
    }
}

async fn execute(args: &Args, loader: &ConfigLoader) -> BootstrapResult<ExitCode> {
    let config = loader.config();
    let command = args.command.unwrap_or(Command::Run);

    if command == Command::ShowConfig {
        print!("{}", loader.to_redacted_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        config_path = ?loader.config_path,
        uri = %config.server.redacted_uri(),
        database = %config.target.database_name,
        username = %config.app_user.username,
        "connecting to administrative endpoint"
    );
    let client = MongoAdminClient::connect(&config.server).await?;
    let bootstrapper = Bootstrapper::new(client, ProvisioningPlan::from_config(config))
        .with_preflight_user_check(config.bootstrap.preflight_user_check);

    match command {
        Command::Verify => {
            let report = bootstrapper.verify().await?;
            if args.json {
                print_json(&report);
            }
            if report.is_provisioned() {
                Ok(ExitCode::SUCCESS)
            } else {
                for problem in report.problems() {
                    error!(%problem, "not provisioned");
                }
                Ok(ExitCode::from(EXIT_NOT_PROVISIONED))
            }
        }
        _ => {
            let report = bootstrapper.run().await?;
            info!(
                database = %report.database_name,
                username = %report.username,
                marker_id = %report.marker_id,
                elapsed_ms = (report.finished_at - report.started_at).num_milliseconds(),
                "bootstrap complete"
            );
            if args.json {
                print_json(&report);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

// --- Main Application Entry Point ---
#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let loader = match load_config(&args) {
        Ok(loader) => loader,
        Err(err) => {
            // No subscriber yet: logging settings come from this very config.
            eprintln!("mongo_bootstrap: {err}");
            return err.exit_code();
        }
    };
    init_tracing(&loader.config().logging);

    match execute(&args, &loader).await {
        Ok(code) => code,
        Err(err) => {
            report_failure(&err);
            err.exit_code()
        }
    }
}

fn report_failure(err: &BootstrapError) {
    error!(class = err.class(), exit_status = err.exit_status(), "bootstrap failed: {err}");
}
