//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use hod_sso::RoundTripPolicy;
use hod_sso_telemetry::{
    DEFAULT_LOG_LEVEL, LogFormat, LoggingConfig, TelemetryError, command_span, init_logging,
    log_format_from_config,
};
use serde_json::{Value, json};
use tracing::Instrument;
use url::Url;

use crate::client::{AppContext, CliError, CliResult, build_transport, load_config_file};
use crate::commands::authenticate::handle_authenticate;
use crate::commands::logout::handle_logout;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parses CLI arguments, executes the requested command, and returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match execute(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => json!({}),
    };

    let format = cli
        .log_format
        .or_else(|| log_format_from_config(Some(&config)))
        .unwrap_or_else(LogFormat::infer);
    init_logging(&LoggingConfig {
        level: &cli.log_level,
        format,
        build_sha: option_env!("HOD_SSO_BUILD_SHA").unwrap_or("dev"),
    })
    .map_err(CliError::failure)?;

    let span = command_span(cli.command.label());
    dispatch(cli, config).instrument(span).await
}

async fn dispatch(cli: Cli, config: Value) -> CliResult<()> {
    let ctx = AppContext {
        transport: build_transport(cli.timeout)?,
        output: cli.output,
        config,
    };

    match cli.command {
        Command::Authenticate(args) => handle_authenticate(&ctx, args).await,
        Command::Logout(args) => handle_logout(&ctx, args).await,
    }
}

#[derive(Parser)]
#[command(
    name = "hod-sso",
    about = "Acquire and invalidate Haven OnDemand combined tokens"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "HOD_SSO_CONFIG",
        help = "Page configuration JSON; flags override its fields"
    )]
    config: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        env = "HOD_SSO_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for command results"
    )]
    output: OutputFormat,
    #[arg(long, global = true, env = "HOD_SSO_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
    #[arg(
        long,
        global = true,
        env = "HOD_SSO_LOG_FORMAT",
        value_parser = parse_log_format,
        help = "Log format (json or pretty); defaults to the config file, then the build profile"
    )]
    log_format: Option<LogFormat>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the combined-token flow for a page.
    Authenticate(AuthenticateArgs),
    /// Invalidate a combined token.
    Logout(LogoutArgs),
}

impl Command {
    const fn label(&self) -> &'static str {
        match self {
            Self::Authenticate(_) => "authenticate",
            Self::Logout(_) => "logout",
        }
    }
}

#[derive(Args)]
pub(crate) struct AuthenticateArgs {
    #[arg(
        long,
        env = "HOD_SSO_PAGE_URL",
        value_parser = parse_url,
        help = "URL of the page the flow runs on, including any SSO return parameters"
    )]
    pub(crate) page_url: Url,
    #[arg(long, env = "HOD_SSO_APPLICATION_ROOT")]
    pub(crate) application_root: Option<String>,
    #[arg(long, env = "HOD_SSO_DOMAIN")]
    pub(crate) hod_domain: Option<String>,
    #[arg(long, env = "HOD_SSO_PAGE")]
    pub(crate) sso_page: Option<String>,
    #[arg(long, value_enum)]
    pub(crate) round_trip_policy: Option<RoundTripPolicyArg>,
}

#[derive(Args, Default)]
pub(crate) struct LogoutArgs {
    #[arg(long = "token", env = "HOD_SSO_COMBINED_TOKEN", hide_env_values = true)]
    pub(crate) combined_token: Option<String>,
    #[arg(long, env = "HOD_SSO_DOMAIN")]
    pub(crate) hod_domain: Option<String>,
    #[arg(long, env = "HOD_SSO_ENDPOINT")]
    pub(crate) hod_endpoint: Option<String>,
    #[arg(long, env = "HOD_SSO_LOGOUT_URL")]
    pub(crate) logout_url: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub(crate) enum RoundTripPolicyArg {
    NoUserToken,
    CrossDomainCookies,
}

impl From<RoundTripPolicyArg> for RoundTripPolicy {
    fn from(value: RoundTripPolicyArg) -> Self {
        match value {
            RoundTripPolicyArg::NoUserToken => Self::NoUserToken,
            RoundTripPolicyArg::CrossDomainCookies => Self::CrossDomainCookies,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_url(value: &str) -> Result<Url, String> {
    Url::parse(value).map_err(|err| format!("invalid URL: {err}"))
}

fn parse_log_format(value: &str) -> Result<LogFormat, String> {
    value
        .parse()
        .map_err(|err: TelemetryError| format!("{err}: {value}"))
}
