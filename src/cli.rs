//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (serve, invoke, check, health), and their associated
//! argument structs. Every forwarding setting has an environment variable
//! equivalent, which is how serverless-style deployments supply them.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{DEFAULT_API_URL, DEFAULT_FORM_NAME, DEFAULT_TABLE_NAME};

#[derive(Parser)]
#[command(
    name = "formrelay",
    version,
    about = "Forwards form-submission webhooks to an Airtable table",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        formrelay check                      Verify AIRTABLE_* settings\n  \
        formrelay serve                      Listen for submissions on :3000\n  \
        formrelay invoke event.json          Run one runtime event locally"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server
    Serve(Box<ServeArgs>),

    /// Handle a single event read from a file or stdin
    Invoke(Box<InvokeArgs>),

    /// Check the forwarding configuration without starting
    Check(CheckArgs),

    /// Check health of a running instance
    Health(HealthArgs),
}

/// Settings of the record API and the tracked form.
#[derive(Args, Clone, Debug)]
pub struct ForwarderArgs {
    /// Airtable API key / personal access token
    #[arg(
        long,
        env = "AIRTABLE_API_KEY",
        hide_env_values = true,
        help_heading = "Airtable"
    )]
    pub api_key: Option<String>,

    /// Airtable base identifier
    #[arg(long, env = "AIRTABLE_BASE_ID", help_heading = "Airtable")]
    pub base_id: Option<String>,

    /// Airtable table name
    #[arg(
        long,
        env = "AIRTABLE_TABLE_NAME",
        default_value = DEFAULT_TABLE_NAME,
        help_heading = "Airtable"
    )]
    pub table: String,

    /// Airtable API base URL
    #[arg(
        long,
        env = "AIRTABLE_API_URL",
        default_value = DEFAULT_API_URL,
        help_heading = "Airtable"
    )]
    pub api_url: String,

    /// Name of the form whose submissions are forwarded
    #[arg(long, env = "TARGET_FORM_NAME", default_value = DEFAULT_FORM_NAME)]
    pub form_name: String,
}

/// Log output options shared by every long-running or forwarding command.
#[derive(Args, Clone, Debug)]
pub struct LogArgs {
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        formrelay serve                          Listen on 0.0.0.0:3000\n  \
        formrelay serve -p 8080 --pretty         Local dev mode\n  \
        formrelay serve --form-name join         Track a different form")]
pub struct ServeArgs {
    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,

    #[command(flatten)]
    pub forwarder: ForwarderArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        formrelay invoke event.json              Runtime event {\"body\": \"...\"}\n  \
        formrelay invoke --raw submission.json   Notification body only\n  \
        formrelay invoke --dry-run < event.json  Show the record, send nothing")]
pub struct InvokeArgs {
    /// Event file; reads stdin when omitted or `-`
    pub input: Option<PathBuf>,

    /// Treat the input as the notification body instead of a runtime event
    #[arg(long)]
    pub raw: bool,

    /// Print the record request instead of sending it
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub forwarder: ForwarderArgs,

    #[command(flatten)]
    pub log: LogArgs,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,

    #[command(flatten)]
    pub forwarder: ForwarderArgs,
}

#[derive(Args)]
pub struct HealthArgs {
    /// URL of the running instance
    #[arg(default_value = "http://localhost:3000")]
    pub url: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn invoke_defaults() {
        let cli = Cli::try_parse_from(["formrelay", "invoke", "--dry-run", "event.json"]).unwrap();
        let Some(Commands::Invoke(args)) = cli.command else {
            panic!("expected invoke");
        };
        assert!(args.dry_run);
        assert!(!args.raw);
        assert_eq!(args.input, Some(PathBuf::from("event.json")));
        assert_eq!(args.forwarder.form_name, "apply");
    }

    #[test]
    fn forwarder_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "formrelay",
            "check",
            "--base-id",
            "appB",
            "--api-key",
            "patK",
            "--table",
            "Leads",
        ])
        .unwrap();
        let Some(Commands::Check(args)) = cli.command else {
            panic!("expected check");
        };
        assert_eq!(args.forwarder.base_id.as_deref(), Some("appB"));
        assert_eq!(args.forwarder.table, "Leads");
    }
}
