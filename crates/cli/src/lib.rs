pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use leadcall_core::config::{AppConfig, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "leadcall",
    about = "Leadcall operator CLI",
    long_about = "Run automated sales-qualification calls and inspect configuration readiness.",
    after_help = "Examples:\n  leadcall run \"dental implant price downtown\"\n  leadcall doctor --json\n  leadcall config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the full pipeline: price search, call simulation, CRM record")]
    Run {
        #[arg(help = "Search query describing the vendor and service to price")]
        query: String,
        #[arg(long, help = "Emit the full report as JSON instead of a rendered transcript")]
        json: bool,
        #[arg(long, help = "Override the completion model for this run")]
        model: Option<String>,
        #[arg(long, help = "Override the negotiation language for this run")]
        language: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and credential readiness without any network calls")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { query, json, model, language } => {
            commands::run::run(commands::run::RunArgs { query, json, model, language }).await
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Initializes the global subscriber from the loaded config. Safe to call
/// more than once; later calls keep the first subscriber.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    let builder = tracing_subscriber::fmt().with_target(false).with_max_level(log_level);
    let outcome = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    let _ = outcome;
}
