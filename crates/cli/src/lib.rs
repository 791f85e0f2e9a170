pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use greenlight_core::config::AppConfig;

#[derive(Debug, Parser)]
#[command(
    name = "greenlight",
    about = "Greenlight operator CLI",
    long_about = "Operate approval-gated agent conversations, plan reviews, config inspection, and readiness checks.",
    after_help = "Examples:\n  greenlight chat\n  greenlight plan \"ship the release\"\n  greenlight doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive chat session that pauses for tool approval")]
    Chat {
        #[arg(long, help = "Thread id to use for this session (defaults to a random id)")]
        thread: Option<String>,
    },
    #[command(about = "Draft a plan for a task and review it (approve/reject/modify)")]
    Plan {
        #[arg(help = "Task to plan for", trailing_var_arg = true)]
        task: Vec<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, reasoning backend readiness, and the tool registry")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { thread } => commands::chat::run(thread).await,
        Command::Plan { task } => commands::plan::run(task.join(" ")).await,
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

pub(crate) fn init_logging(config: &AppConfig) {
    use greenlight_core::config::LogFormat::{Compact, Json, Pretty};
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}
