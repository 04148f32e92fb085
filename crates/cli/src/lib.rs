pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "relayctl",
    about = "Webhook relay operator CLI",
    long_about = "Inspect relay configuration, run readiness checks, and send test payloads to the automation webhook.",
    after_help = "Examples:\n  relayctl doctor --json\n  relayctl config\n  relayctl send \"where is my order: #STG1063\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, webhook URL, and outbound header readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "POST a single test message to the configured webhook")]
    Send {
        #[arg(help = "Message text to deliver")]
        message: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Send { message } => commands::send::run(&message),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
