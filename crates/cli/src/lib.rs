pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "smartmenu",
    about = "Smartmenu operator CLI",
    long_about = "Operate Smartmenu migrations, demo data, set planning, config inspection, and readiness checks.",
    after_help = "Examples:\n  smartmenu doctor --json\n  smartmenu plan \"нас трое, бюджет 30000, кальян\"\n  smartmenu seed"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo order board into the configured database")]
    Seed,
    #[command(about = "Parse a guest request and print the three generated menu sets")]
    Plan {
        #[arg(help = "Free-text guest request, e.g. \"нас трое, бюджет 30000, кальян\"")]
        request: String,
        #[arg(long, help = "Pin the randomized choice points to a fixed seed")]
        seed: Option<u64>,
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, voice credential readiness, and DB connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Plan { request, seed, json } => {
            commands::CommandResult { exit_code: 0, output: commands::plan::run(&request, seed, json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            let (output, exit_code) = commands::doctor::run(json);
            commands::CommandResult { exit_code, output }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
