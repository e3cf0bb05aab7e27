pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "parley",
    about = "Parley operator CLI",
    long_about = "Run negotiations from the terminal and inspect roster, configuration, and runtime readiness.",
    after_help = "Examples:\n  parley run --product \"bamboo toothbrushes\" --quantity 50 --budget 2 --priority carbon\n  parley run --product shoes --quantity 2 --budget 80 --priority price --seller seller_budget\n  parley roster\n  parley doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run a negotiation and stream the transcript to the terminal")]
    Run {
        #[arg(long, help = "Product description, e.g. \"bamboo toothbrushes\"")]
        product: String,
        #[arg(long, help = "Requested quantity (positive integer)")]
        quantity: u32,
        #[arg(long, help = "Per-unit budget cap in currency units")]
        budget: f64,
        #[arg(long, help = "Optimization priority: speed, carbon, or price")]
        priority: String,
        #[arg(long, default_value = "Customer", help = "Buyer display name")]
        buyer_name: String,
        #[arg(long, help = "Negotiate with this seller only (direct mode)")]
        seller: Option<String>,
        #[arg(long, help = "Disable the client-facing stream pacing delays")]
        no_pacing: bool,
    },
    #[command(about = "Print the builtin seller roster as JSON")]
    Roster,
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Validate configuration, roster integrity, and LLM readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run { product, quantity, budget, priority, buyer_name, seller, no_pacing } => {
            commands::run::run(commands::run::RunArgs {
                product,
                quantity,
                budget,
                priority,
                buyer_name,
                seller,
                no_pacing,
            })
        }
        Command::Roster => {
            commands::CommandResult { exit_code: 0, output: commands::roster::run() }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
