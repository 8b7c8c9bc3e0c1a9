mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::loan::{CompareArgs, ExportArgs, LoanArgs};

/// Loan EMI, amortization schedules, comparisons and CSV export
#[derive(Parser)]
#[command(
    name = "finbuddy",
    version,
    about = "Loan EMI, amortization schedules, comparisons and CSV export",
    long_about = "A CLI for monthly loan amortization with decimal precision. \
                  Computes EMIs and full schedules with extra monthly and lump-sum \
                  prepayments, compares loan offers side by side and exports \
                  schedules as spreadsheet-friendly CSV."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate the monthly EMI for a loan
    Emi(LoanArgs),
    /// Generate the full amortization schedule
    Schedule(LoanArgs),
    /// Compare several loans side by side
    Compare(CompareArgs),
    /// Show months and interest saved by extra and lump-sum payments
    Prepayment(LoanArgs),
    /// Export the amortization schedule to a CSV file
    Export(ExportArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Emi(args) => commands::loan::run_emi(args),
        Commands::Schedule(args) => commands::loan::run_schedule(args),
        Commands::Compare(args) => commands::loan::run_compare(args),
        Commands::Prepayment(args) => commands::loan::run_prepayment(args),
        Commands::Export(args) => commands::loan::run_export(args),
        Commands::Version => {
            println!("finbuddy {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
