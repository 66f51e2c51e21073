use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use taxcalc::cli::setup::setup;
use taxcalc::core::log::init_logging;
use taxcalc::core::period::Period;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display income and taxes for a lookback period
    Report {
        /// Lookback in months
        #[arg(short, long, conflicts_with = "period")]
        months: Option<f64>,

        /// Lookback with a unit, e.g. 3m, 1y, 6w, 10d
        #[arg(short, long)]
        period: Option<Period>,
    },
}

impl From<Commands> for taxcalc::AppCommand {
    fn from(cmd: Commands) -> taxcalc::AppCommand {
        match cmd {
            Commands::Report { months, period } => taxcalc::AppCommand::Report {
                period: period.or(months.map(Period::Months)),
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => taxcalc::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
