use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use starroute_cli::output::OutputFormat;

mod commands;

use commands::path::PathArgs;
use commands::tour::TourArgs;

#[derive(Parser, Debug)]
#[command(author, version, about = "Jump-range pathfinding and tour planning")]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Command,
}

/// Options shared by every subcommand.
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOptions {
    /// Override the systems dataset path (defaults to $STARROUTE_DATA, then
    /// the platform data directory).
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    /// Print only location names in visiting order.
    #[arg(long, global = true)]
    pub names_only: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find the shortest jump path between two systems.
    Path(PathArgs),
    /// Plan a closed tour over a destinations file.
    Tour(TourArgs),
    /// Print the cost matrix a tour would be optimized with.
    Matrix(TourArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Path(args) => commands::path::handle_path(&cli.global, &args),
        Command::Tour(args) => commands::tour::handle_tour(&cli.global, &args).await,
        Command::Matrix(args) => commands::tour::handle_matrix(&cli.global, &args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
