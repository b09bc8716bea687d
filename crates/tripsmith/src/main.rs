//! Tripsmith - multi-agent trip planner

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{init_command, photo_command, plan_command, status_command, tools_command};

/// Tripsmith - plan trips with tool-calling agents
#[derive(Parser)]
#[command(name = "tripsmith")]
#[command(about = "◆ Multi-agent trip planner")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config and plan directory
    Init,
    /// Show system status
    Status,
    /// List the map and photo tools agents can use
    Tools {
        /// Only tools whose name contains one of these keywords
        #[arg(short, long)]
        filter: Vec<String>,
    },
    /// Plan a trip
    Plan(PlanArgs),
    /// Look up a photo URL for a place
    Photo {
        /// Place or sight name
        name: String,
    },
}

#[derive(Args)]
pub struct PlanArgs {
    /// Read the request from a JSON file instead of flags
    #[arg(short, long, conflicts_with_all = ["city", "start", "end"])]
    pub request: Option<PathBuf>,

    /// Destination city
    #[arg(short, long, required_unless_present = "request")]
    pub city: Option<String>,

    /// First day, YYYY-MM-DD
    #[arg(short, long, required_unless_present = "request")]
    pub start: Option<String>,

    /// Last day, YYYY-MM-DD
    #[arg(short, long, required_unless_present = "request")]
    pub end: Option<String>,

    /// Trip length in days; must agree with the dates, derived from them when omitted
    #[arg(short, long)]
    pub days: Option<u32>,

    /// Transportation preference
    #[arg(short, long, default_value = "public transit")]
    pub transport: String,

    /// Accommodation preference
    #[arg(short, long, default_value = "budget hotel")]
    pub accommodation: String,

    /// Interest tag, repeatable
    #[arg(short, long = "prefer")]
    pub preferences: Vec<String>,

    /// Free-form notes
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Write the plan JSON here instead of stdout
    #[arg(short, long, conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Save the plan under the plans directory
    #[arg(long)]
    pub save: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so plan JSON on stdout stays clean
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Init => init_command().await,
        Commands::Status => status_command().await,
        Commands::Tools { filter } => tools_command(filter).await,
        Commands::Plan(args) => plan_command(args).await,
        Commands::Photo { name } => photo_command(name).await,
    };

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
