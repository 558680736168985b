use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pawmodoro-cli", version, about = "Pawmodoro CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus sessions
    Focus {
        #[command(subcommand)]
        action: commands::focus::FocusAction,
    },
    /// Coins, completed sessions and streak
    Stats,
    /// Recently completed sessions
    History {
        /// Number of sessions to show
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Pet shop
    Shop {
        #[command(subcommand)]
        action: commands::shop::ShopAction,
    },
    /// Owned pets
    Pet {
        #[command(subcommand)]
        action: commands::pet::PetAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("PAWMODORO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Focus { action } => commands::focus::run(action),
        Commands::Stats => commands::stats::run(),
        Commands::History { limit } => commands::stats::history(limit),
        Commands::Shop { action } => commands::shop::run(action),
        Commands::Pet { action } => commands::pet::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
