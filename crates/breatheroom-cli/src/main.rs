use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "breatheroom-cli", version, about = "Breatheroom guided breathing CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Meditation session control
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Session statistics and streaks
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Print a motivational quote
    Quote {
        /// List every quote instead of picking one
        #[arg(long)]
        all: bool,
    },
    /// Decorative scene helpers
    Scene {
        #[command(subcommand)]
        action: commands::scene::SceneAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("BREATHEROOM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Quote { all } => commands::quote::run(all),
        Commands::Scene { action } => commands::scene::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "breatheroom-cli",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
