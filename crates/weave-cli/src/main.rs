use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "weave", version, about = "Weave relationship health CLI")]
struct Cli {
    /// Engine config file (default: ~/.config/weave/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Health score per friend
    Score(commands::score::ScoreArgs),
    /// Tier fit analysis
    TierFit(commands::tier_fit::TierFitArgs),
    /// Network-wide health
    Health(commands::health::HealthArgs),
    /// Generate suggestions
    Suggest(commands::suggest::SuggestArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Print shell completions
    Completions {
        shell: clap_complete::Shell,
    },
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Score(args) => commands::score::run(args, config),
        Commands::TierFit(args) => commands::tier_fit::run(args, config),
        Commands::Health(args) => commands::health::run(args, config),
        Commands::Suggest(args) => commands::suggest::run(args, config),
        Commands::Config { action } => commands::config::run(action, config),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "weave", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
