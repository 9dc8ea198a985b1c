use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "fittimer", version, about = "Plank and HIIT workout timer")]
struct Cli {
    /// Log engine lifecycle to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Hold a plank against a count-up stopwatch
    Plank(commands::plank::PlankArgs),
    /// Run a work/rest interval workout
    Hiit(commands::hiit::HiitArgs),
    /// Recorded sessions
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Session statistics
    Stats(commands::stats::StatsArgs),
    /// Named HIIT presets
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Show or change settings in config.toml
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("FITTIMER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("fittimer_core={default_level},fittimer={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Plank(args) => commands::plank::run(args),
        Commands::Hiit(args) => commands::hiit::run(args),
        Commands::History { action } => commands::history::run(action),
        Commands::Stats(args) => commands::stats::run(args),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
