use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "pomotask", version, about = "Pomotask CLI")]
struct Cli {
    /// Log debug output to stderr (overridden by POMOTASK_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Weekly and monthly totals by tag
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Per-tag time goals
    Goals {
        #[command(subcommand)]
        action: commands::goals::GoalsAction,
    },
    /// Countdowns and anniversaries
    Milestones {
        #[command(subcommand)]
        action: commands::milestones::MilestonesAction,
    },
    /// Recorded sessions
    Sessions {
        #[command(subcommand)]
        action: commands::sessions::SessionsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { "debug" } else { "warn" };

    let filter = tracing_subscriber::EnvFilter::try_from_env("POMOTASK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| format!("failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: {e}");
    }

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Goals { action } => commands::goals::run(action),
        Commands::Milestones { action } => commands::milestones::run(action),
        Commands::Sessions { action } => commands::sessions::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
