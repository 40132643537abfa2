use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod context;

use context::Context;

#[derive(Parser)]
#[command(name = "pawstreak", version, about = "Pawstreak training engagement CLI")]
struct Cli {
    /// Learner id (defaults to the last `learner use` choice, then "default")
    #[arg(long, global = true)]
    learner: Option<String>,

    /// Curriculum JSON file (defaults to the built-in starter curriculum)
    #[arg(long, global = true)]
    curriculum: Option<PathBuf>,

    /// Evaluate as if it were this RFC 3339 instant
    #[arg(long, global = true)]
    now: Option<String>,

    /// Enable debug logging to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log practice sessions
    Practice {
        #[command(subcommand)]
        action: commands::practice::PracticeAction,
    },
    /// Daily streak, freezes and recovery
    Streak {
        #[command(subcommand)]
        action: commands::streak::StreakAction,
    },
    /// Weekly challenge
    Challenge {
        #[command(subcommand)]
        action: commands::challenge::ChallengeAction,
    },
    /// Daily practice plan
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Skill freshness
    Freshness {
        #[command(subcommand)]
        action: commands::freshness::FreshnessAction,
    },
    /// Badges
    Badges {
        #[command(subcommand)]
        action: commands::badges::BadgesAction,
    },
    /// Learner profile and selection
    Learner {
        #[command(subcommand)]
        action: commands::learner::LearnerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Context::new(cli.learner, cli.curriculum, cli.now.as_deref()).and_then(|ctx| {
        match cli.command {
            Commands::Practice { action } => commands::practice::run(&ctx, action),
            Commands::Streak { action } => commands::streak::run(&ctx, action),
            Commands::Challenge { action } => commands::challenge::run(&ctx, action),
            Commands::Plan { action } => commands::plan::run(&ctx, action),
            Commands::Freshness { action } => commands::freshness::run(&ctx, action),
            Commands::Badges { action } => commands::badges::run(&ctx, action),
            Commands::Learner { action } => commands::learner::run(&ctx, action),
            Commands::Config { action } => commands::config::run(action),
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
