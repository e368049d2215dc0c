use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use rumormill_core::RumormillConfig;

mod commands;
mod output;

#[derive(Parser)]
#[command(
    name = "rumormill",
    version,
    about = "Shared agent memory graph and rumor propagation experiments"
)]
struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Directory holding graph.json and experiments.json
    #[arg(long, global = true, env = "RUMORMILL_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, env = "RUMORMILL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<RumormillConfig> {
    let mut config = match &cli.config {
        Some(path) => RumormillConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RumormillConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    use commands::Commands;
    if let Commands::InitConfig(args) = &cli.command {
        return commands::init_config::run(args);
    }

    let config = load_config(&cli)?;
    match &cli.command {
        Commands::Remember(args) => commands::remember::run(args, &config),
        Commands::Seed(args) => commands::seed::run(args, &config),
        Commands::Recall(args) => commands::recall::run(args, &config, cli.format),
        Commands::Entity(args) => commands::entity::run(args, &config, cli.format),
        Commands::Path(args) => commands::path::run(args, &config, cli.format),
        Commands::Stats => commands::stats::run(&config, cli.format),
        Commands::Graph(args) => commands::graph::run(args, &config, cli.format),
        Commands::Reset => commands::reset::run(&config),
        Commands::Inject(args) => commands::inject::run(args, &config),
        Commands::Observe(args) => commands::observe::run(args, &config, cli.format),
        Commands::Experiments(args) => commands::experiments::run(args, &config, cli.format),
        Commands::Analysis => commands::analysis::run(&config, cli.format),
        Commands::Report => commands::report::run(&config),
        Commands::Clear => commands::clear::run(&config),
        Commands::InitConfig(args) => commands::init_config::run(args),
    }
}
