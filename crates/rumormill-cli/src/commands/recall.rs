use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;
use rumormill_query::FetchOptions;

use crate::output::{format, OutputFormat};

#[derive(Args)]
pub struct RecallArgs {
    /// Agent doing the remembering
    pub agent: String,

    /// Topic to recall
    pub topic: String,

    /// Maximum memories (defaults to the configured limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Skip memories shared with every agent
    #[arg(long)]
    pub no_global: bool,

    /// Skip memories reached through connected entities and hearsay
    #[arg(long)]
    pub no_connections: bool,
}

pub fn run(args: &RecallArgs, config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);

    let mut options = FetchOptions::from(&config.retrieval);
    if let Some(limit) = args.limit {
        options.limit = limit;
    }
    if args.no_global {
        options.include_global = false;
    }
    if args.no_connections {
        options.include_connections = false;
    }

    let memories = mill
        .memory_index()
        .fetch_memories(&args.agent, &args.topic, options);
    println!("{}", format::format_memories(&memories, fmt));
    Ok(())
}
