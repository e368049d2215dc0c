use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;

use crate::output::{format, OutputFormat};

#[derive(Args)]
pub struct EntityArgs {
    /// Node id (e.g. "location:vault" or "npc:guard")
    pub id: String,

    /// Traversal depth
    #[arg(long, default_value = "2")]
    pub depth: usize,
}

pub fn run(args: &EntityArgs, config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let context = mill.path_finder().entity_context(&args.id, args.depth);
    println!("{}", format::format_entity_context(context.as_ref(), fmt));
    Ok(())
}
