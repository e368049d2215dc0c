use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;

use crate::output::{format, OutputFormat};

#[derive(Args)]
pub struct PathArgs {
    /// Start node id
    pub source: String,

    /// End node id
    pub target: String,
}

pub fn run(args: &PathArgs, config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let steps = mill
        .path_finder()
        .relationship_path(&args.source, &args.target);
    println!("{}", format::format_path(&steps, fmt));
    Ok(())
}
