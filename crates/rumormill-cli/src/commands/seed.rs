use anyhow::{bail, Result};
use clap::Args;

use rumormill_core::RumormillConfig;

#[derive(Args)]
pub struct SeedArgs {
    /// Agent to seed
    pub agent: String,

    /// Memories to plant, each stored with high importance
    #[arg(required = true)]
    pub entries: Vec<String>,
}

pub fn run(args: &SeedArgs, config: &RumormillConfig) -> Result<()> {
    if args.entries.iter().all(|e| e.trim().is_empty()) {
        bail!("Nothing to seed");
    }
    let mill = super::open(config);
    for id in mill.graph().seed(&args.agent, &args.entries) {
        println!("{id}");
    }
    Ok(())
}
