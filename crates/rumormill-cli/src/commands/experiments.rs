use anyhow::{Context, Result};
use clap::Args;

use rumormill_core::RumormillConfig;

use crate::output::{format, OutputFormat};

#[derive(Args)]
pub struct ExperimentsArgs {
    /// Show one experiment in full
    pub id: Option<String>,
}

pub fn run(args: &ExperimentsArgs, config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);

    match &args.id {
        Some(id) => {
            let summary = mill
                .tracker()
                .get_experiment_results(id)
                .with_context(|| format!("No experiment with id {id}"))?;
            println!("{}", format::format_experiment(&summary, fmt));
        }
        None => {
            let all = mill.tracker().get_all_experiments();
            println!("{}", format::format_experiment_list(&all, fmt));
        }
    }
    Ok(())
}
