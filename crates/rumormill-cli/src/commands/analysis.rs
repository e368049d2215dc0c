use anyhow::Result;

use rumormill_core::RumormillConfig;

use crate::output::{format, OutputFormat};

pub fn run(config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let analysis = mill.tracker().get_propagation_analysis();
    println!("{}", format::format_analysis(&analysis, fmt));
    Ok(())
}
