use anyhow::Result;

use rumormill_core::RumormillConfig;

pub fn run(config: &RumormillConfig) -> Result<()> {
    let mill = super::open(config);
    let count = mill.tracker().get_all_experiments().len();
    mill.tracker().clear_experiments();
    println!("Cleared {count} experiments.");
    Ok(())
}
