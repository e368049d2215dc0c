use anyhow::Result;

use rumormill_core::RumormillConfig;

pub fn run(config: &RumormillConfig) -> Result<()> {
    let mill = super::open(config);
    print!("{}", mill.tracker().generate_report());
    Ok(())
}
