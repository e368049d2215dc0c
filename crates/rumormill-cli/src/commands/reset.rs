use anyhow::Result;

use rumormill_core::RumormillConfig;

pub fn run(config: &RumormillConfig) -> Result<()> {
    let mill = super::open(config);
    mill.graph().reset();
    println!("Knowledge graph cleared.");
    Ok(())
}
