use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;
use rumormill_sdk::AgentProfile;

#[derive(Args)]
pub struct InjectArgs {
    /// Agent who starts out knowing the secret
    pub agent: String,

    /// The secret
    pub secret: String,

    /// Display name (defaults to the agent id)
    #[arg(long)]
    pub name: Option<String>,

    /// Reuse an experiment id, replacing that experiment
    #[arg(long = "id")]
    pub experiment_id: Option<String>,
}

pub fn run(args: &InjectArgs, config: &RumormillConfig) -> Result<()> {
    let mill = super::open(config);
    let name = args.name.as_deref().unwrap_or(&args.agent);
    let agent = AgentProfile::new(args.agent.as_str(), name, "", "");

    let id = mill.inject_secret_as(&agent, &args.secret, args.experiment_id.as_deref());
    println!("{id}");
    Ok(())
}
