use anyhow::Result;
use clap::Args;

use rumormill_core::{ExtractionContext, MemoryOptions, RumormillConfig};

#[derive(Args)]
pub struct RememberArgs {
    /// Agent that owns the memory ("global" for shared knowledge)
    pub agent: String,

    /// Memory text
    pub text: String,

    /// Tag to attach (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Importance in [0, 1]
    #[arg(long, default_value = "0.5")]
    pub importance: f64,

    /// Agent who said it, for conversation context
    #[arg(long)]
    pub speaker: Option<String>,

    /// Agent who heard it, for conversation context
    #[arg(long)]
    pub listener: Option<String>,
}

pub fn run(args: &RememberArgs, config: &RumormillConfig) -> Result<()> {
    let mill = super::open(config);

    let mut options = MemoryOptions::default()
        .with_tags(args.tags.iter().map(String::as_str))
        .with_importance(args.importance);
    if args.speaker.is_some() || args.listener.is_some() {
        options = options.with_context(ExtractionContext {
            speaker: args.speaker.clone(),
            listener: args.listener.clone(),
        });
    }

    let id = mill.graph().add_memory(&args.agent, &args.text, options);
    println!("{id}");
    Ok(())
}
