use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;
use rumormill_propagation::ObservedTurn;

use crate::output::{format, OutputFormat};

#[derive(Args)]
pub struct ObserveArgs {
    /// Speaking agent id
    pub speaker: String,

    /// Listening agent id
    pub listener: String,

    /// What the speaker said
    pub content: String,

    /// Turn number within the simulation
    #[arg(long, default_value = "1")]
    pub turn: u64,

    /// Speaker display name (defaults to the id)
    #[arg(long)]
    pub name: Option<String>,

    /// Speaker mood, used for personality classification
    #[arg(long, default_value = "")]
    pub mood: String,

    /// Speaker profession, used for personality classification
    #[arg(long, default_value = "")]
    pub profession: String,
}

pub fn run(args: &ObserveArgs, config: &RumormillConfig, fmt: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let detections = mill.tracker().observe_turn(&ObservedTurn {
        speaker_id: &args.speaker,
        speaker_name: args.name.as_deref().unwrap_or(&args.speaker),
        speaker_mood: &args.mood,
        speaker_profession: &args.profession,
        listener_id: &args.listener,
        content: &args.content,
        turn_number: args.turn,
    });
    println!("{}", format::format_detections(&detections, fmt));
    Ok(())
}
