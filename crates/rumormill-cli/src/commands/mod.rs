pub mod analysis;
pub mod clear;
pub mod entity;
pub mod experiments;
pub mod graph;
pub mod init_config;
pub mod inject;
pub mod observe;
pub mod path;
pub mod recall;
pub mod remember;
pub mod report;
pub mod reset;
pub mod seed;
pub mod stats;

use clap::Subcommand;

use rumormill_core::RumormillConfig;
use rumormill_sdk::Rumormill;

#[derive(Subcommand)]
pub enum Commands {
    /// Record a memory for an agent
    Remember(remember::RememberArgs),
    /// Seed an agent with important memories
    Seed(seed::SeedArgs),
    /// Fetch an agent's ranked memories about a topic
    Recall(recall::RecallArgs),
    /// Show an entity and its neighbourhood
    Entity(entity::EntityArgs),
    /// Shortest relationship path between two nodes
    Path(path::PathArgs),
    /// Show knowledge graph statistics
    Stats,
    /// Show the knowledge graph or a subgraph
    Graph(graph::GraphArgs),
    /// Clear the knowledge graph
    Reset,
    /// Plant a secret in an agent and start an experiment
    Inject(inject::InjectArgs),
    /// Check a dialogue turn for tracked secrets
    Observe(observe::ObserveArgs),
    /// List experiments or show one
    Experiments(experiments::ExperimentsArgs),
    /// Aggregate propagation statistics
    Analysis,
    /// Markdown propagation report
    Report,
    /// Discard all experiments
    Clear,
    /// Write a default configuration file
    InitConfig(init_config::InitConfigArgs),
}

pub(crate) fn open(config: &RumormillConfig) -> Rumormill {
    Rumormill::open(config.clone())
}
