//! Turn facade for agent simulations built on Rumormill.
//!
//! A turn driver owns scheduling; this crate wires each turn through the
//! shared memory graph and the propagation tracker.
//!
//! # Example
//! ```no_run
//! use rumormill_sdk::{AgentProfile, RumormillConfig, Rumormill};
//!
//! let mill = Rumormill::open(RumormillConfig::default());
//! let guard = AgentProfile::new("guard", "Rylan", "guard", "suspicious");
//! let mara = AgentProfile::new("mara", "Mara", "shopkeeper", "curious");
//! mill.seed_rumor(&[guard.clone(), mara.clone()], "Vault door left ajar last night.");
//! let exp = mill.inject_secret(&guard, "The mayor met the rebels");
//! let request = mill.prepare_turn(&guard, &mara, "the vault", "quiet night at the docks");
//! println!("{exp}: {} memories for {}", request.memories.len(), request.speaker.name);
//! ```

mod dialogue;
mod error;
mod facade;

pub use dialogue::{AgentProfile, DialogueProvider, DialogueRequest, DialogueResult, TurnOutcome};
pub use error::SdkError;
pub use facade::Rumormill;

// Re-export types that callers of the facade handle directly
pub use rumormill_core::model::MemoryRecord;
pub use rumormill_core::RumormillConfig;
pub use rumormill_propagation::{Detection, ExperimentSummary, PropagationAnalysis};
