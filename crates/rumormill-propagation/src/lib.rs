//! Propagation experiments: plant a secret in one agent, then watch the
//! dialogue stream for it resurfacing.
//!
//! Detection is heuristic (character-level similarity or shared keywords), so
//! it will both miss paraphrases and flag unrelated chatter now and then.

pub mod analysis;
pub mod experiment;
pub mod keywords;
pub mod personality;
pub mod similarity;
pub mod tracker;

pub use analysis::{BucketStats, PropagationAnalysis};
pub use experiment::{ExperimentSummary, PropagationExperiment, SecretTrace};
pub use keywords::extract_keywords;
pub use personality::PersonalityBucket;
pub use tracker::{Detection, ObservedTurn, PropagationTracker};
