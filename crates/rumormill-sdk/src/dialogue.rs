use serde::{Deserialize, Serialize};

use rumormill_core::model::MemoryRecord;
use rumormill_propagation::Detection;

use crate::error::SdkError;

const MIN_RUMOR_DELTA: f64 = 0.05;
const MAX_RUMOR_DELTA: f64 = 0.35;

/// Who an agent is, as far as memory and classification care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentProfile {
    pub id: String,
    pub name: String,
    pub profession: String,
    pub mood: String,
}

impl AgentProfile {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        profession: impl Into<String>,
        mood: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            profession: profession.into(),
            mood: mood.into(),
        }
    }
}

/// Everything a provider needs to write the speaker's next line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueRequest {
    pub speaker: AgentProfile,
    pub listener: AgentProfile,
    pub memories: Vec<MemoryRecord>,
    pub topic: String,
    pub world_context: String,
}

/// A generated line of dialogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueResult {
    pub utterance: String,
    /// How much the turn intensifies the rumor, in `[0.05, 0.35]`.
    pub rumor_delta: f64,
    pub sentiment: String,
    /// Short note the speaker keeps about what was shared.
    pub new_memory: String,
}

impl DialogueResult {
    pub fn new(
        utterance: impl Into<String>,
        rumor_delta: f64,
        sentiment: impl Into<String>,
        new_memory: impl Into<String>,
    ) -> Self {
        Self {
            utterance: utterance.into(),
            rumor_delta: clamp_delta(rumor_delta),
            sentiment: sentiment.into(),
            new_memory: new_memory.into(),
        }
    }

    /// Same result with `rumor_delta` forced into range.
    pub fn clamped(mut self) -> Self {
        self.rumor_delta = clamp_delta(self.rumor_delta);
        self
    }
}

fn clamp_delta(delta: f64) -> f64 {
    if delta.is_nan() {
        return MIN_RUMOR_DELTA;
    }
    delta.clamp(MIN_RUMOR_DELTA, MAX_RUMOR_DELTA)
}

/// A text-generation backend for dialogue.
pub trait DialogueProvider {
    fn generate(&self, request: &DialogueRequest) -> Result<DialogueResult, SdkError>;
}

/// What recording a turn changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub result: DialogueResult,
    pub speaker_memory_id: String,
    pub listener_memory_id: String,
    pub detections: Vec<Detection>,
}
