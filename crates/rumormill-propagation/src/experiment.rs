use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::keywords::extract_keywords;
use crate::personality::PersonalityBucket;

/// One sighting of a secret in the dialogue stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretTrace {
    #[serde(rename = "turn")]
    pub turn_number: u64,
    pub agent_id: String,
    pub agent_name: String,
    #[serde(rename = "personality_type")]
    pub personality: PersonalityBucket,
    /// First 200 characters of what was said.
    #[serde(rename = "content")]
    pub content_snippet: String,
    pub similarity: f64,
    #[serde(rename = "mutation")]
    pub mutation_descriptor: String,
    pub timestamp: DateTime<Utc>,
}

/// A secret planted in one agent and everything observed about its spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationExperiment {
    pub experiment_id: String,
    pub secret: String,
    pub seed_agent_id: String,
    pub seed_agent_name: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub traces: Vec<SecretTrace>,
    #[serde(default)]
    pub agents_reached: BTreeSet<String>,
    #[serde(default)]
    pub total_turns: u64,
}

impl PropagationExperiment {
    pub fn new(
        experiment_id: impl Into<String>,
        seed_agent_id: impl Into<String>,
        seed_agent_name: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        let secret = secret.into();
        let seed_agent_id = seed_agent_id.into();
        Self {
            experiment_id: experiment_id.into(),
            keywords: extract_keywords(&secret),
            secret,
            agents_reached: BTreeSet::from([seed_agent_id.clone()]),
            seed_agent_id,
            seed_agent_name: seed_agent_name.into(),
            start_time: Utc::now(),
            traces: Vec::new(),
            total_turns: 0,
        }
    }

    /// Derive keywords from the secret when a loaded record has none.
    pub(crate) fn ensure_keywords(&mut self) {
        if self.keywords.is_empty() {
            self.keywords = extract_keywords(&self.secret);
        }
    }

    /// Agents reached per observed turn.
    pub fn propagation_rate(&self) -> f64 {
        self.agents_reached.len() as f64 / self.total_turns.max(1) as f64
    }

    pub fn summary(&self) -> ExperimentSummary {
        ExperimentSummary {
            experiment_id: self.experiment_id.clone(),
            secret: self.secret.clone(),
            seed_agent: SeedAgent {
                id: self.seed_agent_id.clone(),
                name: self.seed_agent_name.clone(),
            },
            start_time: self.start_time,
            total_turns: self.total_turns,
            agents_reached: self.agents_reached.iter().cloned().collect(),
            propagation_rate: self.propagation_rate(),
            traces: self.traces.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAgent {
    pub id: String,
    pub name: String,
}

/// Read-only view of an experiment as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    pub experiment_id: String,
    pub secret: String,
    pub seed_agent: SeedAgent,
    pub start_time: DateTime<Utc>,
    pub total_turns: u64,
    pub agents_reached: Vec<String>,
    pub propagation_rate: f64,
    pub traces: Vec<SecretTrace>,
}
