use std::sync::Arc;

use tracing::{debug, info};

use rumormill_core::extract::{build_extractor, ExtractionContext};
use rumormill_core::graph::{KnowledgeGraph, MemoryOptions};
use rumormill_core::model::GLOBAL_AGENT;
use rumormill_core::RumormillConfig;
use rumormill_propagation::{ObservedTurn, PropagationTracker};
use rumormill_query::{FetchOptions, MemoryIndex, RelationshipPathFinder};

use crate::dialogue::{AgentProfile, DialogueProvider, DialogueRequest, DialogueResult, TurnOutcome};
use crate::error::SdkError;

const SEED_IMPORTANCE: f64 = 0.8;
const SECRET_IMPORTANCE: f64 = 0.8;

/// Shared memory graph plus propagation tracker, driven one turn at a time.
pub struct Rumormill {
    graph: Arc<KnowledgeGraph>,
    tracker: Arc<PropagationTracker>,
    config: RumormillConfig,
}

impl Rumormill {
    /// Open both stores under `config.data_dir`.
    pub fn open(config: RumormillConfig) -> Self {
        let extractor = build_extractor(&config.extraction);
        let graph = KnowledgeGraph::open(config.graph_path(), extractor);
        let tracker = PropagationTracker::open(config.experiments_path(), config.propagation.clone());
        Self::from_parts(Arc::new(graph), Arc::new(tracker), config)
    }

    /// Stores that live only as long as this value.
    pub fn in_memory(config: RumormillConfig) -> Self {
        let extractor = build_extractor(&config.extraction);
        let graph = KnowledgeGraph::in_memory(extractor);
        let tracker = PropagationTracker::in_memory(config.propagation.clone());
        Self::from_parts(Arc::new(graph), Arc::new(tracker), config)
    }

    pub fn from_parts(
        graph: Arc<KnowledgeGraph>,
        tracker: Arc<PropagationTracker>,
        config: RumormillConfig,
    ) -> Self {
        Self {
            graph,
            tracker,
            config,
        }
    }

    pub fn graph(&self) -> &Arc<KnowledgeGraph> {
        &self.graph
    }

    pub fn tracker(&self) -> &Arc<PropagationTracker> {
        &self.tracker
    }

    pub fn config(&self) -> &RumormillConfig {
        &self.config
    }

    pub fn memory_index(&self) -> MemoryIndex<'_> {
        MemoryIndex::new(&self.graph)
    }

    pub fn path_finder(&self) -> RelationshipPathFinder<'_> {
        RelationshipPathFinder::new(&self.graph)
    }

    /// Give every agent the opening rumor and note who heard it globally.
    pub fn seed_rumor(&self, agents: &[AgentProfile], hook: &str) {
        for agent in agents {
            self.graph.add_memory(
                &agent.id,
                hook,
                MemoryOptions::default().with_importance(SEED_IMPORTANCE),
            );
            self.graph.add_memory(
                GLOBAL_AGENT,
                &format!("{} heard: {hook}", agent.name),
                MemoryOptions::default(),
            );
        }
        info!("Seeded {} agents with {hook:?}", agents.len());
    }

    /// Gather the speaker's memories for the upcoming line.
    pub fn prepare_turn(
        &self,
        speaker: &AgentProfile,
        listener: &AgentProfile,
        topic: &str,
        world_context: &str,
    ) -> DialogueRequest {
        let memories = self.memory_index().fetch_memories(
            &speaker.id,
            topic,
            FetchOptions::from(&self.config.retrieval),
        );
        DialogueRequest {
            speaker: speaker.clone(),
            listener: listener.clone(),
            memories,
            topic: topic.to_string(),
            world_context: world_context.to_string(),
        }
    }

    /// Write a finished turn into both agents' memories and the tracker.
    pub fn record_turn(
        &self,
        speaker: &AgentProfile,
        listener: &AgentProfile,
        topic: &str,
        result: DialogueResult,
        turn_number: u64,
    ) -> TurnOutcome {
        let result = result.clamped();

        let speaker_memory_id = self.graph.add_memory(
            &speaker.id,
            &result.new_memory,
            MemoryOptions::default()
                .with_tags([topic, listener.id.as_str()])
                .with_importance(result.rumor_delta)
                .with_context(ExtractionContext::conversation(&speaker.id, &listener.id)),
        );
        let listener_memory_id = self.graph.add_memory(
            &listener.id,
            &format!("Heard from {} that {}", speaker.name, result.new_memory),
            MemoryOptions::default()
                .with_tags([topic, speaker.id.as_str()])
                .with_importance(result.rumor_delta),
        );

        let detections = if self.config.propagation.enabled && !result.utterance.is_empty() {
            self.tracker.observe_turn(&ObservedTurn {
                speaker_id: &speaker.id,
                speaker_name: &speaker.name,
                speaker_mood: &speaker.mood,
                speaker_profession: &speaker.profession,
                listener_id: &listener.id,
                content: &result.utterance,
                turn_number,
            })
        } else {
            Vec::new()
        };

        debug!(
            "Recorded turn {turn_number}: {} -> {} ({} detections)",
            speaker.id,
            listener.id,
            detections.len()
        );
        TurnOutcome {
            result,
            speaker_memory_id,
            listener_memory_id,
            detections,
        }
    }

    /// Prepare, generate and record one turn.
    pub fn run_turn(
        &self,
        provider: &dyn DialogueProvider,
        speaker: &AgentProfile,
        listener: &AgentProfile,
        topic: &str,
        world_context: &str,
        turn_number: u64,
    ) -> Result<TurnOutcome, SdkError> {
        let request = self.prepare_turn(speaker, listener, topic, world_context);
        let result = provider.generate(&request)?;
        Ok(self.record_turn(speaker, listener, topic, result, turn_number))
    }

    /// Start a propagation experiment and plant the secret in `agent`'s memory.
    pub fn inject_secret(&self, agent: &AgentProfile, secret: &str) -> String {
        self.inject_secret_as(agent, secret, None)
    }

    /// Like [`Rumormill::inject_secret`], reusing `experiment_id` when given.
    pub fn inject_secret_as(
        &self,
        agent: &AgentProfile,
        secret: &str,
        experiment_id: Option<&str>,
    ) -> String {
        let experiment_id = self
            .tracker
            .inject_secret(&agent.id, &agent.name, secret, experiment_id);
        self.graph.add_memory(
            &agent.id,
            &format!("[SECRET] {secret}"),
            MemoryOptions::default()
                .with_tags(["injected_secret", "confidential"])
                .with_importance(SECRET_IMPORTANCE),
        );
        experiment_id
    }
}
