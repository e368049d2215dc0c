use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use rumormill_core::config::PropagationConfig;
use rumormill_core::model::truncate_chars;
use rumormill_core::storage::SnapshotFile;

use crate::analysis::{self, PropagationAnalysis};
use crate::experiment::{ExperimentSummary, PropagationExperiment, SecretTrace};
use crate::personality::PersonalityBucket;
use crate::similarity::{keyword_hits, mutation_descriptor, similarity};

const SNIPPET_CHARS: usize = 200;
const KEYWORD_MATCH_SIMILARITY: f64 = 0.5;

/// One dialogue turn as seen by the tracker.
#[derive(Debug, Clone, Copy)]
pub struct ObservedTurn<'a> {
    pub speaker_id: &'a str,
    pub speaker_name: &'a str,
    pub speaker_mood: &'a str,
    pub speaker_profession: &'a str,
    pub listener_id: &'a str,
    pub content: &'a str,
    pub turn_number: u64,
}

/// A secret recognised in a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub experiment_id: String,
    pub trace: SecretTrace,
}

#[derive(Serialize, Deserialize)]
struct TrackerSnapshot {
    experiments: Vec<PropagationExperiment>,
    saved_at: DateTime<Utc>,
}

/// Store of propagation experiments, in creation order.
pub struct PropagationTracker {
    experiments: Mutex<Vec<PropagationExperiment>>,
    settings: PropagationConfig,
    snapshot: Option<SnapshotFile>,
}

impl PropagationTracker {
    /// Open a tracker persisted at `path`. An unreadable snapshot starts empty.
    pub fn open(path: impl Into<PathBuf>, settings: PropagationConfig) -> Self {
        let snapshot = SnapshotFile::new(path);
        let experiments = match snapshot.load::<TrackerSnapshot>() {
            Ok(Some(mut data)) => {
                info!("Loaded {} previous experiments", data.experiments.len());
                for experiment in &mut data.experiments {
                    experiment.ensure_keywords();
                }
                data.experiments
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(
                    "Failed to load experiments from {}: {e}",
                    snapshot.path().display()
                );
                Vec::new()
            }
        };
        Self {
            experiments: Mutex::new(experiments),
            settings,
            snapshot: Some(snapshot),
        }
    }

    pub fn in_memory(settings: PropagationConfig) -> Self {
        Self {
            experiments: Mutex::new(Vec::new()),
            settings,
            snapshot: None,
        }
    }

    /// Start tracking `secret`, planted in `agent_id`.
    ///
    /// Without an explicit id one is derived from the current UTC time. An
    /// explicit id that already exists replaces that experiment.
    pub fn inject_secret(
        &self,
        agent_id: &str,
        agent_name: &str,
        secret: &str,
        experiment_id: Option<&str>,
    ) -> String {
        let mut experiments = self.experiments.lock();
        let id = match experiment_id {
            Some(id) => id.to_string(),
            None => unique_id(&experiments, Utc::now()),
        };
        let experiment = PropagationExperiment::new(id.clone(), agent_id, agent_name, secret);

        match experiments.iter_mut().find(|e| e.experiment_id == id) {
            Some(existing) => *existing = experiment,
            None => experiments.push(experiment),
        }

        info!(
            "Injected secret into {agent_name}: '{}' (exp: {id})",
            truncate_chars(secret, 50)
        );
        self.persist(&experiments);
        id
    }

    /// Check a turn against every experiment and record what it reveals.
    pub fn observe_turn(&self, turn: &ObservedTurn<'_>) -> Vec<Detection> {
        let content_lower = turn.content.to_lowercase();
        let mut detections = Vec::new();
        let mut experiments = self.experiments.lock();

        for experiment in experiments.iter_mut() {
            let sim = similarity(turn.content, &experiment.secret);
            let keyword_match =
                keyword_hits(&content_lower, &experiment.keywords) >= self.settings.min_keyword_matches;
            if !(sim > self.settings.similarity_threshold || keyword_match) {
                continue;
            }

            let personality =
                PersonalityBucket::classify(turn.speaker_mood, turn.speaker_profession, turn.speaker_name);
            let mutation = mutation_descriptor(turn.content, &experiment.secret);
            let trace = SecretTrace {
                turn_number: turn.turn_number,
                agent_id: turn.speaker_id.to_string(),
                agent_name: turn.speaker_name.to_string(),
                personality,
                content_snippet: truncate_chars(turn.content, SNIPPET_CHARS),
                similarity: if keyword_match {
                    sim.max(KEYWORD_MATCH_SIMILARITY)
                } else {
                    sim
                },
                mutation_descriptor: mutation,
                timestamp: Utc::now(),
            };

            experiment.traces.push(trace.clone());
            experiment.agents_reached.insert(turn.speaker_id.to_string());
            experiment.agents_reached.insert(turn.listener_id.to_string());
            experiment.total_turns = experiment.total_turns.max(turn.turn_number);

            info!(
                "Secret propagation detected: {} -> turn {}, similarity: {sim:.2}, mutation: {}",
                turn.speaker_name,
                turn.turn_number,
                truncate_chars(&trace.mutation_descriptor, 50)
            );
            detections.push(Detection {
                experiment_id: experiment.experiment_id.clone(),
                trace,
            });
        }

        if detections.is_empty() {
            debug!("Turn {} revealed no tracked secret", turn.turn_number);
        } else {
            self.persist(&experiments);
        }
        detections
    }

    pub fn get_experiment_results(&self, experiment_id: &str) -> Option<ExperimentSummary> {
        self.experiments
            .lock()
            .iter()
            .find(|e| e.experiment_id == experiment_id)
            .map(PropagationExperiment::summary)
    }

    pub fn get_all_experiments(&self) -> Vec<ExperimentSummary> {
        self.experiments
            .lock()
            .iter()
            .map(PropagationExperiment::summary)
            .collect()
    }

    pub fn get_propagation_analysis(&self) -> PropagationAnalysis {
        analysis::analyze(&self.experiments.lock())
    }

    /// Markdown report over all experiments.
    pub fn generate_report(&self) -> String {
        analysis::render_report(&self.experiments.lock())
    }

    /// Discard every experiment and persist the empty state.
    pub fn clear_experiments(&self) {
        let mut experiments = self.experiments.lock();
        experiments.clear();
        info!("Cleared all experiments");
        self.persist(&experiments);
    }

    fn persist(&self, experiments: &[PropagationExperiment]) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        let data = TrackerSnapshot {
            experiments: experiments.to_vec(),
            saved_at: Utc::now(),
        };
        if let Err(e) = snapshot.save(&data) {
            warn!(
                "Failed to persist experiments to {}: {e}",
                snapshot.path().display()
            );
        }
    }
}

/// `exp_YYYYmmdd_HHMMSS`, suffixed `_2`, `_3`, ... when already taken.
fn unique_id(experiments: &[PropagationExperiment], now: DateTime<Utc>) -> String {
    let base = format!("exp_{}", now.format("%Y%m%d_%H%M%S"));
    let taken = |id: &str| experiments.iter().any(|e| e.experiment_id == id);
    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn tracker() -> PropagationTracker {
        PropagationTracker::in_memory(PropagationConfig::default())
    }

    fn turn<'a>(speaker: &'a str, listener: &'a str, content: &'a str, n: u64) -> ObservedTurn<'a> {
        ObservedTurn {
            speaker_id: speaker,
            speaker_name: speaker,
            speaker_mood: "curious",
            speaker_profession: "bard",
            listener_id: listener,
            content,
            turn_number: n,
        }
    }

    #[test]
    fn test_inject_reaches_only_seed() {
        let tracker = tracker();
        let id = tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", Some("exp_a"));
        assert_eq!(id, "exp_a");
        let results = tracker.get_experiment_results(&id).unwrap();
        assert_eq!(results.agents_reached, vec!["guard".to_string()]);
        assert!(results.traces.is_empty());
        assert_eq!(results.seed_agent.name, "Rylan");
    }

    #[test]
    fn test_mayor_rebels_detection() {
        let tracker = tracker();
        let id = tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", None);
        let detections = tracker.observe_turn(&ObservedTurn {
            speaker_id: "guard",
            speaker_name: "Rylan",
            speaker_mood: "guarded",
            speaker_profession: "guard",
            listener_id: "mara",
            content: "I heard the mayor met with rebels last night",
            turn_number: 1,
        });
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].experiment_id, id);
        assert!(detections[0].trace.similarity > 0.3);
        assert_eq!(detections[0].trace.personality, PersonalityBucket::Stoic);

        let results = tracker.get_experiment_results(&id).unwrap();
        assert!(results.agents_reached.contains(&"guard".to_string()));
        assert!(results.agents_reached.contains(&"mara".to_string()));
        assert_eq!(results.total_turns, 1);
    }

    #[test]
    fn test_unrelated_turn_not_detected() {
        let tracker = tracker();
        tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", None);
        let detections = tracker.observe_turn(&turn("kel", "iris", "Aye.", 3));
        assert!(detections.is_empty());
    }

    #[test]
    fn test_keyword_match_floors_similarity() {
        let tracker = tracker();
        tracker.inject_secret("iris", "Iris", "silver ledger hidden", Some("exp_ledger"));
        let long = "Between you and me, friend, somebody keeps a silver ledger somewhere quiet, \
                    and half the harbor would pay dearly to read what is written inside it";
        let detections = tracker.observe_turn(&turn("kel", "mara", long, 7));
        assert_eq!(detections.len(), 1);
        assert!(detections[0].trace.similarity >= 0.5);
        assert!(detections[0].trace.content_snippet.chars().count() <= 200);
    }

    #[test]
    fn test_two_experiments_are_independent() {
        let tracker = tracker();
        let a = tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", Some("exp_a"));
        let b = tracker.inject_secret("mara", "Mara", "The silver shipment vanished", Some("exp_b"));

        let detections = tracker.observe_turn(&turn(
            "kel",
            "iris",
            "the mayor met someone while the silver shipment vanished",
            2,
        ));
        let ids: Vec<_> = detections.iter().map(|d| d.experiment_id.as_str()).collect();
        assert_eq!(ids, vec!["exp_a", "exp_b"]);

        let a = tracker.get_experiment_results(&a).unwrap();
        let b = tracker.get_experiment_results(&b).unwrap();
        assert_eq!(a.traces.len(), 1);
        assert_eq!(b.traces.len(), 1);
        assert!(a.agents_reached.contains(&"guard".to_string()));
        assert!(!b.agents_reached.contains(&"guard".to_string()));
    }

    #[test]
    fn test_total_turns_is_max() {
        let tracker = tracker();
        let id = tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", None);
        tracker.observe_turn(&turn("kel", "iris", "the mayor met the rebels", 5));
        tracker.observe_turn(&turn("iris", "mara", "the mayor met the rebels", 2));
        let results = tracker.get_experiment_results(&id).unwrap();
        assert_eq!(results.total_turns, 5);
        assert_eq!(results.traces.len(), 2);
    }

    #[test]
    fn test_default_ids_get_suffixes() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let mut existing = Vec::new();
        assert_eq!(unique_id(&existing, now), "exp_20240501_123000");
        existing.push(PropagationExperiment::new("exp_20240501_123000", "a", "A", "s"));
        assert_eq!(unique_id(&existing, now), "exp_20240501_123000_2");
        existing.push(PropagationExperiment::new("exp_20240501_123000_2", "a", "A", "s"));
        assert_eq!(unique_id(&existing, now), "exp_20240501_123000_3");
    }

    #[test]
    fn test_rapid_injections_get_distinct_ids() {
        let tracker = tracker();
        let first = tracker.inject_secret("a", "A", "one", None);
        let second = tracker.inject_secret("b", "B", "two", None);
        assert_ne!(first, second);
        assert_eq!(tracker.get_all_experiments().len(), 2);
    }

    #[test]
    fn test_explicit_id_replaces() {
        let tracker = tracker();
        tracker.inject_secret("a", "A", "first secret", Some("exp_x"));
        tracker.inject_secret("b", "B", "second secret", Some("exp_x"));
        let all = tracker.get_all_experiments();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].secret, "second secret");
    }

    #[test]
    fn test_persists_and_reloads() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("experiments.json");
        {
            let tracker = PropagationTracker::open(&path, PropagationConfig::default());
            tracker.inject_secret("guard", "Rylan", "The mayor met the rebels", Some("exp_a"));
            tracker.observe_turn(&turn("guard", "mara", "the mayor met the rebels", 1));
        }
        let tracker = PropagationTracker::open(&path, PropagationConfig::default());
        let results = tracker.get_experiment_results("exp_a").unwrap();
        assert_eq!(results.traces.len(), 1);
        assert_eq!(results.agents_reached, vec!["guard".to_string(), "mara".to_string()]);

        tracker.clear_experiments();
        let reopened = PropagationTracker::open(&path, PropagationConfig::default());
        assert!(reopened.get_all_experiments().is_empty());
    }

    #[test]
    fn test_snapshot_without_keywords_still_matches() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("experiments.json");
        std::fs::write(
            &path,
            r#"{"experiments": [{
                "experiment_id": "exp_ledger",
                "secret": "silver ledger hidden",
                "seed_agent_id": "iris",
                "seed_agent_name": "Iris",
                "start_time": "2026-01-01T00:00:00Z"
            }], "saved_at": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();

        let tracker = PropagationTracker::open(&path, PropagationConfig::default());
        let long = "Between you and me, friend, somebody keeps a silver ledger somewhere quiet, \
                    and half the harbor would pay dearly to read what is written inside it";
        let detections = tracker.observe_turn(&turn("kel", "mara", long, 2));
        assert_eq!(detections.len(), 1);
        assert!(detections[0].trace.similarity >= 0.5);
    }

    #[test]
    fn test_thresholds_are_configurable() {
        let strict = PropagationTracker::in_memory(PropagationConfig {
            similarity_threshold: 0.99,
            min_keyword_matches: 100,
            ..Default::default()
        });
        strict.inject_secret("guard", "Rylan", "The mayor met the rebels", None);
        assert!(strict
            .observe_turn(&turn("kel", "iris", "I heard the mayor met with rebels", 1))
            .is_empty());
    }
}
