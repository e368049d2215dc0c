use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::experiment::{PropagationExperiment, SecretTrace};
use crate::personality::PersonalityBucket;

/// Trace statistics for one personality bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketStats {
    pub count: usize,
    pub avg_similarity: f64,
    /// Share of traces whose wording drifted from the secret.
    pub mutation_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationComparison {
    pub gossip_spreads_faster: bool,
    pub gossip_to_stoic_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InformationFidelity {
    pub avg_similarity_overall: f64,
}

/// Aggregate spread statistics across all experiments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationAnalysis {
    pub total_experiments: usize,
    pub total_agents_reached: usize,
    pub personality_analysis: BTreeMap<PersonalityBucket, BucketStats>,
    pub propagation_comparison: PropagationComparison,
    pub information_fidelity: InformationFidelity,
}

impl PropagationAnalysis {
    pub fn bucket(&self, bucket: PersonalityBucket) -> BucketStats {
        self.personality_analysis
            .get(&bucket)
            .copied()
            .unwrap_or_default()
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn bucket_stats(traces: &[&SecretTrace]) -> BucketStats {
    if traces.is_empty() {
        return BucketStats::default();
    }
    let n = traces.len() as f64;
    let avg_similarity = traces.iter().map(|t| t.similarity).sum::<f64>() / n;
    let mutated = traces
        .iter()
        .filter(|t| t.mutation_descriptor != "minimal drift")
        .count();
    BucketStats {
        count: traces.len(),
        avg_similarity: round_to(avg_similarity, 3),
        mutation_rate: round_to(mutated as f64 / n, 3),
    }
}

pub fn analyze(experiments: &[PropagationExperiment]) -> PropagationAnalysis {
    let traces: Vec<&SecretTrace> = experiments.iter().flat_map(|e| &e.traces).collect();

    let personality_analysis: BTreeMap<_, _> = PersonalityBucket::ALL
        .into_iter()
        .map(|bucket| {
            let in_bucket: Vec<&SecretTrace> = traces
                .iter()
                .copied()
                .filter(|t| t.personality == bucket)
                .collect();
            (bucket, bucket_stats(&in_bucket))
        })
        .collect();

    let gossip = personality_analysis[&PersonalityBucket::Gossip].count;
    let stoic = personality_analysis[&PersonalityBucket::Stoic].count;
    let overall = traces.iter().map(|t| t.similarity).sum::<f64>() / traces.len().max(1) as f64;

    PropagationAnalysis {
        total_experiments: experiments.len(),
        total_agents_reached: experiments.iter().map(|e| e.agents_reached.len()).sum(),
        personality_analysis,
        propagation_comparison: PropagationComparison {
            gossip_spreads_faster: gossip > stoic,
            gossip_to_stoic_ratio: round_to(gossip as f64 / stoic.max(1) as f64, 2),
        },
        information_fidelity: InformationFidelity {
            avg_similarity_overall: round_to(overall, 3),
        },
    }
}

pub fn render_report(experiments: &[PropagationExperiment]) -> String {
    let analysis = analyze(experiments);

    let mut report = format!(
        "# Information Propagation Analysis Report\n\n\
         ## Overview\n\
         - **Total Experiments**: {}\n\
         - **Total Agents Reached**: {}\n\n\
         ## Personality-Based Propagation\n\n\
         | Personality | Propagation Count | Avg Similarity | Mutation Rate |\n\
         |-------------|-------------------|----------------|---------------|\n",
        analysis.total_experiments, analysis.total_agents_reached
    );
    for (label, bucket) in [
        ("Gossip", PersonalityBucket::Gossip),
        ("Stoic", PersonalityBucket::Stoic),
        ("Neutral", PersonalityBucket::Neutral),
    ] {
        let stats = analysis.bucket(bucket);
        report.push_str(&format!(
            "| {label} | {} | {} | {} |\n",
            stats.count, stats.avg_similarity, stats.mutation_rate
        ));
    }

    let comparison = analysis.propagation_comparison;
    report.push_str(&format!(
        "\n## Key Findings\n\n\
         - **Gossip personalities spread information faster**: {}\n\
         - **Gossip-to-Stoic propagation ratio**: {}x\n\
         - **Overall information fidelity**: {}\n\n\
         ## Experiment Details\n",
        comparison.gossip_spreads_faster,
        comparison.gossip_to_stoic_ratio,
        analysis.information_fidelity.avg_similarity_overall
    ));

    for exp in experiments {
        report.push_str(&format!(
            "\n### Experiment: {}\n\
             - **Secret**: \"{}\"\n\
             - **Seed Agent**: {}\n\
             - **Turns**: {}\n\
             - **Agents Reached**: {}\n\
             - **Propagation Rate**: {:.3} agents/turn\n",
            exp.experiment_id,
            exp.secret,
            exp.seed_agent_name,
            exp.total_turns,
            exp.agents_reached.len(),
            exp.propagation_rate()
        ));
    }

    report
}
