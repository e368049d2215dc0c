use rumormill_core::model::MemoryRecord;
use rumormill_propagation::{Detection, ExperimentSummary, PersonalityBucket, PropagationAnalysis};
use rumormill_query::{EntityContext, PathStep};

use super::OutputFormat;

pub fn format_memories(memories: &[MemoryRecord], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(memories).unwrap_or_default(),
        OutputFormat::Text => format_memories_text(memories),
        OutputFormat::Markdown => format_memories_markdown(memories),
    }
}

fn format_memories_text(memories: &[MemoryRecord]) -> String {
    if memories.is_empty() {
        return "No memories found.".to_string();
    }

    let mut out = String::new();
    for m in memories {
        out.push_str(&format!("[{:.2}] {}\n", m.score, m.text));
        if !m.path_context.is_empty() {
            out.push_str(&format!("       {}\n", m.path_context));
        }
    }
    out
}

fn format_memories_markdown(memories: &[MemoryRecord]) -> String {
    if memories.is_empty() {
        return "_No memories found._".to_string();
    }

    let mut out = String::new();
    for m in memories {
        out.push_str(&format!("- **{:.2}** {}", m.score, m.text));
        if !m.path_context.is_empty() {
            out.push_str(&format!(" _({})_", m.path_context));
        }
        out.push('\n');
    }
    out
}

pub fn format_entity_context(context: Option<&EntityContext>, fmt: OutputFormat) -> String {
    if let OutputFormat::Json = fmt {
        return serde_json::to_string_pretty(&context).unwrap_or_default();
    }
    let Some(context) = context else {
        return "Entity not found.".to_string();
    };

    let entity = &context.entity;
    let mut out = String::new();
    out.push_str(&format!("Entity: {} ({})\n", entity.name, entity.id));
    out.push_str(&format!("Type:   {}\n", entity.node_type));

    if !context.relationships.is_empty() {
        out.push_str("\nRelationships:\n");
        for rel in &context.relationships {
            out.push_str(&format!(
                "  --[{}]--> {} ({})\n",
                rel.edge_type, rel.target_name, rel.target
            ));
        }
    }

    if !context.connected_entities.is_empty() {
        out.push_str("\nConnected:\n");
        for c in &context.connected_entities {
            out.push_str(&format!(
                "  {} [{}] {} - distance {}\n",
                c.id, c.node_type, c.name, c.distance
            ));
        }
    }
    out
}

pub fn format_path(steps: &[PathStep], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(steps).unwrap_or_default(),
        OutputFormat::Text | OutputFormat::Markdown => {
            let Some(first) = steps.first() else {
                return "No path found.".to_string();
            };
            let mut out = first.source.clone();
            for step in steps {
                out.push_str(&format!(" --[{}]--> {}", step.edge_type, step.target));
            }
            out
        }
    }
}

pub fn format_experiment_list(experiments: &[ExperimentSummary], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(experiments).unwrap_or_default(),
        OutputFormat::Text => format_experiment_list_text(experiments),
        OutputFormat::Markdown => format_experiment_list_markdown(experiments),
    }
}

fn format_experiment_list_text(experiments: &[ExperimentSummary]) -> String {
    if experiments.is_empty() {
        return "No experiments found.".to_string();
    }

    let mut out = String::new();
    for e in experiments {
        out.push_str(&format!(
            "\u{25c6} {} seeded in {} - {} agents over {} turns  {}\n",
            e.experiment_id,
            e.seed_agent.name,
            e.agents_reached.len(),
            e.total_turns,
            e.start_time.format("%Y-%m-%d %H:%M")
        ));
    }
    out
}

fn format_experiment_list_markdown(experiments: &[ExperimentSummary]) -> String {
    let mut out = String::from("| Experiment | Seed | Agents | Turns | Rate |\n");
    out.push_str("|------------|------|--------|-------|------|\n");
    for e in experiments {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {:.3} |\n",
            e.experiment_id,
            e.seed_agent.name,
            e.agents_reached.len(),
            e.total_turns,
            e.propagation_rate
        ));
    }
    out
}

pub fn format_experiment(summary: &ExperimentSummary, fmt: OutputFormat) -> String {
    if let OutputFormat::Json = fmt {
        return serde_json::to_string_pretty(summary).unwrap_or_default();
    }

    let mut out = String::new();
    out.push_str(&format!("Experiment: {}\n", summary.experiment_id));
    out.push_str(&format!("Secret:     {}\n", summary.secret));
    out.push_str(&format!(
        "Seed:       {} ({})\n",
        summary.seed_agent.name, summary.seed_agent.id
    ));
    out.push_str(&format!(
        "Started:    {}\n",
        summary.start_time.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "Reached:    {} agents over {} turns ({:.3} agents/turn)\n",
        summary.agents_reached.len(),
        summary.total_turns,
        summary.propagation_rate
    ));

    if !summary.traces.is_empty() {
        out.push_str("\nTraces:\n");
        for t in &summary.traces {
            out.push_str(&format!(
                "  turn {:>3}  {} [{}] {:.2}  {}\n",
                t.turn_number, t.agent_name, t.personality, t.similarity, t.mutation_descriptor
            ));
        }
    }
    out
}

pub fn format_detections(detections: &[Detection], fmt: OutputFormat) -> String {
    match fmt {
        OutputFormat::Json => serde_json::to_string_pretty(detections).unwrap_or_default(),
        OutputFormat::Text | OutputFormat::Markdown => {
            if detections.is_empty() {
                return "No secrets detected.".to_string();
            }
            let mut out = String::new();
            for d in detections {
                out.push_str(&format!(
                    "{}: {} ({}) similarity {:.2}, {}\n",
                    d.experiment_id,
                    d.trace.agent_name,
                    d.trace.personality,
                    d.trace.similarity,
                    d.trace.mutation_descriptor
                ));
            }
            out
        }
    }
}

pub fn format_analysis(analysis: &PropagationAnalysis, fmt: OutputFormat) -> String {
    if let OutputFormat::Json = fmt {
        return serde_json::to_string_pretty(analysis).unwrap_or_default();
    }

    let mut out = String::new();
    out.push_str("Propagation Analysis\n");
    out.push_str("====================\n");
    out.push_str(&format!("Experiments:    {}\n", analysis.total_experiments));
    out.push_str(&format!("Agents reached: {}\n", analysis.total_agents_reached));
    out.push_str(&format!(
        "Avg similarity: {:.3}\n",
        analysis.information_fidelity.avg_similarity_overall
    ));
    out.push('\n');
    for bucket in PersonalityBucket::ALL {
        let stats = analysis.bucket(bucket);
        out.push_str(&format!(
            "  {:<8} {:>4} transmissions  similarity {:.2}  mutation {:.2}\n",
            bucket.as_str(),
            stats.count,
            stats.avg_similarity,
            stats.mutation_rate
        ));
    }
    let cmp = &analysis.propagation_comparison;
    out.push('\n');
    out.push_str(&format!(
        "Gossip spreads faster: {} (ratio {:.1})\n",
        cmp.gossip_spreads_faster, cmp.gossip_to_stoic_ratio
    ));
    out
}
