use anyhow::Result;

use rumormill_core::RumormillConfig;

use crate::output::OutputFormat;

pub fn run(config: &RumormillConfig, format: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let stats = mill.graph().stats();

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "data_dir": config.data_dir.display().to_string(),
                "extractor": mill.graph().extractor().name(),
                "total_nodes": stats.total_nodes,
                "total_edges": stats.total_edges,
                "node_types": stats.node_types,
                "edge_types": stats.edge_types,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            println!("Rumormill Statistics");
            println!("====================");
            println!("Data dir:  {}", config.data_dir.display());
            println!("Extractor: {}", mill.graph().extractor().name());
            println!("Nodes:     {}", stats.total_nodes);
            println!("Edges:     {}", stats.total_edges);
            if !stats.node_types.is_empty() {
                println!();
                println!("Node types:");
                for (kind, count) in &stats.node_types {
                    println!("  {kind:<10} {count}");
                }
            }
            if !stats.edge_types.is_empty() {
                println!();
                println!("Edge types:");
                for (kind, count) in &stats.edge_types {
                    println!("  {kind:<10} {count}");
                }
            }
        }
    }

    Ok(())
}
