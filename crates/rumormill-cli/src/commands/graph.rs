use anyhow::Result;
use clap::Args;

use rumormill_core::RumormillConfig;
use rumormill_query::build_view;

use crate::output::OutputFormat;

#[derive(Args)]
pub struct GraphArgs {
    /// Center node (e.g. "npc:guard" or "location:vault")
    pub node: Option<String>,

    /// Traversal depth from center node
    #[arg(long, default_value = "2")]
    pub depth: usize,

    /// Output DOT format for Graphviz
    #[arg(long)]
    pub dot: bool,
}

pub fn run(args: &GraphArgs, config: &RumormillConfig, format: OutputFormat) -> Result<()> {
    let mill = super::open(config);
    let full = build_view(mill.graph());

    let view = match &args.node {
        Some(center) => full.subgraph(center, args.depth),
        None => full,
    };

    if args.dot {
        print!("{}", view.to_dot());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            println!(
                "Knowledge graph: {} nodes, {} edges",
                view.nodes.len(),
                view.edges.len()
            );
            println!();
            for node in &view.nodes {
                println!("  [{}] {} - {}", node.node_type, node.id, node.label);
            }
            if !view.edges.is_empty() {
                println!();
                for edge in &view.edges {
                    println!("  {} --[{}]--> {}", edge.from, edge.edge_type, edge.to);
                }
            }
            println!();
            println!("Use --dot to output Graphviz format");
        }
    }

    Ok(())
}
