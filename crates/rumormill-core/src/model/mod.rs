pub mod edge;
pub mod node;
pub mod record;

pub use edge::{Edge, EdgeType};
pub use node::{
    agent_node_id, entity_id, is_memory_id, memory_node_id, truncate_chars, MemoryData, Node,
    NodeType, Properties, GLOBAL_AGENT,
};
pub use record::{GraphStats, MemoryRecord};
