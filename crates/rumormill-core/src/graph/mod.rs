pub mod state;
pub mod store;

pub use state::{GraphSnapshot, GraphState};
pub use store::{KnowledgeGraph, MemoryOptions};
