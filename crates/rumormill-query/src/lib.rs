pub mod graph;
pub mod memory;
pub mod path;

pub use graph::{build_view, GraphView, ViewEdge, ViewNode};
pub use memory::{score_memory, FetchOptions, MemoryIndex};
pub use path::{ConnectedEntity, EntityContext, PathStep, RelationshipPathFinder, RelationshipRef};
