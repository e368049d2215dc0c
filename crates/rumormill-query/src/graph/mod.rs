pub mod builder;
pub mod model;

pub use builder::build_view;
pub use model::{GraphView, ViewEdge, ViewNode};
