pub mod settings;

pub use settings::{
    ExtractionConfig, ExtractionMode, PropagationConfig, ProviderConfig, RetrievalConfig,
    RumormillConfig,
};
