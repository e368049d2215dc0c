use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Generation request failed: {0}")]
    Generation(String),

    #[error("Generation timed out after {timeout_ms}ms")]
    GenerationTimeout { timeout_ms: u128 },

    #[error("Parse error: {0}")]
    Parse(String),
}
