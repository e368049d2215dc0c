use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdkError {
    #[error("Dialogue provider failed: {0}")]
    Provider(String),
}
