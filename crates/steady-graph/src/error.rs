use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("failed to encode transform options: {0}")]
    Encode(#[from] serde_json::Error),
}
