use thiserror::Error;

#[derive(Error, Debug)]
pub enum OversightError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Duplicate edge id: {0}")]
    DuplicateEdgeId(String),
}

pub type Result<T> = std::result::Result<T, OversightError>;
