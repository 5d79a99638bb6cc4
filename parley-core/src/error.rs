use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid signaling frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid chunk frame: {0}")]
    Frame(#[from] postcard::Error),
}
