/// Persistence failures from any backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
