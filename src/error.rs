use thiserror::Error;

#[derive(Error, Debug)]
pub enum BearError {
    #[error("Invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("Bear database unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Bear database schema mismatch: {0}")]
    StoreSchema(String),

    #[error("Failed to dispatch Bear command: {0}")]
    Dispatch(String),

    #[error("MCP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BearError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        BearError::InvalidInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for BearError {
    fn from(e: rusqlite::Error) -> Self {
        BearError::StoreUnavailable(format!("SQLite error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, BearError>;
