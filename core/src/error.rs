use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenError {
    #[error("Configuration list '{name}' is empty")]
    EmptyList { name: &'static str },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Degenerate input: {0}")]
    Degenerate(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type GenResult<T> = Result<T, GenError>;
