/// Shared error type used across all StayWake crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid timer intent: {0}")]
    InvalidIntent(String),

    #[error("timer registration: {0}")]
    Registration(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
