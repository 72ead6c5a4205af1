use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SharedError {
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Tracing error: {0}")]
    TracingError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl From<std::io::Error> for SharedError {
    fn from(err: std::io::Error) -> Self {
        SharedError::InternalError(err.to_string())
    }
}
