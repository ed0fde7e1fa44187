use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResendError>;

#[derive(Debug, Error)]
pub enum ResendError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl From<reqwest::Error> for ResendError {
    fn from(err: reqwest::Error) -> Self {
        ResendError::Network(err.to_string())
    }
}
