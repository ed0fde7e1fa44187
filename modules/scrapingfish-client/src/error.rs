use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapingFishError>;

#[derive(Debug, Error)]
pub enum ScrapingFishError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid JSON in response: {0}")]
    Json(String),
}

impl From<reqwest::Error> for ScrapingFishError {
    fn from(err: reqwest::Error) -> Self {
        ScrapingFishError::Network(err.to_string())
    }
}
