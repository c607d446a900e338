use thiserror::Error;

pub type Result<T> = std::result::Result<T, HumbleError>;

#[derive(Debug, Error)]
pub enum HumbleError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for HumbleError {
    fn from(err: reqwest::Error) -> Self {
        HumbleError::Network(err.to_string())
    }
}
