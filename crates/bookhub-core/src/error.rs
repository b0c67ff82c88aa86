use thiserror::Error;

/// All errors that can occur in bookhub-core.
#[derive(Debug, Error)]
pub enum BookhubError {
    #[error("malformed {provider} payload: {reason}")]
    PayloadShape { provider: String, reason: String },

    #[error("invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BookhubError {
    pub(crate) fn payload(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PayloadShape {
            provider: provider.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BookhubError>;
