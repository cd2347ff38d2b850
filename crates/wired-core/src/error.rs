use thiserror::Error;

/// Errors raised while building the decay subsystem.
///
/// The scheduler itself never surfaces errors at runtime; these only occur
/// when loading configuration or parsing transport metadata.
#[derive(Debug, Error)]
pub enum WiredError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WiredError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            WiredError::Config(_) => "CONFIG_ERROR",
            WiredError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, WiredError>;
