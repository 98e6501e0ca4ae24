use thiserror::Error;

pub type TrackingResult<T> = Result<T, TrackingError>;

#[derive(Error, Debug)]
pub enum TrackingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template error in '{template}': {message}")]
    Template { template: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<config::ConfigError> for TrackingError {
    fn from(err: config::ConfigError) -> Self {
        TrackingError::Config(err.to_string())
    }
}
