use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum DaoError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[source] BoxError),
}

impl DaoError {
    /// Wrap a driver error without altering it.
    pub fn storage(e: impl Into<BoxError>) -> Self {
        DaoError::Storage(e.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, DaoError::Configuration(_))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, DaoError::Mapping(_))
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, DaoError::Storage(_))
    }
}
