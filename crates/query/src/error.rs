use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no relevant information found in the catalog")]
    EmptyRetrieval,

    #[error("generator failed: {0}")]
    GeneratorFailure(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl QueryError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration(reason.into())
    }
}
