use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeverageError {
    #[error("Insufficient terms: need at least {required}, got {actual}")]
    InsufficientTerms { required: usize, actual: usize },

    #[error("Target not found: {0}")]
    MissingTarget(String),

    #[error("Artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LeverageError {
    /// Stable snake_case name used in tool responses.
    pub fn kind(&self) -> &'static str {
        match self {
            LeverageError::InsufficientTerms { .. } => "insufficient_terms",
            LeverageError::MissingTarget(_) => "missing_target",
            LeverageError::ArtifactCorrupt(_) => "artifact_corrupt",
            LeverageError::InvalidInput(_) => "invalid_input",
            LeverageError::Embedding(_) => "embedding",
            LeverageError::Config(_) => "config",
            LeverageError::Internal(_) => "internal",
            LeverageError::Io(_) => "io",
            LeverageError::Serialization(_) => "serialization",
        }
    }
}

pub type Result<T> = std::result::Result<T, LeverageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        let err = LeverageError::InsufficientTerms {
            required: 2,
            actual: 1,
        };
        assert_eq!(err.kind(), "insufficient_terms");
        assert_eq!(
            err.to_string(),
            "Insufficient terms: need at least 2, got 1"
        );
        assert_eq!(
            LeverageError::MissingTarget("Revenue".into()).kind(),
            "missing_target"
        );
    }
}
