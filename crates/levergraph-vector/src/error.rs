use thiserror::Error;

#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {0}, got {1}")]
    DimensionMismatch(usize, usize),

    #[error("Vector is empty")]
    EmptyVector,

    #[error("No embedding for term: {0}")]
    UnknownTerm(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Clustering error: {0}")]
    Clustering(String),
}

impl From<VectorError> for levergraph_core::LeverageError {
    fn from(err: VectorError) -> Self {
        levergraph_core::LeverageError::Embedding(err.to_string())
    }
}

pub type VectorResult<T> = std::result::Result<T, VectorError>;
