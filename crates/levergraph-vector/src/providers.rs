use crate::VectorError;
use levergraph_core::{EmbeddingConfig, Embedder, LeverageError, Result, Term};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Serves vectors supplied by the caller, e.g. precomputed by an external model.
#[derive(Debug, Clone)]
pub struct StaticEmbedder {
    vectors: HashMap<Term, Vec<f32>>,
    dimension: usize,
}

impl StaticEmbedder {
    pub fn new(vectors: HashMap<Term, Vec<f32>>) -> Result<Self> {
        let dimension = vectors.values().next().map(|v| v.len()).unwrap_or(0);
        if let Some((term, v)) = vectors.iter().find(|(_, v)| v.len() != dimension) {
            return Err(VectorError::Embedding(format!(
                "vector for '{}' has dimension {}, expected {}",
                term,
                v.len(),
                dimension
            ))
            .into());
        }
        Ok(Self { vectors, dimension })
    }

    pub fn from_pairs<I, T>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, Vec<f32>)>,
        T: Into<Term>,
    {
        Self::new(pairs.into_iter().map(|(t, v)| (t.into(), v)).collect())
    }

    /// Load a `{"term": [f32, ...]}` JSON document.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vectors: HashMap<Term, Vec<f32>> = serde_json::from_str(&content)?;
        info!(
            "Loaded {} static embeddings from {}",
            vectors.len(),
            path.display()
        );
        Self::new(vectors)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

impl Embedder for StaticEmbedder {
    fn embed(&self, term: &str) -> Result<Vec<f32>> {
        self.vectors
            .get(term)
            .cloned()
            .ok_or_else(|| VectorError::UnknownTerm(term.to_string()).into())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "static"
    }
}

/// Deterministic feature-hashing embedder over character trigrams and words.
///
/// Carries lexical, not semantic, similarity. Useful when no model is wired
/// in and for reproducible fixtures.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn add_feature(&self, embedding: &mut [f32], feature: &str, weight: f32) {
        let digest = Sha256::digest(feature.as_bytes());
        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        embedding[bucket] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, term: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dimension];
        let normalized = term.to_lowercase();

        for word in normalized.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            self.add_feature(&mut embedding, &format!("w:{}", word), 2.0);

            let padded: Vec<char> = format!("#{}#", word).chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut embedding, &format!("g:{}", gram), 1.0);
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }
}

/// Build the embedder named by the configuration.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "hashing" => {
            warn!("Using hashing embeddings: similarity reflects spelling, not meaning");
            Ok(Arc::new(HashingEmbedder::new(config.dimension)))
        }
        "static" => {
            let path = config.vectors_path.as_ref().ok_or_else(|| {
                LeverageError::Config("static embedding provider requires vectors_path".into())
            })?;
            Ok(Arc::new(StaticEmbedder::from_json_file(path)?))
        }
        other => Err(LeverageError::Config(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosine_similarity;

    #[test]
    fn test_static_embedder_unknown_term() {
        let embedder = StaticEmbedder::from_pairs(vec![("Revenue", vec![1.0, 0.0])]).unwrap();
        assert_eq!(embedder.embed("Revenue").unwrap(), vec![1.0, 0.0]);
        assert!(matches!(
            embedder.embed("Churn"),
            Err(LeverageError::Embedding(_))
        ));
    }

    #[test]
    fn test_static_embedder_rejects_ragged_vectors() {
        let result = StaticEmbedder::from_pairs(vec![
            ("Revenue", vec![1.0, 0.0]),
            ("Budget", vec![1.0]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_hashing_embedder_is_deterministic_and_unit_length() {
        let embedder = HashingEmbedder::new(64);
        let a = embedder.embed("Marketing Budget").unwrap();
        let b = embedder.embed("Marketing Budget").unwrap();
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hashing_embedder_reflects_shared_words() {
        let embedder = HashingEmbedder::new(256);
        let budget = embedder.embed("marketing budget").unwrap();
        let spend = embedder.embed("marketing spend").unwrap();
        let churn = embedder.embed("churn").unwrap();
        let related = cosine_similarity(&budget, &spend).unwrap();
        let unrelated = cosine_similarity(&budget, &churn).unwrap();
        assert!(related > unrelated);
    }

    #[test]
    fn test_create_embedder_from_config() {
        let config = EmbeddingConfig::default();
        let embedder = create_embedder(&config).unwrap();
        assert_eq!(embedder.provider_name(), "hashing");
        assert_eq!(embedder.dimension(), 256);
    }
}
