use crate::{Result, Term, TermCatalog};
use std::collections::HashMap;

/// Turns a term into a fixed-length vector. Implementations are synchronous
/// and must return vectors of `dimension()` length.
pub trait Embedder: Send + Sync {
    fn embed(&self, term: &str) -> Result<Vec<f32>>;

    /// Batch variant; providers backed by a remote model should override it.
    fn embed_batch(&self, terms: &[Term]) -> Result<Vec<Vec<f32>>> {
        terms.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;

    fn provider_name(&self) -> &str;
}

/// Ontology or domain-model loader.
pub trait TermSource {
    fn load(&self) -> Result<TermCatalog>;
}

/// External model coefficients used by targeted leverage.
pub trait ModelEffectSource {
    fn model_effects(&self) -> Result<HashMap<Term, f64>>;
}

/// Measured effects of past interventions, keyed by lever.
pub trait HistoricalEffectSource {
    fn historical_effects(&self) -> Result<HashMap<Term, f64>>;
}

impl ModelEffectSource for HashMap<Term, f64> {
    fn model_effects(&self) -> Result<HashMap<Term, f64>> {
        Ok(self.clone())
    }
}

impl HistoricalEffectSource for HashMap<Term, f64> {
    fn historical_effects(&self) -> Result<HashMap<Term, f64>> {
        Ok(self.clone())
    }
}
