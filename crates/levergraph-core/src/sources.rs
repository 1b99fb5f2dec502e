// ABOUTME: File-backed implementations of the collaborator traits
// ABOUTME: Reads term catalogs and effect maps from JSON documents on disk

use crate::{
    HistoricalEffectSource, LeverageError, ModelEffectSource, Result, Term, TermCatalog,
    TermSource,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads `{"terms": [...], "relation_triples": [...]}` from a JSON file.
/// A bare JSON array of strings is accepted as a term list without relations.
#[derive(Debug, Clone)]
pub struct JsonTermSource {
    path: PathBuf,
}

impl JsonTermSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TermSource for JsonTermSource {
    fn load(&self) -> Result<TermCatalog> {
        let content = std::fs::read_to_string(&self.path)?;
        let value: serde_json::Value = serde_json::from_str(&content)?;
        let catalog = if value.is_array() {
            TermCatalog {
                terms: serde_json::from_value(value)?,
                relation_triples: Vec::new(),
            }
        } else {
            serde_json::from_value(value)?
        };
        debug!(
            "Loaded {} terms and {} relation triples from {}",
            catalog.terms.len(),
            catalog.relation_triples.len(),
            self.path.display()
        );
        Ok(catalog)
    }
}

/// Reads a flat `{"term": effect}` JSON object.
#[derive(Debug, Clone)]
pub struct JsonEffectSource {
    path: PathBuf,
}

impl JsonEffectSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read(&self) -> Result<HashMap<Term, f64>> {
        let content = std::fs::read_to_string(&self.path)?;
        let effects: HashMap<Term, f64> = serde_json::from_str(&content)?;
        if let Some((term, _)) = effects.iter().find(|(_, v)| !v.is_finite()) {
            return Err(LeverageError::InvalidInput(format!(
                "effect for '{}' is not a finite number",
                term
            )));
        }
        Ok(effects)
    }
}

impl ModelEffectSource for JsonEffectSource {
    fn model_effects(&self) -> Result<HashMap<Term, f64>> {
        self.read()
    }
}

impl HistoricalEffectSource for JsonEffectSource {
    fn historical_effects(&self) -> Result<HashMap<Term, f64>> {
        self.read()
    }
}
