use crate::{LeverageError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A named domain concept. Case-sensitive and unique within a graph.
pub type Term = String;

/// Placeholder stored on nodes before an actionability scorer has run.
pub const ACTIONABILITY_PLACEHOLDER: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[serde(rename = "semantic")]
    Semantic,
    #[serde(rename = "textual")]
    Textual,
    #[serde(rename = "semantic+textual")]
    SemanticTextual,
}

impl RelationKind {
    /// Kind after textual evidence has been found for an existing edge.
    pub fn with_textual(self) -> Self {
        match self {
            RelationKind::Semantic | RelationKind::SemanticTextual => RelationKind::SemanticTextual,
            RelationKind::Textual => RelationKind::Textual,
        }
    }
}

impl Default for RelationKind {
    fn default() -> Self {
        RelationKind::Semantic
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationKind::Semantic => "semantic",
            RelationKind::Textual => "textual",
            RelationKind::SemanticTextual => "semantic+textual",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "semantic" => Ok(RelationKind::Semantic),
            "textual" => Ok(RelationKind::Textual),
            "semantic+textual" => Ok(RelationKind::SemanticTextual),
            other => Err(format!("unknown relation kind: {}", other)),
        }
    }
}

/// Family of relation marker a piece of textual evidence matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCategory {
    Causal,
    Dependency,
    Precedence,
    /// Supplied explicitly by the term source.
    Declared,
}

/// `(subject, predicate, object)` as supplied by an ontology loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationTriple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

impl RelationTriple {
    pub fn new(
        subject: impl Into<Term>,
        predicate: impl Into<String>,
        object: impl Into<Term>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Terms and optional relations returned by a [`crate::TermSource`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermCatalog {
    pub terms: Vec<Term>,
    #[serde(default)]
    pub relation_triples: Vec<RelationTriple>,
}

/// Rejects empty terms and drops duplicates, keeping the first occurrence.
pub fn normalize_terms(terms: &[Term]) -> Result<Vec<Term>> {
    let mut seen = HashSet::with_capacity(terms.len());
    let mut out = Vec::with_capacity(terms.len());
    for term in terms {
        if term.trim().is_empty() {
            return Err(LeverageError::InvalidInput(
                "terms must be non-empty strings".to_string(),
            ));
        }
        if seen.insert(term.as_str()) {
            out.push(term.clone());
        }
    }
    Ok(out)
}

/// Summary statistics emitted by a graph build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSummary {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub avg_degree: f64,
    pub n_clusters: usize,
}

/// Per-term factors of the global (non-targeted) leverage formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub term: Term,
    pub actionability: f64,
    pub sensitivity: f64,
    pub uncertainty: f64,
    pub centrality: f64,
    pub total: f64,
}

impl FactorScore {
    pub fn new(
        term: Term,
        actionability: f64,
        sensitivity: f64,
        uncertainty: f64,
        centrality: f64,
    ) -> Self {
        let total = actionability * (sensitivity + uncertainty + centrality);
        Self {
            term,
            actionability,
            sensitivity,
            uncertainty,
            centrality,
            total,
        }
    }
}

/// Leverage of a term relative to one specific target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetedLeverageScore {
    pub term: Term,
    #[serde(rename = "betweenness_T")]
    pub targeted_betweenness: f64,
    pub path_strength: f64,
    pub actionability: f64,
    pub model_effect: f64,
    pub total: f64,
    pub strongest_path: Vec<Term>,
}

/// A generated A/B experiment plan for a lever/target pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSpec {
    pub lever: Term,
    pub target: Term,
    pub path: Vec<Term>,
    pub path_weight: f64,
    pub path_length: usize,
    pub action: String,
    pub expected_lift: f64,
    pub sample_size: u32,
    pub duration_bucket: String,
    pub primary_kpi: Term,
    pub intermediate_kpis: Vec<Term>,
    pub guardrails: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_kind_round_trips_through_display() {
        for kind in [
            RelationKind::Semantic,
            RelationKind::Textual,
            RelationKind::SemanticTextual,
        ] {
            assert_eq!(kind.to_string().parse::<RelationKind>().unwrap(), kind);
        }
        assert!("friendship".parse::<RelationKind>().is_err());
    }

    #[test]
    fn test_textual_evidence_upgrades_semantic_edges() {
        assert_eq!(
            RelationKind::Semantic.with_textual(),
            RelationKind::SemanticTextual
        );
        assert_eq!(RelationKind::Textual.with_textual(), RelationKind::Textual);
    }

    #[test]
    fn test_normalize_terms_dedupes_in_order() {
        let terms = vec![
            "Sales".to_string(),
            "Revenue".to_string(),
            "Sales".to_string(),
            "sales".to_string(),
        ];
        let out = normalize_terms(&terms).unwrap();
        assert_eq!(out, vec!["Sales", "Revenue", "sales"]);
    }

    #[test]
    fn test_normalize_terms_rejects_blank() {
        let terms = vec!["Sales".to_string(), "  ".to_string()];
        assert!(matches!(
            normalize_terms(&terms),
            Err(LeverageError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_factor_total_is_gated_by_actionability() {
        let score = FactorScore::new("Budget".into(), 0.0, 0.9, 0.4, 1.0);
        assert_eq!(score.total, 0.0);
        let score = FactorScore::new("Budget".into(), 1.0, 0.5, 0.25, 0.25);
        assert_eq!(score.total, 1.0);
    }

    #[test]
    fn test_targeted_score_uses_wire_name() {
        let score = TargetedLeverageScore {
            term: "Budget".into(),
            targeted_betweenness: 0.5,
            path_strength: 0.8,
            actionability: 1.0,
            model_effect: 1.0,
            total: 0.4,
            strongest_path: vec!["Budget".into(), "Revenue".into()],
        };
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["betweenness_T"], 0.5);
    }
}
