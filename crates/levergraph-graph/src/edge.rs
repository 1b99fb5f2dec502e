use levergraph_core::{RelationKind, Term, ACTIONABILITY_PLACEHOLDER};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticNode {
    pub id: Term,
    #[serde(default)]
    pub betweenness: f64,
    #[serde(default)]
    pub closeness: f64,
    #[serde(default = "placeholder")]
    pub actionable: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl SemanticNode {
    pub fn new(id: Term) -> Self {
        Self {
            id,
            betweenness: 0.0,
            closeness: 0.0,
            actionable: ACTIONABILITY_PLACEHOLDER,
            embedding: None,
        }
    }

    pub fn with_actionable(mut self, actionable: bool) -> Self {
        self.actionable = if actionable { 1.0 } else { 0.0 };
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// The stored flag, or `None` while it is still the placeholder.
    pub fn actionability(&self) -> Option<f64> {
        if self.actionable == 0.0 || self.actionable == 1.0 {
            Some(self.actionable)
        } else {
            None
        }
    }
}

fn placeholder() -> f64 {
    ACTIONABILITY_PLACEHOLDER
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SemanticEdge {
    pub weight: f64,
    pub relation_kind: RelationKind,
}

impl SemanticEdge {
    pub fn semantic(similarity: f64) -> Self {
        Self {
            weight: similarity,
            relation_kind: RelationKind::Semantic,
        }
    }

    pub fn textual(weight: f64) -> Self {
        Self {
            weight,
            relation_kind: RelationKind::Textual,
        }
    }

    /// Strengthen an edge with textual evidence; weight stays within (0, 1].
    pub fn boost(&mut self, multiplier: f64) {
        self.weight = (self.weight * multiplier).min(1.0);
        self.relation_kind = self.relation_kind.with_textual();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boost_caps_weight_and_marks_kind() {
        let mut edge = SemanticEdge::semantic(0.6);
        edge.boost(1.5);
        assert!((edge.weight - 0.9).abs() < 1e-12);
        assert_eq!(edge.relation_kind, RelationKind::SemanticTextual);

        let mut edge = SemanticEdge::semantic(0.9);
        edge.boost(1.5);
        assert_eq!(edge.weight, 1.0);
    }

    #[test]
    fn test_placeholder_actionability_is_unknown() {
        let node = SemanticNode::new("Budget".into());
        assert_eq!(node.actionability(), None);
        assert_eq!(node.clone().with_actionable(false).actionability(), Some(0.0));
        assert_eq!(node.with_actionable(true).actionability(), Some(1.0));
    }
}
