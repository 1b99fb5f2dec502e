// ABOUTME: JSON schemas for the leverage tools
// ABOUTME: Parameter definitions and descriptions for tool callers and agents

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

/// Tool schema for function calling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: JsonValue,
}

pub const BUILD_SEMANTIC_GRAPH: &str = "build_semantic_graph";
pub const COMPUTE_TARGET_LEVERAGE: &str = "compute_target_leverage";
pub const RECOMMEND_INTERVENTIONS: &str = "recommend_interventions";
pub const RANK_GLOBAL_LEVERAGE: &str = "rank_global_leverage";

/// Collection of all leverage tool schemas
pub struct LeverageToolSchemas;

impl LeverageToolSchemas {
    pub fn all() -> Vec<ToolSchema> {
        vec![
            Self::build_semantic_graph(),
            Self::compute_target_leverage(),
            Self::recommend_interventions(),
            Self::rank_global_leverage(),
        ]
    }

    pub fn get_by_name(name: &str) -> Option<ToolSchema> {
        Self::all().into_iter().find(|s| s.name == name)
    }

    pub fn build_semantic_graph() -> ToolSchema {
        ToolSchema {
            name: BUILD_SEMANTIC_GRAPH.to_string(),
            description: "Build a weighted concept graph from domain terms. \
                Terms are linked when their embeddings are similar, and links are strengthened \
                or added when a corpus states a causal, dependency or precedence relation. \
                The graph is saved as an artifact for the other tools."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "terms": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Domain terms (at least 2). Optional when terms_path is given"
                    },
                    "terms_path": {
                        "type": "string",
                        "description": "JSON file with a term list or {terms, relation_triples}"
                    },
                    "similarity_threshold": {
                        "type": "number",
                        "description": "Minimum cosine similarity for an edge",
                        "minimum": 0.0,
                        "maximum": 1.0,
                        "default": 0.7
                    },
                    "corpus": {
                        "type": "string",
                        "description": "Free text scanned for relation statements between terms"
                    },
                    "actionable_terms": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Terms the caller can intervene on directly"
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Artifact path, or a bare name stored under the artifact directory"
                    }
                },
                "required": ["output_path"]
            }),
        }
    }

    pub fn compute_target_leverage() -> ToolSchema {
        ToolSchema {
            name: COMPUTE_TARGET_LEVERAGE.to_string(),
            description: "Rank the terms of a saved graph by their leverage over one target KPI. \
                Combines how often a term sits on shortest paths to the target, the strength of \
                all short paths to it, actionability and optional model effects."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "graph_path": {
                        "type": "string",
                        "description": "Artifact produced by build_semantic_graph"
                    },
                    "target": {
                        "type": "string",
                        "description": "Target KPI term"
                    },
                    "model_effect_map": {
                        "type": "object",
                        "additionalProperties": {"type": "number"},
                        "description": "Model coefficient per term; magnitude is used"
                    },
                    "model_effects_path": {
                        "type": "string",
                        "description": "JSON file with model coefficients, used when no map is given"
                    },
                    "actionable_terms": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "top_k": {
                        "type": "integer",
                        "description": "Number of levers to return",
                        "minimum": 1,
                        "default": 5
                    }
                },
                "required": ["graph_path", "target"]
            }),
        }
    }

    pub fn recommend_interventions() -> ToolSchema {
        ToolSchema {
            name: RECOMMEND_INTERVENTIONS.to_string(),
            description: "Design A/B experiments for moving a target KPI through a lever. \
                Uses the heaviest short paths between them to size the expected lift, \
                sample size and duration, and attaches guardrail metrics."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "graph_path": {"type": "string"},
                    "lever": {
                        "type": "string",
                        "description": "Term to intervene on"
                    },
                    "target": {
                        "type": "string",
                        "description": "Target KPI term"
                    },
                    "historical_effects": {
                        "type": "object",
                        "additionalProperties": {"type": "number"},
                        "description": "Measured effects of past interventions per lever"
                    },
                    "historical_effects_path": {"type": "string"},
                    "top_paths": {
                        "type": "integer",
                        "minimum": 1,
                        "default": 3
                    }
                },
                "required": ["graph_path", "lever", "target"]
            }),
        }
    }

    pub fn rank_global_leverage() -> ToolSchema {
        ToolSchema {
            name: RANK_GLOBAL_LEVERAGE.to_string(),
            description: "Rank every term of a saved graph by actionability times the sum of \
                sensitivity to the KPI, embedding-cluster uncertainty and centrality."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "graph_path": {"type": "string"},
                    "kpi": {
                        "type": "string",
                        "description": "KPI term the sensitivity factor is measured against"
                    },
                    "actionable_terms": {
                        "type": "array",
                        "items": {"type": "string"}
                    }
                },
                "required": ["graph_path", "kpi"]
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_schemas_are_objects_with_required_fields() {
        let schemas = LeverageToolSchemas::all();
        assert_eq!(schemas.len(), 4);
        for schema in schemas {
            assert_eq!(schema.parameters["type"], "object");
            assert!(schema.parameters["required"].is_array());
            assert!(LeverageToolSchemas::get_by_name(&schema.name).is_some());
        }
        assert!(LeverageToolSchemas::get_by_name("plot_embeddings").is_none());
    }
}
