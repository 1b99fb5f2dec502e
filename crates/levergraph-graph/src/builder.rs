use crate::{
    adjacency_of, compute_centrality, declared_evidence, GraphMetadata, RelationEvidence,
    RelationExtractor, SemanticEdge, SemanticGraph, SemanticNode,
};
use chrono::Utc;
use levergraph_core::{
    normalize_terms, Embedder, GraphConfig, LeverageError, RelationTriple, Result, Term,
};
use levergraph_vector::{common_dimension, similar_pairs};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

pub const MIN_TERMS: usize = 2;
pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Inputs of a single graph build.
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub terms: Vec<Term>,
    /// Falls back to the configured threshold.
    pub similarity_threshold: Option<f64>,
    pub corpus: Option<String>,
    pub relation_triples: Vec<RelationTriple>,
    /// When set, nodes carry a 1/0 actionability flag instead of the placeholder.
    pub actionable_terms: Option<Vec<Term>>,
}

impl BuildRequest {
    pub fn new(terms: Vec<Term>) -> Self {
        Self {
            terms,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = Some(threshold);
        self
    }

    pub fn with_corpus(mut self, corpus: impl Into<String>) -> Self {
        self.corpus = Some(corpus.into());
        self
    }

    pub fn with_relation_triples(mut self, triples: Vec<RelationTriple>) -> Self {
        self.relation_triples = triples;
        self
    }

    pub fn with_actionable_terms(mut self, terms: Vec<Term>) -> Self {
        self.actionable_terms = Some(terms);
        self
    }
}

/// Builds a [`SemanticGraph`] from terms, their embeddings and optional
/// textual evidence.
pub struct GraphBuilder {
    embedder: Arc<dyn Embedder>,
    config: GraphConfig,
}

impl GraphBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, config: GraphConfig) -> Self {
        Self { embedder, config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn build(&self, request: &BuildRequest) -> Result<SemanticGraph> {
        let terms = normalize_terms(&request.terms)?;
        if terms.len() < MIN_TERMS {
            return Err(LeverageError::InsufficientTerms {
                required: MIN_TERMS,
                actual: terms.len(),
            });
        }

        let threshold = request
            .similarity_threshold
            .unwrap_or(self.config.similarity_threshold);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(LeverageError::InvalidInput(format!(
                "similarity_threshold must be within [0, 1], got {}",
                threshold
            )));
        }

        info!(
            "Building semantic graph: {} terms, threshold {}, provider {}",
            terms.len(),
            threshold,
            self.embedder.provider_name()
        );

        let vectors = self.embedder.embed_batch(&terms)?;
        if vectors.len() != terms.len() {
            return Err(LeverageError::Embedding(format!(
                "embedder returned {} vectors for {} terms",
                vectors.len(),
                terms.len()
            )));
        }
        let dimension = common_dimension(&vectors)?;
        debug!("Embedded {} terms at dimension {}", terms.len(), dimension);

        let actionable: Option<HashSet<&str>> = request
            .actionable_terms
            .as_ref()
            .map(|set| set.iter().map(String::as_str).collect());

        let mut graph: UnGraph<SemanticNode, SemanticEdge> =
            UnGraph::with_capacity(terms.len(), terms.len());
        for (term, vector) in terms.iter().zip(vectors.iter()) {
            let mut node = SemanticNode::new(term.clone());
            if let Some(set) = &actionable {
                node = node.with_actionable(set.contains(term.as_str()));
            }
            if self.config.persist_embeddings {
                node = node.with_embedding(vector.clone());
            }
            graph.add_node(node);
        }

        for (i, j, similarity) in similar_pairs(&vectors, threshold)? {
            graph.add_edge(
                NodeIndex::new(i),
                NodeIndex::new(j),
                SemanticEdge::semantic(similarity),
            );
        }
        let semantic_edges = graph.edge_count();

        let evidence = self.collect_evidence(&terms, request)?;
        let boosted = self.apply_evidence(&mut graph, &evidence);

        let centrality = compute_centrality(&adjacency_of(&graph));
        let outcome = centrality.outcome();
        let scores = centrality.into_value();
        for idx in graph.node_indices() {
            let node = &mut graph[idx];
            node.betweenness = scores.betweenness[idx.index()];
            node.closeness = scores.closeness[idx.index()];
        }

        let metadata = GraphMetadata {
            n_nodes: 0,
            n_edges: 0,
            avg_degree: 0.0,
            n_clusters: 0,
            similarity_threshold: Some(threshold),
            centrality: outcome,
            created_at: Some(Utc::now()),
            builder_version: Some(BUILDER_VERSION.to_string()),
        };
        let graph = SemanticGraph::new(graph, metadata)?;

        let summary = graph.summary();
        info!(
            "Built semantic graph: {} nodes, {} edges ({} semantic, {} textual evidence), {} clusters",
            summary.n_nodes,
            summary.n_edges,
            semantic_edges,
            boosted,
            summary.n_clusters
        );
        Ok(graph)
    }

    fn collect_evidence(
        &self,
        terms: &[Term],
        request: &BuildRequest,
    ) -> Result<Vec<RelationEvidence>> {
        let mut evidence = Vec::new();

        if let Some(corpus) = request.corpus.as_deref().filter(|c| !c.trim().is_empty()) {
            evidence.extend(RelationExtractor::new(terms)?.extract(corpus));
        }

        if !request.relation_triples.is_empty() {
            let positions: HashMap<Term, usize> = terms
                .iter()
                .enumerate()
                .map(|(i, t)| (t.clone(), i))
                .collect();
            evidence.extend(declared_evidence(&positions, &request.relation_triples));
        }

        Ok(evidence)
    }

    /// Each unordered pair is applied once. Returns the number of pairs applied.
    fn apply_evidence(
        &self,
        graph: &mut UnGraph<SemanticNode, SemanticEdge>,
        evidence: &[RelationEvidence],
    ) -> usize {
        let mut applied = HashSet::new();
        for item in evidence {
            let (a, b) = item.pair();
            if !applied.insert((a, b)) {
                continue;
            }
            let (a, b) = (NodeIndex::new(a), NodeIndex::new(b));
            match graph.find_edge(a, b) {
                Some(edge) => {
                    graph[edge].boost(self.config.textual_boost);
                    debug!(
                        "Boosted {} - {} ({:?} '{}')",
                        graph[a].id, graph[b].id, item.category, item.marker
                    );
                }
                None => {
                    graph.add_edge(a, b, SemanticEdge::textual(self.config.textual_default_weight));
                    debug!(
                        "Added textual edge {} - {} ({:?} '{}')",
                        graph[a].id, graph[b].id, item.category, item.marker
                    );
                }
            }
        }
        applied.len()
    }
}
