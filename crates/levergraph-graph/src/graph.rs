use crate::{SemanticEdge, SemanticNode};
use chrono::{DateTime, Utc};
use levergraph_core::{GraphSummary, LeverageError, Result, ScoreOutcome, Term};
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Neighbour lists indexed by node position, each sorted by neighbour position.
pub type Adjacency = Vec<Vec<(usize, f64)>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetadata {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub avg_degree: f64,
    pub n_clusters: usize,
    #[serde(default)]
    pub similarity_threshold: Option<f64>,
    #[serde(default)]
    pub centrality: ScoreOutcome,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub builder_version: Option<String>,
}

impl GraphMetadata {
    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            n_nodes: self.n_nodes,
            n_edges: self.n_edges,
            avg_degree: self.avg_degree,
            n_clusters: self.n_clusters,
        }
    }
}

/// Immutable weighted concept graph. Node positions follow term input order.
#[derive(Debug, Clone)]
pub struct SemanticGraph {
    graph: UnGraph<SemanticNode, SemanticEdge>,
    index: HashMap<Term, NodeIndex>,
    adjacency: Adjacency,
    metadata: GraphMetadata,
}

impl SemanticGraph {
    /// Freeze a petgraph graph. Structural metadata fields are recomputed;
    /// the provenance fields of `metadata` are kept.
    pub fn new(
        graph: UnGraph<SemanticNode, SemanticEdge>,
        mut metadata: GraphMetadata,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(graph.node_count());
        for idx in graph.node_indices() {
            let id = graph[idx].id.clone();
            if index.insert(id.clone(), idx).is_some() {
                return Err(LeverageError::InvalidInput(format!(
                    "duplicate node id: {}",
                    id
                )));
            }
        }

        let summary = summarize(&graph);
        metadata.n_nodes = summary.n_nodes;
        metadata.n_edges = summary.n_edges;
        metadata.avg_degree = summary.avg_degree;
        metadata.n_clusters = summary.n_clusters;

        let adjacency = adjacency_of(&graph);
        Ok(Self {
            graph,
            index,
            adjacency,
            metadata,
        })
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn summary(&self) -> GraphSummary {
        self.metadata.summary()
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|idx| idx.index())
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn node(&self, position: usize) -> &SemanticNode {
        &self.graph[NodeIndex::new(position)]
    }

    pub fn term(&self, position: usize) -> &Term {
        &self.node(position).id
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SemanticNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    pub fn terms(&self) -> Vec<Term> {
        self.nodes().map(|n| n.id.clone()).collect()
    }

    /// Edges in insertion order as `(source position, target position, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &SemanticEdge)> {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&SemanticEdge> {
        let (a, b) = (self.index.get(a)?, self.index.get(b)?);
        self.graph
            .find_edge(*a, *b)
            .map(|e| &self.graph[e])
    }

    /// Embeddings for every node, if all of them carry one.
    pub fn embeddings(&self) -> Option<Vec<Vec<f32>>> {
        self.nodes().map(|n| n.embedding.clone()).collect()
    }

    /// Map node positions to their terms.
    pub fn path_terms(&self, path: &[usize]) -> Vec<Term> {
        path.iter().map(|&p| self.term(p).clone()).collect()
    }
}

pub fn summarize(graph: &UnGraph<SemanticNode, SemanticEdge>) -> GraphSummary {
    let n_nodes = graph.node_count();
    let n_edges = graph.edge_count();
    let avg_degree = if n_nodes == 0 {
        0.0
    } else {
        2.0 * n_edges as f64 / n_nodes as f64
    };
    GraphSummary {
        n_nodes,
        n_edges,
        avg_degree,
        n_clusters: connected_components(graph),
    }
}

pub fn adjacency_of(graph: &UnGraph<SemanticNode, SemanticEdge>) -> Adjacency {
    graph
        .node_indices()
        .map(|idx| {
            let mut neighbours: Vec<(usize, f64)> = graph
                .edges(idx)
                .map(|e| {
                    let other = if e.source() == idx { e.target() } else { e.source() };
                    (other.index(), e.weight().weight)
                })
                .collect();
            neighbours.sort_by_key(|(n, _)| *n);
            neighbours
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> GraphMetadata {
        GraphMetadata {
            n_nodes: 0,
            n_edges: 0,
            avg_degree: 0.0,
            n_clusters: 0,
            similarity_threshold: Some(0.7),
            centrality: ScoreOutcome::Computed,
            created_at: None,
            builder_version: None,
        }
    }

    #[test]
    fn test_structure_recomputed_on_freeze() {
        let mut g = UnGraph::new_undirected();
        let a = g.add_node(SemanticNode::new("A".into()));
        let b = g.add_node(SemanticNode::new("B".into()));
        let c = g.add_node(SemanticNode::new("C".into()));
        g.add_node(SemanticNode::new("D".into()));
        g.add_edge(a, c, SemanticEdge::semantic(0.9));
        g.add_edge(a, b, SemanticEdge::semantic(0.8));

        let graph = SemanticGraph::new(g, metadata()).unwrap();
        let summary = graph.summary();
        assert_eq!(summary.n_nodes, 4);
        assert_eq!(summary.n_edges, 2);
        assert_eq!(summary.avg_degree, 1.0);
        assert_eq!(summary.n_clusters, 2);

        // neighbours sorted by position, not insertion order
        assert_eq!(graph.adjacency()[0], vec![(1, 0.8), (2, 0.9)]);
        assert_eq!(graph.index_of("C"), Some(2));
        assert_eq!(graph.edge("C", "A").unwrap().weight, 0.9);
        assert!(graph.edge("B", "C").is_none());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut g = UnGraph::new_undirected();
        g.add_node(SemanticNode::new("A".into()));
        g.add_node(SemanticNode::new("A".into()));
        assert!(SemanticGraph::new(g, metadata()).is_err());
    }
}
