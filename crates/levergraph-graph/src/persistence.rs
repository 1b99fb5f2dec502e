// ABOUTME: JSON artifact format for semantic graphs with versioned, validated loading
// ABOUTME: Writes go through a sibling temp file and an atomic rename

use crate::{GraphMetadata, SemanticEdge, SemanticGraph, SemanticNode};
use levergraph_core::{LeverageError, RelationKind, Result, ScoreOutcome, Term};
use petgraph::graph::{NodeIndex, UnGraph};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Current artifact layout. Version 0 is the unversioned legacy layout.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEdge {
    pub source: Term,
    pub target: Term,
    pub weight: f64,
    #[serde(default)]
    pub relation_kind: RelationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphArtifact {
    #[serde(default)]
    pub version: u32,
    pub nodes: Vec<SemanticNode>,
    #[serde(alias = "links")]
    pub edges: Vec<ArtifactEdge>,
    #[serde(default)]
    pub metadata: Option<GraphMetadata>,
}

impl GraphArtifact {
    pub fn from_graph(graph: &SemanticGraph) -> Self {
        let edges = graph
            .edges()
            .map(|(a, b, edge)| ArtifactEdge {
                source: graph.term(a).clone(),
                target: graph.term(b).clone(),
                weight: edge.weight,
                relation_kind: edge.relation_kind,
            })
            .collect();

        Self {
            version: ARTIFACT_VERSION,
            nodes: graph.nodes().cloned().collect(),
            edges,
            metadata: Some(graph.metadata().clone()),
        }
    }

    /// Validate and freeze into a graph. Every failure is `ArtifactCorrupt`.
    pub fn into_graph(self) -> Result<SemanticGraph> {
        if self.version > ARTIFACT_VERSION {
            return Err(corrupt(format!(
                "unsupported artifact version {} (newest known is {})",
                self.version, ARTIFACT_VERSION
            )));
        }
        if self.version == 0 {
            debug!("Migrating legacy unversioned artifact");
        }

        let mut graph: UnGraph<SemanticNode, SemanticEdge> =
            UnGraph::with_capacity(self.nodes.len(), self.edges.len());
        let mut positions: HashMap<Term, NodeIndex> = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes {
            if node.id.trim().is_empty() {
                return Err(corrupt("node with empty id".to_string()));
            }
            let id = node.id.clone();
            let idx = graph.add_node(node);
            if positions.insert(id.clone(), idx).is_some() {
                return Err(corrupt(format!("duplicate node '{}'", id)));
            }
        }

        let mut seen = HashSet::with_capacity(self.edges.len());
        for edge in self.edges {
            let a = *positions
                .get(&edge.source)
                .ok_or_else(|| corrupt(format!("edge references unknown node '{}'", edge.source)))?;
            let b = *positions
                .get(&edge.target)
                .ok_or_else(|| corrupt(format!("edge references unknown node '{}'", edge.target)))?;
            if a == b {
                return Err(corrupt(format!("self-loop on '{}'", edge.source)));
            }
            if !edge.weight.is_finite() {
                return Err(corrupt(format!(
                    "edge {} - {} has non-finite weight",
                    edge.source, edge.target
                )));
            }
            let key = if a < b { (a, b) } else { (b, a) };
            if !seen.insert(key) {
                return Err(corrupt(format!(
                    "duplicate edge {} - {}",
                    edge.source, edge.target
                )));
            }
            graph.add_edge(
                a,
                b,
                SemanticEdge {
                    weight: edge.weight,
                    relation_kind: edge.relation_kind,
                },
            );
        }

        let stored = self.metadata;
        let metadata = stored.clone().unwrap_or(GraphMetadata {
            n_nodes: 0,
            n_edges: 0,
            avg_degree: 0.0,
            n_clusters: 0,
            similarity_threshold: None,
            centrality: ScoreOutcome::Computed,
            created_at: None,
            builder_version: None,
        });
        let graph = SemanticGraph::new(graph, metadata).map_err(|e| corrupt(e.to_string()))?;

        if let Some(stored) = stored {
            let actual = graph.summary();
            if stored.n_nodes != actual.n_nodes
                || stored.n_edges != actual.n_edges
                || stored.n_clusters != actual.n_clusters
            {
                warn!(
                    "Artifact metadata disagrees with its contents ({} nodes/{} edges stored, {} nodes/{} edges found); using recomputed values",
                    stored.n_nodes, stored.n_edges, actual.n_nodes, actual.n_edges
                );
            }
        }

        Ok(graph)
    }
}

/// Write `graph` to `path` atomically: readers see either the old file or
/// the complete new one.
pub fn save_graph(graph: &SemanticGraph, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent)?;

    let artifact = GraphArtifact::from_graph(graph);
    let mut temp = NamedTempFile::new_in(&parent)?;
    serde_json::to_writer_pretty(&mut temp, &artifact)?;
    temp.write_all(b"\n")?;
    temp.flush()?;
    temp.persist(path).map_err(|e| LeverageError::Io(e.error))?;

    info!(
        "Saved semantic graph ({} nodes, {} edges) to {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(())
}

pub fn load_graph(path: &Path) -> Result<SemanticGraph> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| corrupt(format!("cannot read {}: {}", path.display(), e)))?;
    let artifact: GraphArtifact = serde_json::from_str(&content)
        .map_err(|e| corrupt(format!("cannot parse {}: {}", path.display(), e)))?;
    let graph = artifact.into_graph()?;
    debug!(
        "Loaded semantic graph ({} nodes, {} edges) from {}",
        graph.node_count(),
        graph.edge_count(),
        path.display()
    );
    Ok(graph)
}

/// A bare name resolves to `<artifact_dir>/<name>.json`; anything that
/// looks like a path is used as given.
pub fn resolve_artifact_path(name: &str, artifact_dir: &Path) -> PathBuf {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 || candidate.extension().is_some() {
        candidate.to_path_buf()
    } else {
        artifact_dir.join(format!("{}.json", name))
    }
}

fn corrupt(message: String) -> LeverageError {
    LeverageError::ArtifactCorrupt(message)
}
