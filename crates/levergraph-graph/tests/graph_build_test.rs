use approx::assert_abs_diff_eq;
use levergraph_core::{
    Embedder, GraphConfig, LeverageError, RelationKind, RelationTriple, ScoreOutcome, Term,
};
use levergraph_graph::{
    load_graph, save_graph, BuildRequest, GraphArtifact, GraphBuilder, ARTIFACT_VERSION,
};
use levergraph_vector::{cosine_similarity, StaticEmbedder};
use std::sync::Arc;
use tempfile::TempDir;

fn example_embedder() -> Arc<dyn Embedder> {
    Arc::new(
        StaticEmbedder::from_pairs(vec![
            ("Revenue", vec![1.0, 0.0, 0.0]),
            ("Budget", vec![0.0, 1.0, 0.0]),
            ("Marketing", vec![0.0, 0.8, 0.6]),
            ("Sales", vec![0.6, 0.0, -0.8]),
        ])
        .unwrap(),
    )
}

fn example_terms() -> Vec<Term> {
    ["Revenue", "Budget", "Marketing", "Sales"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn builder() -> GraphBuilder {
    GraphBuilder::new(example_embedder(), GraphConfig::default())
}

#[test]
fn test_single_similar_pair_example() {
    let graph = builder()
        .build(&BuildRequest::new(example_terms()).with_threshold(0.7))
        .unwrap();

    let summary = graph.summary();
    assert_eq!(summary.n_nodes, 4);
    assert_eq!(summary.n_edges, 1);
    assert_abs_diff_eq!(summary.avg_degree, 0.5);
    assert_eq!(summary.n_clusters, 3);

    let edge = graph.edge("Budget", "Marketing").unwrap();
    assert_abs_diff_eq!(edge.weight, 0.8, epsilon = 1e-6);
    assert_eq!(edge.relation_kind, RelationKind::Semantic);
}

#[test]
fn test_semantic_edges_carry_similarity() {
    let embedder = example_embedder();
    let graph = GraphBuilder::new(embedder.clone(), GraphConfig::default())
        .build(&BuildRequest::new(example_terms()).with_threshold(0.0))
        .unwrap();

    for (a, b, edge) in graph.edges() {
        let va = embedder.embed(graph.term(a)).unwrap();
        let vb = embedder.embed(graph.term(b)).unwrap();
        let sim = cosine_similarity(&va, &vb).unwrap();
        assert!(sim > 0.0);
        assert_eq!(edge.weight, sim);
        assert_eq!(edge.relation_kind, RelationKind::Semantic);
    }
    // Sales and Marketing are anti-correlated, Revenue and Budget orthogonal
    assert!(graph.edge("Sales", "Marketing").is_none());
    assert!(graph.edge("Revenue", "Budget").is_none());
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(graph.metadata().centrality, ScoreOutcome::Computed);
}

#[test]
fn test_edge_weights_stay_in_unit_interval_across_thresholds() {
    let corpus = "Budget drives marketing. Revenue depends on sales. Budget precedes revenue.";
    for threshold in [0.0, 0.3, 0.7, 1.0] {
        for request in [
            BuildRequest::new(example_terms()).with_threshold(threshold),
            BuildRequest::new(example_terms())
                .with_threshold(threshold)
                .with_corpus(corpus),
        ] {
            let graph = builder().build(&request).unwrap();
            for (_, _, edge) in graph.edges() {
                assert!(
                    edge.weight > 0.0 && edge.weight <= 1.0,
                    "weight {} at threshold {}",
                    edge.weight,
                    threshold
                );
            }
            assert_eq!(
                graph.metadata().centrality,
                ScoreOutcome::Computed,
                "threshold {}",
                threshold
            );
        }
    }

    // boosted pairs are capped at 1.0
    let boosted = builder()
        .build(
            &BuildRequest::new(example_terms())
                .with_threshold(0.0)
                .with_corpus(corpus),
        )
        .unwrap();
    let budget_marketing = boosted.edge("Budget", "Marketing").unwrap();
    assert_eq!(budget_marketing.weight, 1.0);
    assert_eq!(budget_marketing.relation_kind, RelationKind::SemanticTextual);
    let revenue_budget = boosted.edge("Revenue", "Budget").unwrap();
    assert_eq!(revenue_budget.relation_kind, RelationKind::Textual);
}

#[test]
fn test_rebuild_is_structurally_identical() {
    let request = BuildRequest::new(example_terms())
        .with_threshold(0.5)
        .with_corpus("Budget drives sales. Sales leads to revenue.");
    let first = builder().build(&request).unwrap();
    let second = builder().build(&request).unwrap();

    assert_eq!(first.summary(), second.summary());
    let edges = |g: &levergraph_graph::SemanticGraph| {
        g.edges()
            .map(|(a, b, e)| (a, b, e.weight, e.relation_kind))
            .collect::<Vec<_>>()
    };
    assert_eq!(edges(&first), edges(&second));
    let centrality = |g: &levergraph_graph::SemanticGraph| {
        g.nodes()
            .map(|n| (n.betweenness, n.closeness))
            .collect::<Vec<_>>()
    };
    assert_eq!(centrality(&first), centrality(&second));
}

#[test]
fn test_declared_triples_are_textual_evidence() {
    let request = BuildRequest::new(example_terms())
        .with_threshold(0.7)
        .with_relation_triples(vec![
            RelationTriple::new("Revenue", "depends_on", "Sales"),
            RelationTriple::new("Revenue", "depends_on", "Profit"),
        ]);
    let graph = builder().build(&request).unwrap();
    let edge = graph.edge("Sales", "Revenue").unwrap();
    assert_eq!(edge.relation_kind, RelationKind::Textual);
    assert_abs_diff_eq!(edge.weight, 0.8);
    assert_eq!(graph.summary().n_edges, 2);
}

#[test]
fn test_centrality_is_stored_on_nodes() {
    let request = BuildRequest::new(example_terms())
        .with_threshold(0.7)
        .with_corpus("Marketing drives sales.");
    let graph = builder().build(&request).unwrap();
    // Budget - Marketing - Sales: Marketing is the only bridge
    let marketing = graph.node(graph.index_of("Marketing").unwrap());
    assert!(marketing.betweenness > 0.0);
    assert!(graph.nodes().all(|n| (0.0..=1.0).contains(&n.betweenness)));
    assert_eq!(graph.metadata().centrality, ScoreOutcome::Computed);
}

#[test]
fn test_artifact_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("kpis.json");
    let graph = builder()
        .build(&BuildRequest::new(example_terms()).with_corpus("Budget drives revenue."))
        .unwrap();

    save_graph(&graph, &path).unwrap();
    let loaded = load_graph(&path).unwrap();

    assert_eq!(loaded.summary(), graph.summary());
    assert_eq!(loaded.terms(), graph.terms());
    assert_eq!(loaded.metadata(), graph.metadata());
    assert_eq!(
        loaded.edge("Budget", "Revenue").unwrap().relation_kind,
        RelationKind::Textual
    );
    assert!(loaded.embeddings().is_some());

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["version"], ARTIFACT_VERSION);
    assert_eq!(raw["metadata"]["centrality"], "computed");
}

#[test]
fn test_corrupt_artifacts_are_rejected() {
    let dir = TempDir::new().unwrap();

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(
        load_graph(&garbage),
        Err(LeverageError::ArtifactCorrupt(_))
    ));

    let future = dir.path().join("future.json");
    let graph = builder().build(&BuildRequest::new(example_terms())).unwrap();
    let mut artifact = GraphArtifact::from_graph(&graph);
    artifact.version = ARTIFACT_VERSION + 1;
    std::fs::write(&future, serde_json::to_string(&artifact).unwrap()).unwrap();
    assert!(matches!(
        load_graph(&future),
        Err(LeverageError::ArtifactCorrupt(_))
    ));
}
