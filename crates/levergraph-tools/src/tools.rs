// ABOUTME: Typed implementations of the four leverage tools
// ABOUTME: Parameters are validated up front; compute runs on tokio's blocking pool

use crate::{
    LeverageToolSchemas, ToolOutput, ToolSchema, BUILD_SEMANTIC_GRAPH, COMPUTE_TARGET_LEVERAGE,
    RANK_GLOBAL_LEVERAGE, RECOMMEND_INTERVENTIONS,
};
use async_trait::async_trait;
use levergraph_core::{
    Embedder, HistoricalEffectSource, JsonEffectSource, JsonTermSource, LeverGraphConfig,
    LeverageError, ModelEffectSource, RelationTriple, Result, Term, TermSource,
};
use levergraph_graph::{load_graph, resolve_artifact_path, save_graph, BuildRequest, GraphBuilder, SemanticGraph};
use levergraph_leverage::{InterventionRecommender, LeverageScorer, TargetedLeverageAnalyzer};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[async_trait]
pub trait LeverageTool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    async fn execute(&self, params: JsonValue) -> Result<ToolOutput>;
}

fn parse_params<T: DeserializeOwned>(tool: &str, params: JsonValue) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| LeverageError::InvalidInput(format!("{} parameters: {}", tool, e)))
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| LeverageError::Internal(format!("blocking task failed: {}", e)))?
}

fn open_graph(config: &LeverGraphConfig, graph_path: &str) -> Result<SemanticGraph> {
    load_graph(&resolve_artifact_path(graph_path, &config.graph.artifact_dir))
}

fn positive(name: &str, value: Option<usize>, default: usize) -> Result<usize> {
    match value {
        Some(0) => Err(LeverageError::InvalidInput(format!("{} must be at least 1", name))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

/// Inline map wins over a file; non-finite values are rejected.
fn effect_map(
    inline: Option<HashMap<Term, f64>>,
    path: Option<&Path>,
    load: impl FnOnce(&JsonEffectSource) -> Result<HashMap<Term, f64>>,
) -> Result<Option<HashMap<Term, f64>>> {
    let effects = match (inline, path) {
        (Some(map), _) => map,
        (None, Some(path)) => load(&JsonEffectSource::new(path))?,
        (None, None) => return Ok(None),
    };
    if let Some((term, _)) = effects.iter().find(|(_, v)| !v.is_finite()) {
        return Err(LeverageError::InvalidInput(format!(
            "effect for '{}' is not a finite number",
            term
        )));
    }
    Ok(Some(effects))
}

#[derive(Debug, Deserialize)]
struct BuildParams {
    #[serde(default)]
    terms: Vec<Term>,
    terms_path: Option<PathBuf>,
    similarity_threshold: Option<f64>,
    corpus: Option<String>,
    actionable_terms: Option<Vec<Term>>,
    #[serde(default)]
    relation_triples: Vec<RelationTriple>,
    output_path: String,
}

pub struct BuildSemanticGraphTool {
    config: Arc<LeverGraphConfig>,
    embedder: Arc<dyn Embedder>,
}

impl BuildSemanticGraphTool {
    pub fn new(config: Arc<LeverGraphConfig>, embedder: Arc<dyn Embedder>) -> Self {
        Self { config, embedder }
    }
}

#[async_trait]
impl LeverageTool for BuildSemanticGraphTool {
    fn schema(&self) -> ToolSchema {
        LeverageToolSchemas::build_semantic_graph()
    }

    async fn execute(&self, params: JsonValue) -> Result<ToolOutput> {
        let params: BuildParams = parse_params(BUILD_SEMANTIC_GRAPH, params)?;
        let config = self.config.clone();
        let embedder = self.embedder.clone();

        run_blocking(move || {
            let mut terms = params.terms;
            let mut triples = params.relation_triples;
            if let Some(path) = &params.terms_path {
                let catalog = JsonTermSource::new(path).load()?;
                if terms.is_empty() {
                    terms = catalog.terms;
                }
                triples.extend(catalog.relation_triples);
            }

            let mut request = BuildRequest::new(terms).with_relation_triples(triples);
            request.similarity_threshold = params.similarity_threshold;
            request.corpus = params.corpus;
            request.actionable_terms = params.actionable_terms;

            let graph = GraphBuilder::new(embedder, config.graph.clone()).build(&request)?;
            let path = resolve_artifact_path(&params.output_path, &config.graph.artifact_dir);
            save_graph(&graph, &path)?;

            let summary = graph.summary();
            ToolOutput::new(format!(
                "Built graph with {} nodes and {} edges",
                summary.n_nodes, summary.n_edges
            ))
            .with("graph_path", path.display().to_string())?
            .with("n_nodes", summary.n_nodes)?
            .with("n_edges", summary.n_edges)?
            .with("avg_degree", summary.avg_degree)?
            .with("n_clusters", summary.n_clusters)?
            .with("centrality", graph.metadata().centrality)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct TargetParams {
    graph_path: String,
    target: Term,
    model_effect_map: Option<HashMap<Term, f64>>,
    model_effects_path: Option<PathBuf>,
    actionable_terms: Option<Vec<Term>>,
    top_k: Option<usize>,
}

pub struct ComputeTargetLeverageTool {
    config: Arc<LeverGraphConfig>,
}

impl ComputeTargetLeverageTool {
    pub fn new(config: Arc<LeverGraphConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LeverageTool for ComputeTargetLeverageTool {
    fn schema(&self) -> ToolSchema {
        LeverageToolSchemas::compute_target_leverage()
    }

    async fn execute(&self, params: JsonValue) -> Result<ToolOutput> {
        let params: TargetParams = parse_params(COMPUTE_TARGET_LEVERAGE, params)?;
        let top_k = positive("top_k", params.top_k, self.config.analysis.top_k)?;
        let config = self.config.clone();

        run_blocking(move || {
            let effects = effect_map(
                params.model_effect_map,
                params.model_effects_path.as_deref(),
                |source| source.model_effects(),
            )?;
            let graph = open_graph(&config, &params.graph_path)?;
            let levers = TargetedLeverageAnalyzer::new(config.analysis.clone()).analyze(
                &graph,
                &params.target,
                effects.as_ref(),
                params.actionable_terms.as_deref(),
                top_k,
            )?;

            ToolOutput::new(format!(
                "Ranked {} levers for '{}'",
                levers.len(),
                params.target
            ))
            .with("target", &params.target)?
            .with("levers", levers)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct RecommendParams {
    graph_path: String,
    lever: Term,
    target: Term,
    historical_effects: Option<HashMap<Term, f64>>,
    historical_effects_path: Option<PathBuf>,
    top_paths: Option<usize>,
}

pub struct RecommendInterventionsTool {
    config: Arc<LeverGraphConfig>,
}

impl RecommendInterventionsTool {
    pub fn new(config: Arc<LeverGraphConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LeverageTool for RecommendInterventionsTool {
    fn schema(&self) -> ToolSchema {
        LeverageToolSchemas::recommend_interventions()
    }

    async fn execute(&self, params: JsonValue) -> Result<ToolOutput> {
        let params: RecommendParams = parse_params(RECOMMEND_INTERVENTIONS, params)?;
        let top_paths = positive("top_paths", params.top_paths, self.config.analysis.top_paths)?;
        let config = self.config.clone();

        run_blocking(move || {
            let history = effect_map(
                params.historical_effects,
                params.historical_effects_path.as_deref(),
                |source| source.historical_effects(),
            )?;
            let graph = open_graph(&config, &params.graph_path)?;
            let recommendations = InterventionRecommender::new(config.analysis.clone()).recommend(
                &graph,
                &params.lever,
                &params.target,
                history.as_ref(),
                top_paths,
            )?;

            let message = if recommendations.is_empty() {
                format!(
                    "No path from '{}' to '{}'; nothing to recommend",
                    params.lever, params.target
                )
            } else {
                format!("Designed {} experiments", recommendations.len())
            };
            ToolOutput::new(message)
                .with("lever", &params.lever)?
                .with("target", &params.target)?
                .with("recommendations", recommendations)
        })
        .await
    }
}

#[derive(Debug, Deserialize)]
struct RankParams {
    graph_path: String,
    kpi: Term,
    actionable_terms: Option<Vec<Term>>,
}

pub struct RankGlobalLeverageTool {
    config: Arc<LeverGraphConfig>,
}

impl RankGlobalLeverageTool {
    pub fn new(config: Arc<LeverGraphConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl LeverageTool for RankGlobalLeverageTool {
    fn schema(&self) -> ToolSchema {
        LeverageToolSchemas::rank_global_leverage()
    }

    async fn execute(&self, params: JsonValue) -> Result<ToolOutput> {
        let params: RankParams = parse_params(RANK_GLOBAL_LEVERAGE, params)?;
        let config = self.config.clone();

        run_blocking(move || {
            let graph = open_graph(&config, &params.graph_path)?;
            let ranking = LeverageScorer::new(config.analysis.clone()).rank_levers(
                &graph,
                &params.kpi,
                params.actionable_terms.as_deref(),
            )?;
            debug!("Global ranking head: {:?}", ranking.rankings.first());

            ToolOutput::new(format!(
                "Ranked {} terms for '{}'",
                ranking.rankings.len(),
                ranking.kpi
            ))
            .with("kpi", &ranking.kpi)?
            .with("rankings", &ranking.rankings)?
            .with("uncertainty", ranking.uncertainty)?
            .with("centrality", ranking.centrality)
        })
        .await
    }
}
