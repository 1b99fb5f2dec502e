use crate::{action_for, duration_bucket, expected_lift, guardrails_for, sample_size};
use levergraph_core::{AnalysisConfig, ExperimentSpec, LeverageError, Result, Term};
use levergraph_graph::{path_weight_sum, simple_paths, SemanticGraph};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Turns the strongest bounded paths between a lever and a target into
/// experiment plans.
pub struct InterventionRecommender {
    config: AnalysisConfig,
}

impl InterventionRecommender {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn recommend(
        &self,
        graph: &SemanticGraph,
        lever: &str,
        target: &str,
        historical_effects: Option<&HashMap<Term, f64>>,
        top_paths: usize,
    ) -> Result<Vec<ExperimentSpec>> {
        if lever == target {
            return Err(LeverageError::InvalidInput(format!(
                "lever and target are both '{}'",
                lever
            )));
        }
        let source = graph
            .index_of(lever)
            .ok_or_else(|| LeverageError::MissingTarget(lever.to_string()))?;
        let sink = graph
            .index_of(target)
            .ok_or_else(|| LeverageError::MissingTarget(target.to_string()))?;

        let adjacency = graph.adjacency();
        let (paths, outcome) = simple_paths(
            adjacency,
            source,
            sink,
            self.config.max_hops,
            self.config.max_paths_per_pair,
        );
        if outcome.truncated {
            warn!(
                "Stopped enumerating {} -> {} paths at {} paths",
                lever, target, outcome.found
            );
        }
        if paths.is_empty() {
            info!("No path from '{}' to '{}' within {} hops", lever, target, self.config.max_hops);
            return Ok(Vec::new());
        }

        let mut weighted: Vec<(f64, Vec<usize>)> = paths
            .into_iter()
            .map(|p| (path_weight_sum(adjacency, &p), p))
            .collect();
        weighted.sort_by(|(wa, pa), (wb, pb)| wb.total_cmp(wa).then(pa.len().cmp(&pb.len())));
        weighted.truncate(top_paths);

        let historical = historical_effects.and_then(|h| h.get(lever)).copied();
        if let Some(effect) = historical {
            debug!("Using historical effect {} for '{}'", effect, lever);
        }
        let action = action_for(lever);
        let guardrails = guardrails_for(lever);

        let specs: Vec<ExperimentSpec> = weighted
            .into_iter()
            .map(|(path_weight, path)| {
                let lift = expected_lift(path_weight, historical);
                let n = sample_size(lift);
                let terms = graph.path_terms(&path);
                let intermediate = terms[1..terms.len() - 1].to_vec();
                ExperimentSpec {
                    lever: lever.to_string(),
                    target: target.to_string(),
                    path_length: path.len() - 1,
                    path: terms,
                    path_weight,
                    action: action.clone(),
                    expected_lift: lift,
                    sample_size: n,
                    duration_bucket: duration_bucket(n).to_string(),
                    primary_kpi: target.to_string(),
                    intermediate_kpis: intermediate,
                    guardrails: guardrails.clone(),
                }
            })
            .collect();

        info!(
            "Recommended {} experiments for '{}' -> '{}'",
            specs.len(),
            lever,
            target
        );
        Ok(specs)
    }
}
