// ABOUTME: Path-aware leverage of every term relative to one target KPI
// ABOUTME: Combines targeted betweenness, path strength, actionability and model effect

use levergraph_core::{AnalysisConfig, LeverageError, Result, TargetedLeverageScore, Term};
use levergraph_graph::{
    dijkstra, for_each_simple_path, path_weight_product, same_distance, Adjacency,
    SemanticGraph,
};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Share of shortest weighted `s -> target` paths passing through each
/// node, over sources `s` other than the node and the target.
///
/// Counts paths from Dijkstra path multiplicities instead of listing them:
/// a node `v` lies on a shortest `s -> target` path exactly when
/// `d(s, v) + d(v, target) = d(s, target)`, and then carries
/// `sigma(s, v) * sigma(v, target)` of them.
pub fn targeted_betweenness(adjacency: &Adjacency, target: usize) -> Vec<f64> {
    let n = adjacency.len();
    if target >= n {
        return vec![0.0; n];
    }
    let from_target = dijkstra(adjacency, target);

    // per source: (paths to target, paths to target through each node)
    let per_source: Vec<(f64, Vec<f64>)> = (0..n)
        .into_par_iter()
        .filter(|&s| s != target)
        .map(|s| {
            let sp = dijkstra(adjacency, s);
            let mut through = vec![0.0f64; n];
            if !sp.reachable(target) {
                return (0.0, through);
            }
            let total = sp.distance[target];
            for v in 0..n {
                if v == s || v == target || !sp.reachable(v) || !from_target.reachable(v) {
                    continue;
                }
                if same_distance(sp.distance[v] + from_target.distance[v], total) {
                    through[v] = sp.sigma[v] * from_target.sigma[v];
                }
            }
            (sp.sigma[target], through)
        })
        .collect();

    let all_paths: f64 = per_source.iter().map(|(paths, _)| paths).sum();
    // paths that start at v never count towards v
    let mut own_paths = vec![0.0f64; n];
    for (s, (paths, _)) in (0..n).filter(|&s| s != target).zip(per_source.iter()) {
        own_paths[s] = *paths;
    }

    (0..n)
        .map(|v| {
            if v == target {
                return 0.0;
            }
            let through: f64 = per_source.iter().map(|(_, t)| t[v]).sum();
            let denominator = all_paths - own_paths[v];
            if denominator > 0.0 {
                through / denominator
            } else {
                0.0
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStrength {
    /// Sum over all bounded simple paths of the product of edge weights.
    pub strength: f64,
    pub strongest_path: Vec<usize>,
    pub truncated: bool,
}

pub fn path_strength(
    adjacency: &Adjacency,
    source: usize,
    target: usize,
    max_hops: usize,
    budget: Option<usize>,
) -> PathStrength {
    let mut result = PathStrength::default();
    let mut best = f64::NEG_INFINITY;
    let outcome = for_each_simple_path(adjacency, source, target, max_hops, budget, |path| {
        let product = path_weight_product(adjacency, path);
        result.strength += product;
        // first path found wins ties
        if product > best {
            best = product;
            result.strongest_path = path.to_vec();
        }
    });
    result.truncated = outcome.truncated;
    result
}

/// Ranks every non-target term by `betweenness_T * path_strength *
/// actionability * |model_effect|`.
pub struct TargetedLeverageAnalyzer {
    config: AnalysisConfig,
}

impl TargetedLeverageAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(
        &self,
        graph: &SemanticGraph,
        target: &str,
        model_effects: Option<&HashMap<Term, f64>>,
        actionable_terms: Option<&[Term]>,
        top_k: usize,
    ) -> Result<Vec<TargetedLeverageScore>> {
        let target_position = graph
            .index_of(target)
            .ok_or_else(|| LeverageError::MissingTarget(target.to_string()))?;
        let adjacency = graph.adjacency();
        let actionable: Option<HashSet<&str>> =
            actionable_terms.map(|set| set.iter().map(String::as_str).collect());

        let betweenness = targeted_betweenness(adjacency, target_position);

        let mut scores = Vec::with_capacity(graph.node_count().saturating_sub(1));
        let mut truncated = 0usize;
        for position in 0..graph.node_count() {
            if position == target_position {
                continue;
            }
            let node = graph.node(position);

            let strength = path_strength(
                adjacency,
                position,
                target_position,
                self.config.max_hops,
                self.config.max_paths_per_pair,
            );
            if strength.truncated {
                truncated += 1;
            }

            let actionability = match &actionable {
                Some(set) => {
                    if set.contains(node.id.as_str()) {
                        1.0
                    } else {
                        0.0
                    }
                }
                None => node.actionability().unwrap_or(1.0),
            };
            let model_effect = model_effects
                .and_then(|effects| effects.get(&node.id))
                .map(|e| e.abs())
                .unwrap_or(1.0);

            let total = betweenness[position] * strength.strength * actionability * model_effect;
            scores.push(TargetedLeverageScore {
                term: node.id.clone(),
                targeted_betweenness: betweenness[position],
                path_strength: strength.strength,
                actionability,
                model_effect,
                total,
                strongest_path: graph.path_terms(&strength.strongest_path),
            });
        }

        if truncated > 0 {
            warn!(
                "Path enumeration hit the budget of {:?} paths for {} terms; path strengths are partial",
                self.config.max_paths_per_pair, truncated
            );
        }

        scores.sort_by(|a, b| b.total.total_cmp(&a.total));
        debug!("Scored {} candidate levers for '{}'", scores.len(), target);
        scores.truncate(top_k);

        info!(
            "Targeted leverage for '{}': returning {} levers",
            target,
            scores.len()
        );
        Ok(scores)
    }
}
