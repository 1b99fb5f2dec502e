use crate::{actionability_scores, centrality_scores, sensitivity_scores, uncertainty_scores};
use levergraph_core::{AnalysisConfig, FactorScore, LeverageError, Result, ScoreOutcome, Term};
use levergraph_graph::SemanticGraph;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Global leverage ranking for one KPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRanking {
    pub kpi: Term,
    pub rankings: Vec<FactorScore>,
    /// Whether the uncertainty factor was computed or fell back to zeros.
    pub uncertainty: ScoreOutcome,
    pub centrality: ScoreOutcome,
}

/// Combines the four factors into `actionability * (sensitivity +
/// uncertainty + centrality)` and ranks by it.
pub struct LeverageScorer {
    config: AnalysisConfig,
}

impl LeverageScorer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Descending by total; ties keep input order.
    pub fn rank(mut scores: Vec<FactorScore>) -> Vec<FactorScore> {
        scores.sort_by(|a, b| b.total.total_cmp(&a.total));
        scores
    }

    /// Rank every term of a persisted graph against `kpi`, using the
    /// embeddings and betweenness stored on its nodes.
    pub fn rank_levers(
        &self,
        graph: &SemanticGraph,
        kpi: &str,
        actionable_terms: Option<&[Term]>,
    ) -> Result<GlobalRanking> {
        if !graph.contains(kpi) {
            return Err(LeverageError::MissingTarget(kpi.to_string()));
        }
        let embeddings = graph.embeddings().ok_or_else(|| {
            LeverageError::InvalidInput(
                "graph was built without stored embeddings; rebuild with persist_embeddings"
                    .to_string(),
            )
        })?;
        let terms = graph.terms();
        let betweenness: Vec<f64> = graph.nodes().map(|n| n.betweenness).collect();
        // flags stored at build time apply unless the caller overrides them
        let actionability = match actionable_terms {
            Some(set) => {
                let set: HashSet<Term> = set.iter().cloned().collect();
                actionability_scores(&terms, Some(&set))
            }
            None => graph
                .nodes()
                .map(|n| n.actionability().unwrap_or(1.0))
                .collect(),
        };

        let mut ranking =
            self.rank_factors(&terms, &embeddings, &betweenness, kpi, actionability)?;
        ranking.centrality = graph.metadata().centrality;
        if ranking.centrality == ScoreOutcome::Degenerate {
            warn!("Graph centrality was degenerate at build time; centrality factor is zero");
        }
        Ok(ranking)
    }

    pub fn rank_with_embeddings(
        &self,
        terms: &[Term],
        embeddings: &[Vec<f32>],
        betweenness: &[f64],
        kpi: &str,
        actionable_terms: Option<&[Term]>,
    ) -> Result<GlobalRanking> {
        let actionable: Option<HashSet<Term>> =
            actionable_terms.map(|set| set.iter().cloned().collect());
        let actionability = actionability_scores(terms, actionable.as_ref());
        self.rank_factors(terms, embeddings, betweenness, kpi, actionability)
    }

    fn rank_factors(
        &self,
        terms: &[Term],
        embeddings: &[Vec<f32>],
        betweenness: &[f64],
        kpi: &str,
        actionability: Vec<f64>,
    ) -> Result<GlobalRanking> {
        if embeddings.len() != terms.len() || betweenness.len() != terms.len() {
            return Err(LeverageError::InvalidInput(format!(
                "{} terms, {} embeddings, {} betweenness values",
                terms.len(),
                embeddings.len(),
                betweenness.len()
            )));
        }

        let sensitivity = sensitivity_scores(terms, embeddings, kpi)?;
        let centrality = centrality_scores(betweenness);
        let uncertainty = uncertainty_scores(
            embeddings,
            self.config.kmeans_seed,
            self.config.kmeans_max_iterations,
        );
        let uncertainty_outcome = uncertainty.outcome();
        let uncertainty = uncertainty.into_value();

        let scores = terms
            .iter()
            .enumerate()
            .map(|(i, term)| {
                FactorScore::new(
                    term.clone(),
                    actionability[i],
                    sensitivity[i],
                    uncertainty[i],
                    centrality[i],
                )
            })
            .collect();
        let rankings = Self::rank(scores);

        info!(
            "Ranked {} terms for KPI '{}' (uncertainty {:?})",
            rankings.len(),
            kpi,
            uncertainty_outcome
        );

        Ok(GlobalRanking {
            kpi: kpi.to_string(),
            rankings,
            uncertainty: uncertainty_outcome,
            centrality: ScoreOutcome::Computed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(term: &str, total_parts: (f64, f64)) -> FactorScore {
        FactorScore::new(term.to_string(), total_parts.0, total_parts.1, 0.0, 0.0)
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let ranked = LeverageScorer::rank(vec![
            score("A", (1.0, 0.2)),
            score("B", (1.0, 0.5)),
            score("C", (1.0, 0.2)),
            score("D", (0.0, 0.9)),
        ]);
        let order: Vec<&str> = ranked.iter().map(|s| s.term.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn test_zero_actionability_zeroes_total() {
        let scorer = LeverageScorer::new(AnalysisConfig::default());
        let terms: Vec<Term> = vec!["KPI".into(), "Lever".into(), "Fixed".into()];
        let embeddings = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 3.0]];
        let ranking = scorer
            .rank_with_embeddings(
                &terms,
                &embeddings,
                &[0.0, 1.0, 0.5],
                "KPI",
                Some(&["Lever".to_string()][..]),
            )
            .unwrap();

        let fixed = ranking.rankings.iter().find(|s| s.term == "Fixed").unwrap();
        assert_eq!(fixed.total, 0.0);
        assert_eq!(ranking.rankings[0].term, "Lever");

        let max_centrality = ranking
            .rankings
            .iter()
            .map(|s| s.centrality)
            .fold(0.0, f64::max);
        assert_eq!(max_centrality, 1.0);
    }

    #[test]
    fn test_default_actionability_is_one() {
        let scorer = LeverageScorer::new(AnalysisConfig::default());
        let terms: Vec<Term> = vec!["KPI".into(), "Other".into()];
        let ranking = scorer
            .rank_with_embeddings(
                &terms,
                &[vec![0.0, 1.0], vec![1.0, 0.0]],
                &[0.0, 0.0],
                "KPI",
                None,
            )
            .unwrap();
        assert!(ranking.rankings.iter().all(|s| s.actionability == 1.0));
    }

    #[test]
    fn test_missing_kpi() {
        let scorer = LeverageScorer::new(AnalysisConfig::default());
        let terms: Vec<Term> = vec!["A".into(), "B".into()];
        let err = scorer
            .rank_with_embeddings(&terms, &[vec![0.0], vec![1.0]], &[0.0, 0.0], "KPI", None)
            .unwrap_err();
        assert_eq!(err.kind(), "missing_target");
    }
}
