//! The four independent leverage factors. Each function maps a term list
//! (and the data it needs) to one score per term, in input order.

use levergraph_core::{LeverageError, Result, Scored, Term};
use levergraph_vector::{
    default_cluster_count, euclidean_distance, kmeans, mean_dimension_std, KMeansConfig,
};
use std::collections::HashSet;
use tracing::{debug, warn};

/// 1.0 for members of `actionable`, 0.0 otherwise. Without a set every
/// term is considered actionable.
pub fn actionability_scores(terms: &[Term], actionable: Option<&HashSet<Term>>) -> Vec<f64> {
    match actionable {
        Some(set) => terms
            .iter()
            .map(|t| if set.contains(t) { 1.0 } else { 0.0 })
            .collect(),
        None => vec![1.0; terms.len()],
    }
}

/// Betweenness divided by the maximum betweenness.
pub fn centrality_scores(betweenness: &[f64]) -> Vec<f64> {
    normalize_by_max(betweenness)
}

/// Per-term uncertainty from the spread of the term's embedding cluster.
///
/// Terms are clustered with k-means (`k = max(2, round(sqrt(n)))`); every
/// member inherits its cluster's mean per-dimension standard deviation, and
/// the result is divided by the maximum. Clustering failure yields zeros.
pub fn uncertainty_scores(embeddings: &[Vec<f32>], seed: u64, max_iterations: usize) -> Scored<Vec<f64>> {
    let n = embeddings.len();
    let k = default_cluster_count(n);
    let config = KMeansConfig::new(k)
        .with_seed(seed)
        .with_max_iterations(max_iterations);

    let clustering = match kmeans(embeddings, &config) {
        Ok(c) => c,
        Err(e) => {
            warn!("Uncertainty degenerate: {}", e);
            return Scored::degenerate(e.to_string(), vec![0.0; n]);
        }
    };

    let mut spread = vec![0.0f64; k];
    for (cluster, value) in spread.iter_mut().enumerate() {
        let members: Vec<&[f32]> = clustering
            .members(cluster)
            .into_iter()
            .map(|i| embeddings[i].as_slice())
            .collect();
        if members.is_empty() {
            continue;
        }
        match mean_dimension_std(&members) {
            Ok(std) => *value = std,
            Err(e) => {
                warn!("Uncertainty degenerate: {}", e);
                return Scored::degenerate(e.to_string(), vec![0.0; n]);
            }
        }
    }
    debug!("Cluster spreads: {:?}", spread);

    let raw: Vec<f64> = clustering.labels.iter().map(|&c| spread[c]).collect();
    Scored::Computed(normalize_by_max(&raw))
}

/// `1 - dist(t, kpi) / max_distance` over euclidean distances in embedding
/// space. The KPI itself scores 1.0.
pub fn sensitivity_scores(terms: &[Term], embeddings: &[Vec<f32>], kpi: &str) -> Result<Vec<f64>> {
    let position = terms
        .iter()
        .position(|t| t == kpi)
        .ok_or_else(|| LeverageError::MissingTarget(kpi.to_string()))?;
    if embeddings.len() != terms.len() {
        return Err(LeverageError::InvalidInput(format!(
            "{} embeddings for {} terms",
            embeddings.len(),
            terms.len()
        )));
    }

    let anchor = &embeddings[position];
    let distances = embeddings
        .iter()
        .map(|e| euclidean_distance(e, anchor))
        .collect::<std::result::Result<Vec<f64>, _>>()?;

    let max = distances.iter().cloned().fold(0.0f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };
    Ok(distances.iter().map(|d| 1.0 - d / divisor).collect())
}

/// Divide by the maximum; a zero maximum leaves the values unchanged.
fn normalize_by_max(values: &[f64]) -> Vec<f64> {
    let max = values.iter().cloned().fold(0.0f64, f64::max);
    let divisor = if max > 0.0 { max } else { 1.0 };
    values.iter().map(|v| v / divisor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn terms(names: &[&str]) -> Vec<Term> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_actionability_defaults_to_one() {
        let t = terms(&["A", "B"]);
        assert_eq!(actionability_scores(&t, None), vec![1.0, 1.0]);
        let set: HashSet<Term> = ["B".to_string()].into_iter().collect();
        assert_eq!(actionability_scores(&t, Some(&set)), vec![0.0, 1.0]);
    }

    #[test]
    fn test_centrality_normalised_max_is_one_or_zero() {
        assert_eq!(centrality_scores(&[0.2, 0.4, 0.0]), vec![0.5, 1.0, 0.0]);
        assert_eq!(centrality_scores(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_sensitivity() {
        let t = terms(&["KPI", "Near", "Far"]);
        let e = vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![4.0, 0.0]];
        let s = sensitivity_scores(&t, &e, "KPI").unwrap();
        assert_abs_diff_eq!(s[0], 1.0);
        assert_abs_diff_eq!(s[1], 0.75);
        assert_abs_diff_eq!(s[2], 0.0);

        let err = sensitivity_scores(&t, &e, "Profit").unwrap_err();
        assert!(matches!(err, LeverageError::MissingTarget(_)));
    }

    #[test]
    fn test_sensitivity_with_identical_embeddings() {
        let t = terms(&["KPI", "Other"]);
        let e = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert_eq!(sensitivity_scores(&t, &e, "KPI").unwrap(), vec![1.0, 1.0]);
    }

    #[test]
    fn test_uncertainty_members_share_cluster_value() {
        let e = vec![
            vec![0.0, 0.0],
            vec![0.0, 2.0],
            vec![10.0, 10.0],
            vec![10.0, 10.2],
        ];
        let scored = uncertainty_scores(&e, 42, 300);
        assert!(!scored.is_degenerate());
        let u = scored.into_value();
        assert_abs_diff_eq!(u[0], 1.0);
        assert_abs_diff_eq!(u[1], 1.0);
        assert_abs_diff_eq!(u[2], 0.1, epsilon = 1e-6);
        assert_abs_diff_eq!(u[3], 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_uncertainty_degenerates_below_k() {
        let scored = uncertainty_scores(&[vec![1.0, 0.0]], 42, 300);
        assert!(scored.is_degenerate());
        assert_eq!(scored.into_value(), vec![0.0]);
    }
}
