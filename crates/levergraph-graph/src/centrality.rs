// ABOUTME: Betweenness and closeness centrality over weighted undirected graphs
// ABOUTME: Brandes' algorithm with edge weights as distances; degrades to zeros on bad weights

use crate::paths::dijkstra;
use crate::Adjacency;
use levergraph_core::Scored;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct CentralityScores {
    pub betweenness: Vec<f64>,
    pub closeness: Vec<f64>,
}

impl CentralityScores {
    pub fn zeros(n: usize) -> Self {
        Self {
            betweenness: vec![0.0; n],
            closeness: vec![0.0; n],
        }
    }
}

/// Betweenness normalised by `1/((n-1)(n-2))` and Wasserman-Faust closeness
/// `(r-1)/sum(d) * (r-1)/(n-1)` where `r` counts the nodes reachable from
/// a node, itself included.
///
/// Any non-finite or non-positive weight makes shortest paths meaningless;
/// the result is then all zeros, tagged degenerate.
pub fn compute_centrality(adjacency: &Adjacency) -> Scored<CentralityScores> {
    let n = adjacency.len();

    if let Some((node, weight)) = adjacency.iter().enumerate().find_map(|(node, edges)| {
        edges
            .iter()
            .find(|(_, w)| !(w.is_finite() && *w > 0.0))
            .map(|(_, w)| (node, *w))
    }) {
        warn!(
            "Centrality degenerate: edge at node {} has weight {}",
            node, weight
        );
        return Scored::degenerate(
            format!("invalid edge weight {} at node {}", weight, node),
            CentralityScores::zeros(n),
        );
    }

    let mut betweenness = vec![0.0f64; n];
    let mut closeness = vec![0.0f64; n];

    for source in 0..n {
        let sp = dijkstra(adjacency, source);

        let mut delta = vec![0.0f64; n];
        for &w in sp.order.iter().rev() {
            for &v in &sp.preds[w] {
                delta[v] += sp.sigma[v] / sp.sigma[w] * (1.0 + delta[w]);
            }
            if w != source {
                betweenness[w] += delta[w];
            }
        }

        let reachable = sp.order.len() as f64;
        let total: f64 = sp.order.iter().map(|&v| sp.distance[v]).sum();
        if total > 0.0 && n > 1 {
            closeness[source] = (reachable - 1.0) / total * ((reachable - 1.0) / (n as f64 - 1.0));
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n as f64 - 1.0) * (n as f64 - 2.0));
        for b in &mut betweenness {
            *b *= scale;
        }
    }

    debug!("Computed centrality for {} nodes", n);
    Scored::Computed(CentralityScores {
        betweenness,
        closeness,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn path_graph() -> Adjacency {
        // 0 - 1 - 2
        vec![vec![(1, 1.0)], vec![(0, 1.0), (2, 1.0)], vec![(1, 1.0)]]
    }

    #[test]
    fn test_path_graph_centre_has_full_betweenness() {
        let scores = compute_centrality(&path_graph());
        assert!(!scores.is_degenerate());
        let scores = scores.into_value();
        assert_abs_diff_eq!(scores.betweenness[1], 1.0, epsilon = 1e-12);
        assert_eq!(scores.betweenness[0], 0.0);
        assert_abs_diff_eq!(scores.closeness[1], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(scores.closeness[0], 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_paths_split_betweenness() {
        // square 0-1-3-2-0: 1 and 2 each carry half of the 0..3 paths
        let adjacency: Adjacency = vec![
            vec![(1, 0.5), (2, 0.5)],
            vec![(0, 0.5), (3, 0.5)],
            vec![(0, 0.5), (3, 0.5)],
            vec![(1, 0.5), (2, 0.5)],
        ];
        let scores = compute_centrality(&adjacency).into_value();
        // each of 4 nodes lies on half of one pair's paths: 0.5 / 3
        for b in &scores.betweenness {
            assert_abs_diff_eq!(*b, 0.5 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_isolated_node_is_zero() {
        let mut adjacency = path_graph();
        adjacency.push(vec![]);
        let scores = compute_centrality(&adjacency).into_value();
        assert_eq!(scores.closeness[3], 0.0);
        assert_eq!(scores.betweenness[3], 0.0);
        // reachable set of the path nodes is 3 out of 4
        assert_abs_diff_eq!(scores.closeness[1], 1.0 * (2.0 / 3.0), epsilon = 1e-12);
    }

    #[test]
    fn test_negative_weight_degrades() {
        let adjacency: Adjacency = vec![vec![(1, -0.2)], vec![(0, -0.2)]];
        let scores = compute_centrality(&adjacency);
        assert!(scores.is_degenerate());
        assert_eq!(scores.value(), &CentralityScores::zeros(2));

        let adjacency: Adjacency = vec![vec![(1, f64::NAN)], vec![(0, f64::NAN)]];
        assert!(compute_centrality(&adjacency).is_degenerate());
    }

    #[test]
    fn test_scores_are_bounded_for_unit_weights() {
        let adjacency: Adjacency = vec![
            vec![(1, 1.0), (2, 1.0), (3, 1.0)],
            vec![(0, 1.0)],
            vec![(0, 1.0)],
            vec![(0, 1.0)],
        ];
        let scores = compute_centrality(&adjacency).into_value();
        assert_abs_diff_eq!(scores.betweenness[0], 1.0, epsilon = 1e-12);
        assert!(scores.closeness.iter().all(|c| (0.0..=1.0).contains(c)));
    }
}
