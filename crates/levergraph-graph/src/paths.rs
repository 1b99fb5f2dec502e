//! Weighted shortest paths and bounded simple-path enumeration over an
//! [`Adjacency`]. Edge weights are used directly as path lengths.

use crate::Adjacency;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Relative tolerance under which two path lengths count as equal.
pub const DISTANCE_EPSILON: f64 = 1e-12;

pub fn same_distance(a: f64, b: f64) -> bool {
    (a - b).abs() <= DISTANCE_EPSILON * a.abs().max(b.abs()).max(1.0)
}

/// Heap entry for Dijkstra. Ordered so that `BinaryHeap` pops the closest
/// node first, breaking ties by push order.
#[derive(Debug, Clone, Copy)]
struct DijkstraNode {
    distance: f64,
    seq: u64,
    node: usize,
}

impl PartialEq for DijkstraNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DijkstraNode {}

impl PartialOrd for DijkstraNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DijkstraNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Single-source shortest path data in the form Brandes' algorithm needs.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub source: usize,
    /// `f64::INFINITY` for unreachable nodes.
    pub distance: Vec<f64>,
    /// Number of distinct shortest paths from `source`.
    pub sigma: Vec<f64>,
    /// Predecessors on shortest paths.
    pub preds: Vec<Vec<usize>>,
    /// Settled nodes in non-decreasing distance order.
    pub order: Vec<usize>,
}

impl ShortestPaths {
    pub fn reachable(&self, node: usize) -> bool {
        self.distance[node].is_finite()
    }
}

/// Dijkstra from `source`, counting shortest paths. Weights must be positive.
pub fn dijkstra(adjacency: &Adjacency, source: usize) -> ShortestPaths {
    let n = adjacency.len();
    let mut distance = vec![f64::INFINITY; n];
    let mut tentative = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut settled = vec![false; n];
    let mut order = Vec::with_capacity(n);

    let mut heap = BinaryHeap::new();
    let mut seq = 0u64;
    tentative[source] = 0.0;
    heap.push(DijkstraNode {
        distance: 0.0,
        seq,
        node: source,
    });

    while let Some(DijkstraNode { distance: d, node: v, .. }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        distance[v] = d;
        sigma[v] = if v == source {
            1.0
        } else {
            preds[v].iter().map(|&p| sigma[p]).sum()
        };
        order.push(v);

        for &(w, weight) in &adjacency[v] {
            if settled[w] {
                continue;
            }
            let candidate = d + weight;
            let known = tentative[w];
            if known.is_finite() && same_distance(candidate, known) {
                preds[w].push(v);
            } else if candidate < known {
                tentative[w] = candidate;
                preds[w].clear();
                preds[w].push(v);
                seq += 1;
                heap.push(DijkstraNode {
                    distance: candidate,
                    seq,
                    node: w,
                });
            }
        }
    }

    ShortestPaths {
        source,
        distance,
        sigma,
        preds,
        order,
    }
}

/// Weight of the edge `a - b`, if present.
pub fn edge_weight(adjacency: &Adjacency, a: usize, b: usize) -> Option<f64> {
    let neighbours = adjacency.get(a)?;
    neighbours
        .binary_search_by_key(&b, |(n, _)| *n)
        .ok()
        .map(|i| neighbours[i].1)
}

/// Product of edge weights along `path`; 0 if any hop is missing.
pub fn path_weight_product(adjacency: &Adjacency, path: &[usize]) -> f64 {
    path.windows(2)
        .map(|hop| edge_weight(adjacency, hop[0], hop[1]).unwrap_or(0.0))
        .product()
}

/// Sum of edge weights along `path`.
pub fn path_weight_sum(adjacency: &Adjacency, path: &[usize]) -> f64 {
    path.windows(2)
        .map(|hop| edge_weight(adjacency, hop[0], hop[1]).unwrap_or(0.0))
        .sum()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathEnumeration {
    pub found: usize,
    /// Enumeration stopped at the path budget.
    pub truncated: bool,
}

/// Visit every simple path `source -> target` with at most `max_hops` edges.
///
/// Depth-first, neighbours in ascending position order, so the visiting
/// order is deterministic. Paths never continue past `target`. With a
/// `budget`, enumeration stops after that many paths.
pub fn for_each_simple_path<F>(
    adjacency: &Adjacency,
    source: usize,
    target: usize,
    max_hops: usize,
    budget: Option<usize>,
    mut visit: F,
) -> PathEnumeration
where
    F: FnMut(&[usize]),
{
    let mut result = PathEnumeration::default();
    if source == target || source >= adjacency.len() || target >= adjacency.len() {
        return result;
    }

    let mut on_path = vec![false; adjacency.len()];
    let mut path = vec![source];
    on_path[source] = true;

    // explicit stack of (node, next neighbour cursor)
    let mut stack: Vec<(usize, usize)> = vec![(source, 0)];
    while let Some(frame) = stack.last_mut() {
        let (node, cursor) = *frame;
        let neighbours = &adjacency[node];
        if cursor >= neighbours.len() || path.len() > max_hops {
            stack.pop();
            if let Some(last) = path.pop() {
                on_path[last] = false;
            }
            continue;
        }
        frame.1 += 1;

        let next = neighbours[cursor].0;
        if on_path[next] {
            continue;
        }
        if next == target {
            path.push(next);
            visit(&path);
            path.pop();
            result.found += 1;
            if budget.is_some_and(|b| result.found >= b) {
                result.truncated = true;
                return result;
            }
            continue;
        }
        path.push(next);
        on_path[next] = true;
        stack.push((next, 0));
    }

    result
}

/// Collect the paths [`for_each_simple_path`] visits.
pub fn simple_paths(
    adjacency: &Adjacency,
    source: usize,
    target: usize,
    max_hops: usize,
    budget: Option<usize>,
) -> (Vec<Vec<usize>>, PathEnumeration) {
    let mut paths = Vec::new();
    let outcome = for_each_simple_path(adjacency, source, target, max_hops, budget, |p| {
        paths.push(p.to_vec())
    });
    (paths, outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// 0 - 1 - 3 and 0 - 2 - 3 with equal lengths, plus 3 - 4.
    fn diamond() -> Adjacency {
        vec![
            vec![(1, 0.5), (2, 0.5)],
            vec![(0, 0.5), (3, 0.5)],
            vec![(0, 0.5), (3, 0.5)],
            vec![(1, 0.5), (2, 0.5), (4, 1.0)],
            vec![(3, 1.0)],
        ]
    }

    #[test]
    fn test_dijkstra_counts_equal_paths() {
        let sp = dijkstra(&diamond(), 0);
        assert_abs_diff_eq!(sp.distance[3], 1.0);
        assert_abs_diff_eq!(sp.distance[4], 2.0);
        assert_eq!(sp.sigma[3], 2.0);
        assert_eq!(sp.sigma[4], 2.0);
        assert_eq!(sp.preds[3], vec![1, 2]);
        assert_eq!(sp.order[0], 0);
        assert_eq!(sp.order.len(), 5);
    }

    #[test]
    fn test_dijkstra_unreachable() {
        let adjacency: Adjacency = vec![vec![(1, 0.3)], vec![(0, 0.3)], vec![]];
        let sp = dijkstra(&adjacency, 0);
        assert!(!sp.reachable(2));
        assert_eq!(sp.sigma[2], 0.0);
    }

    #[test]
    fn test_float_noise_still_counts_as_tie() {
        // 0.1 + 0.2 != 0.3 in f64
        let adjacency: Adjacency = vec![
            vec![(1, 0.1), (2, 0.3)],
            vec![(0, 0.1), (3, 0.2)],
            vec![(0, 0.3), (3, 1e-16)],
            vec![(1, 0.2), (2, 1e-16)],
        ];
        let sp = dijkstra(&adjacency, 0);
        assert_eq!(sp.sigma[3], 2.0);
    }

    #[test]
    fn test_simple_paths_respect_cutoff_and_order() {
        let (paths, outcome) = simple_paths(&diamond(), 0, 4, 5, None);
        assert_eq!(paths, vec![vec![0, 1, 3, 4], vec![0, 2, 3, 4]]);
        assert_eq!(outcome.found, 2);
        assert!(!outcome.truncated);

        let (paths, _) = simple_paths(&diamond(), 0, 4, 2, None);
        assert!(paths.is_empty());
    }

    #[test]
    fn test_simple_paths_budget() {
        let (paths, outcome) = simple_paths(&diamond(), 0, 3, 5, Some(1));
        assert_eq!(paths.len(), 1);
        assert!(outcome.truncated);
    }

    #[test]
    fn test_paths_do_not_pass_through_target() {
        let adjacency: Adjacency = vec![vec![(1, 1.0)], vec![(0, 1.0), (2, 1.0)], vec![(1, 1.0)]];
        let (paths, _) = simple_paths(&adjacency, 0, 1, 5, None);
        assert_eq!(paths, vec![vec![0, 1]]);
    }

    #[test]
    fn test_path_weights() {
        let adjacency = diamond();
        let path = [0, 1, 3, 4];
        assert_abs_diff_eq!(path_weight_product(&adjacency, &path), 0.25);
        assert_abs_diff_eq!(path_weight_sum(&adjacency, &path), 2.0);
        assert_eq!(edge_weight(&adjacency, 0, 4), None);
    }
}
