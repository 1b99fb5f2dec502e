use crate::{VectorError, VectorResult};
use rayon::prelude::*;

/// Cosine similarity accumulated in f64. A zero-norm operand yields 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> VectorResult<f64> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch(a.len(), b.len()));
    }

    let mut dot_product = 0.0f64;
    let mut norm_a_squared = 0.0f64;
    let mut norm_b_squared = 0.0f64;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        let (va, vb) = (va as f64, vb as f64);
        dot_product += va * vb;
        norm_a_squared += va * va;
        norm_b_squared += vb * vb;
    }

    let norm_product = (norm_a_squared * norm_b_squared).sqrt();
    if norm_product == 0.0 {
        Ok(0.0)
    } else {
        Ok((dot_product / norm_product).clamp(-1.0, 1.0))
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> VectorResult<f64> {
    if a.len() != b.len() {
        return Err(VectorError::DimensionMismatch(a.len(), b.len()));
    }

    Ok(a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt())
}

/// Population standard deviation per dimension, averaged over dimensions.
pub fn mean_dimension_std(members: &[&[f32]]) -> VectorResult<f64> {
    let first = members.first().ok_or(VectorError::EmptyVector)?;
    let dim = first.len();
    if dim == 0 {
        return Err(VectorError::EmptyVector);
    }

    let n = members.len() as f64;
    let mut total = 0.0f64;
    for d in 0..dim {
        let mut sum = 0.0f64;
        for m in members {
            if m.len() != dim {
                return Err(VectorError::DimensionMismatch(dim, m.len()));
            }
            sum += m[d] as f64;
        }
        let mean = sum / n;
        let var = members
            .iter()
            .map(|m| {
                let diff = m[d] as f64 - mean;
                diff * diff
            })
            .sum::<f64>()
            / n;
        total += var.sqrt();
    }

    Ok(total / dim as f64)
}

/// Verify all vectors share one non-zero dimension and return it.
pub fn common_dimension(vectors: &[Vec<f32>]) -> VectorResult<usize> {
    let first = vectors.first().ok_or(VectorError::EmptyVector)?;
    let dim = first.len();
    if dim == 0 {
        return Err(VectorError::EmptyVector);
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(VectorError::DimensionMismatch(dim, bad.len()));
    }
    Ok(dim)
}

/// All unordered pairs `(i, j)`, `i < j`, whose cosine similarity is
/// positive and at least `threshold`, in row-major order. Rows are
/// computed in parallel.
pub fn similar_pairs(
    vectors: &[Vec<f32>],
    threshold: f64,
) -> VectorResult<Vec<(usize, usize, f64)>> {
    let rows: Vec<Vec<(usize, usize, f64)>> = (0..vectors.len())
        .into_par_iter()
        .map(|i| {
            let mut row = Vec::new();
            for j in (i + 1)..vectors.len() {
                let sim = cosine_similarity(&vectors[i], &vectors[j])?;
                // edge weights live in (0, 1]
                if sim > 0.0 && sim >= threshold {
                    row.push((i, j, sim));
                }
            }
            Ok(row)
        })
        .collect::<VectorResult<Vec<_>>>()?;

    Ok(rows.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_cosine_similarity_basics() {
        let a = vec![1.0, 0.0];
        let b = vec![0.8, 0.6];
        assert_abs_diff_eq!(cosine_similarity(&a, &b).unwrap(), 0.8, epsilon = 1e-6);
        assert_abs_diff_eq!(cosine_similarity(&a, &a).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0]).unwrap(), 0.0);
        assert!(matches!(
            cosine_similarity(&a, &[1.0]),
            Err(VectorError::DimensionMismatch(2, 1))
        ));
    }

    #[test]
    fn test_euclidean_distance() {
        assert_abs_diff_eq!(
            euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]).unwrap(),
            5.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_mean_dimension_std_is_population_std() {
        let a = [0.0f32, 2.0];
        let b = [2.0f32, 2.0];
        // dim 0: std 1.0, dim 1: std 0.0
        let std = mean_dimension_std(&[&a, &b]).unwrap();
        assert_abs_diff_eq!(std, 0.5, epsilon = 1e-12);

        let single = mean_dimension_std(&[&a]).unwrap();
        assert_eq!(single, 0.0);
    }

    #[test]
    fn test_similar_pairs_row_major_order() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.01],
        ];
        let pairs = similar_pairs(&vectors, 0.9).unwrap();
        let ids: Vec<(usize, usize)> = pairs.iter().map(|(i, j, _)| (*i, *j)).collect();
        assert_eq!(ids, vec![(0, 1), (0, 3), (1, 3)]);
    }

    #[test]
    fn test_similar_pairs_skips_orthogonal_at_zero_threshold() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];
        let pairs = similar_pairs(&vectors, 0.0).unwrap();
        let indices: Vec<(usize, usize)> = pairs.iter().map(|&(i, j, _)| (i, j)).collect();
        assert_eq!(indices, vec![(0, 2), (1, 2)]);
        assert!(pairs.iter().all(|&(_, _, w)| w > 0.0));
    }

    #[test]
    fn test_common_dimension_rejects_ragged() {
        assert_eq!(common_dimension(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(), 2);
        assert!(common_dimension(&[vec![1.0, 2.0], vec![3.0]]).is_err());
        assert!(common_dimension(&[]).is_err());
    }
}
