//! Vector similarity helpers.

/// Dot product of two equal-length vectors.
///
/// Extra trailing elements of the longer slice are ignored.
#[must_use]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean (L2) norm.
#[must_use]
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Cosine similarity `(a·b) / (‖a‖‖b‖)`.
///
/// Returns `None` when either vector has zero magnitude or the result is
/// not finite, rather than dividing by zero.
#[must_use]
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    cosine_with_norm(a, norm(a), b)
}

/// Cosine similarity with the norm of `a` already known.
///
/// Lets the engine compute the seed norm once per query.
#[must_use]
pub(crate) fn cosine_with_norm(a: &[f64], norm_a: f64, b: &[f64]) -> Option<f64> {
    let norm_b = norm(b);
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return None;
    }
    let cosine = dot(a, b) / (norm_a * norm_b);
    cosine.is_finite().then_some(cosine)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_dot_and_norm() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
        assert_eq!(norm(&[]), 0.0);
    }

    #[test]
    fn test_identical_vectors_score_one() {
        let v = [0.7, 0.8, 0.05, 0.1, 0.0, 0.6, 120.0];
        let score = cosine_similarity(&v, &v).unwrap();
        assert!((score - 1.0).abs() < EPS);
    }

    #[test]
    fn test_scaled_vectors_score_one() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!((cosine_similarity(&a, &b).unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap().abs() < EPS);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap() + 1.0).abs() < EPS);
    }

    #[test]
    fn test_zero_vector_is_degenerate() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), None);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), None);
    }

    #[test]
    fn test_non_finite_is_rejected() {
        assert_eq!(cosine_similarity(&[f64::NAN, 1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn test_scores_stay_in_range() {
        let vectors = [
            [0.1, 0.9, 0.3, 0.0, 0.2, 0.5, 95.0],
            [0.9, 0.1, 0.0, 0.8, 0.0, 0.1, 180.0],
            [-0.5, 0.2, 0.4, 0.1, -0.9, 0.3, -60.0],
            [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
        ];
        for a in &vectors {
            for b in &vectors {
                let score = cosine_similarity(a, b).unwrap();
                assert!((-1.0 - EPS..=1.0 + EPS).contains(&score), "{score}");
            }
        }
    }
}
