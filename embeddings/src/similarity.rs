//! Similarity computation for embeddings.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{EmbeddingError, Result};

/// Signature shared by every scoring function in this module.
pub type ScoreFn = fn(&[f32], &[f32]) -> Result<f32>;

fn check_dimensions(a: &[f32], b: &[f32]) -> Result<()> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(())
}

/// Compute the cosine similarity between two embeddings.
///
/// Returns a value between -1.0 and 1.0, or 0.0 when either vector has zero
/// magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let magnitude_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return Ok(0.0);
    }

    Ok(dot_product / (magnitude_a * magnitude_b))
}

/// Compute the euclidean distance between two embeddings.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();

    Ok(sum.sqrt())
}

/// Euclidean distance folded into `(0, 1]` so that larger is closer.
pub fn euclidean_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    Ok(1.0 / (1.0 + euclidean_distance(a, b)?))
}

/// Compute the dot product between two embeddings.
pub fn dot_product(a: &[f32], b: &[f32]) -> Result<f32> {
    check_dimensions(a, b)?;

    Ok(a.iter().zip(b.iter()).map(|(x, y)| x * y).sum())
}

/// A similarity search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityResult {
    /// ID of the matched item.
    pub id: String,

    /// Similarity score, larger is closer.
    pub score: f32,
}

impl SimilarityResult {
    /// Create a new similarity result.
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
        }
    }
}

/// Score every candidate against `query` and keep the best `k`, highest
/// score first. Ties keep candidate order.
pub fn find_top_k<'a, I>(
    query: &[f32],
    candidates: I,
    k: usize,
    score: ScoreFn,
) -> Result<Vec<SimilarityResult>>
where
    I: IntoIterator<Item = (&'a str, &'a [f32])>,
{
    let mut scores: Vec<(OrderedFloat<f32>, &str)> = Vec::new();

    for (id, embedding) in candidates {
        scores.push((OrderedFloat(score(query, embedding)?), id));
    }

    // Stable sort, descending
    scores.sort_by_key(|entry| Reverse(entry.0));

    Ok(scores
        .into_iter()
        .take(k)
        .map(|(score, id)| SimilarityResult::new(id, score.0))
        .collect())
}

/// Split `items` into consecutive batches of at most `size` elements.
///
/// A `size` of zero is treated as one.
pub fn chunk_list<T>(items: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    items.chunks(size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b).unwrap();
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let sim = cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
        assert_eq!(sim, 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
        assert!(dot_product(&a, &b).is_err());
    }

    #[test]
    fn test_euclidean_similarity() {
        let same = euclidean_similarity(&[1.0, 2.0], &[1.0, 2.0]).unwrap();
        assert!((same - 1.0).abs() < 1e-6);
        let far = euclidean_similarity(&[0.0, 0.0], &[3.0, 4.0]).unwrap();
        assert!((far - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_find_top_k() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let c = [0.7, 0.7, 0.0];
        let candidates: Vec<(&str, &[f32])> = vec![("a", &a[..]), ("b", &b[..]), ("c", &c[..])];

        let results = find_top_k(&[1.0, 0.0, 0.0], candidates, 2, cosine_similarity).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "a");
        assert_eq!(results[1].id, "c");
    }

    #[test]
    fn test_chunk_list() {
        let items: Vec<u32> = (0..250).collect();
        let sizes: Vec<usize> = chunk_list(&items, 100).map(<[u32]>::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
        assert_eq!(chunk_list(&items[..3], 0).count(), 3);
    }
}
