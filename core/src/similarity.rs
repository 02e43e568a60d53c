use crate::TermId;
use std::cmp::Ordering;

/// Sparse TF-IDF vector over the vocabulary index space.
///
/// `indices` are strictly ascending; `values` are aligned with them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    dim: usize,
    indices: Vec<TermId>,
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn zeros(dim: usize) -> Self {
        Self { dim, indices: Vec::new(), values: Vec::new() }
    }

    /// Build from (index, value) pairs in any order. Zero values are dropped,
    /// repeated indices are summed.
    pub fn from_pairs<I>(dim: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (TermId, f64)>,
    {
        let mut pairs: Vec<(TermId, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|(i, _)| *i);
        let mut indices: Vec<TermId> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (i, v) in pairs {
            debug_assert!((i as usize) < dim, "index {i} out of range for dim {dim}");
            if indices.last() == Some(&i) {
                if let Some(last) = values.last_mut() { *last += v; }
            } else {
                indices.push(i);
                values.push(v);
            }
        }
        let (indices, values): (Vec<TermId>, Vec<f64>) = indices.into_iter().zip(values).filter(|(_, v)| *v != 0.0).unzip();
        Self { dim, indices, values }
    }

    /// Dense input, mostly for tests and inspection.
    pub fn from_dense(values: &[f64]) -> Self {
        let pairs = values.iter().enumerate().map(|(i, v)| (i as TermId, *v));
        Self::from_pairs(values.len(), pairs)
    }

    pub fn dim(&self) -> usize { self.dim }

    pub fn nnz(&self) -> usize { self.indices.len() }

    pub fn is_zero(&self) -> bool { self.indices.is_empty() }

    pub fn indices(&self) -> &[TermId] { &self.indices }

    pub fn values(&self) -> &[f64] { &self.values }

    pub fn get(&self, index: TermId) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn to_dense(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.dim];
        for (i, v) in self.iter() {
            out[i as usize] = v;
        }
        out
    }

    /// Merge-join over the sorted index lists.
    pub fn dot(&self, other: &FeatureVector) -> f64 {
        let (mut i, mut j) = (0usize, 0usize);
        let mut sum = 0.0;
        while i < self.indices.len() && j < other.indices.len() {
            match self.indices[i].cmp(&other.indices[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    sum += self.values[i] * other.values[j];
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }

    /// Euclidean (L2) norm.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// Cosine similarity, or `None` when either vector has zero norm.
pub fn checked_cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> Option<f64> {
    debug_assert_eq!(a.dim(), b.dim(), "feature vectors must share a vocabulary");
    let denom = a.norm() * b.norm();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some(a.dot(b) / denom)
}

/// Cosine similarity with the undefined case (a zero vector) mapped to 0.0.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    checked_cosine_similarity(a, b).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn cosine_of_known_vectors() {
        let a = FeatureVector::from_dense(&[0., 0., 3., 0., 4.]);
        let b = FeatureVector::from_dense(&[0., 0., 3., 4., 0.]);
        assert!((cosine_similarity(&a, &b) - 0.36).abs() < EPS);
    }

    #[test]
    fn symmetric_and_self_similar() {
        let a = FeatureVector::from_dense(&[0.2, 0.0, 1.5, 0.7]);
        let b = FeatureVector::from_dense(&[0.0, 0.9, 0.3, 0.1]);
        assert!((cosine_similarity(&a, &b) - cosine_similarity(&b, &a)).abs() < EPS);
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < EPS);
    }

    #[test]
    fn zero_vector_is_undefined() {
        let a = FeatureVector::zeros(3);
        let b = FeatureVector::from_dense(&[1.0, 0.0, 0.0]);
        assert_eq!(checked_cosine_similarity(&a, &b), None);
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &a), 0.0);
    }

    #[test]
    fn disjoint_vectors_are_orthogonal() {
        let a = FeatureVector::from_pairs(4, vec![(0, 1.0), (2, 2.0)]);
        let b = FeatureVector::from_pairs(4, vec![(3, 5.0), (1, 1.0)]);
        assert_eq!(checked_cosine_similarity(&a, &b), Some(0.0));
    }

    #[test]
    fn from_pairs_sorts_and_drops_zeros() {
        let v = FeatureVector::from_pairs(5, vec![(4, 1.0), (1, 0.0), (2, 0.5)]);
        assert_eq!(v.indices(), &[2, 4]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(4), 1.0);
        assert_eq!(v.get(1), 0.0);
        assert_eq!(v.to_dense(), vec![0.0, 0.0, 0.5, 0.0, 1.0]);
    }
}
