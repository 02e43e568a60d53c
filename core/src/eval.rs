//! Deterministic train/test split and error reporting for batch experiments.

use crate::error::{RecError, Result};
use crate::predict::{Prediction, Rating};

/// Every `every`-th record (positions 0, every, 2*every, ...) goes to the test
/// set. Both halves keep the input order.
pub fn train_test_split(ratings: &[Rating], every: usize) -> Result<(Vec<Rating>, Vec<Rating>)> {
    if every == 0 {
        return Err(RecError::InvalidSplit(every));
    }
    let (test, train): (Vec<(usize, &Rating)>, Vec<(usize, &Rating)>) =
        ratings.iter().enumerate().partition(|(i, _)| i % every == 0);
    let train = train.into_iter().map(|(_, r)| *r).collect();
    let test = test.into_iter().map(|(_, r)| *r).collect();
    Ok((train, test))
}

/// Mean of |prediction - actual| over position-aligned pairs.
pub fn mean_absolute_error(predictions: &[Prediction], actual: &[Rating]) -> Result<f64> {
    if predictions.len() != actual.len() {
        return Err(RecError::LengthMismatch { predictions: predictions.len(), actual: actual.len() });
    }
    if actual.is_empty() {
        return Err(RecError::EmptyTestSet);
    }
    let total: f64 = predictions.iter().zip(actual).map(|(p, a)| (p.value - a.rating).abs()).sum();
    Ok(total / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::PredictionSource;

    fn ratings(n: usize) -> Vec<Rating> {
        (0..n).map(|i| Rating::new(1, i as u32, 1.0)).collect()
    }

    #[test]
    fn split_takes_every_nth_into_test() {
        let (train, test) = train_test_split(&ratings(7), 3).unwrap();
        let test_ids: Vec<u32> = test.iter().map(|r| r.movie_id).collect();
        let train_ids: Vec<u32> = train.iter().map(|r| r.movie_id).collect();
        assert_eq!(test_ids, vec![0, 3, 6]);
        assert_eq!(train_ids, vec![1, 2, 4, 5]);
    }

    #[test]
    fn split_rejects_zero_interval() {
        assert_eq!(train_test_split(&ratings(3), 0).unwrap_err(), RecError::InvalidSplit(0));
    }

    #[test]
    fn mae_over_aligned_pairs() {
        let preds: Vec<Prediction> = [3.0, 4.5]
            .iter()
            .map(|v| Prediction { value: *v, source: PredictionSource::UserMean })
            .collect();
        let actual = vec![Rating::new(1, 1, 4.0), Rating::new(1, 2, 4.0)];
        assert!((mean_absolute_error(&preds, &actual).unwrap() - 0.75).abs() < 1e-12);
        assert_eq!(
            mean_absolute_error(&preds[..1], &actual).unwrap_err(),
            RecError::LengthMismatch { predictions: 1, actual: 2 }
        );
        assert_eq!(mean_absolute_error(&[], &[]).unwrap_err(), RecError::EmptyTestSet);
    }
}
