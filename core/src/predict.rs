use crate::error::{RecError, Result};
use crate::similarity::checked_cosine_similarity;
use crate::vocab::FeatureIndex;
use crate::{ItemId, UserId};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One historical (or query) rating. Field names follow the MovieLens CSV header.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: ItemId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: ItemId, rating: f64) -> Self {
        Self { user_id, movie_id, rating }
    }
}

/// What to predict for a user with no usable training ratings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoHistoryPolicy {
    /// Mean of every training rating.
    #[default]
    GlobalMean,
    /// Fail with `RecError::NoTrainingRatings`.
    Fail,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictorConfig {
    pub no_history: NoHistoryPolicy,
    /// Spread queries over the rayon pool. Output order is unchanged.
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PredictionSource {
    /// Similarity-weighted average over `contributors` rated items.
    Weighted { contributors: usize },
    /// No positively similar rated item; the user's mean rating.
    UserMean,
    /// The user had no training ratings at all.
    GlobalMean,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub value: f64,
    pub source: PredictionSource,
}

impl Prediction {
    pub fn is_fallback(&self) -> bool {
        !matches!(self.source, PredictionSource::Weighted { .. })
    }
}

/// Training ratings grouped per user, each keyed by the rated item's slot in
/// the feature index.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    by_user: HashMap<UserId, Vec<(usize, f64)>>,
    global_mean: Option<f64>,
    dropped: usize,
}

impl TrainingSet {
    /// Ratings for items missing from `index` are dropped and counted.
    pub fn new(index: &FeatureIndex, ratings: &[Rating]) -> Self {
        let mut by_user: HashMap<UserId, Vec<(usize, f64)>> = HashMap::new();
        let mut dropped = 0usize;
        let mut sum = 0.0;
        let mut kept = 0usize;
        for r in ratings {
            match index.slot(r.movie_id) {
                Ok(slot) => {
                    by_user.entry(r.user_id).or_default().push((slot, r.rating));
                    sum += r.rating;
                    kept += 1;
                }
                Err(_) => dropped += 1,
            }
        }
        if dropped > 0 {
            tracing::warn!(dropped, "training ratings reference items missing from the item table");
        }
        let global_mean = if kept > 0 { Some(sum / kept as f64) } else { None };
        Self { by_user, global_mean, dropped }
    }

    pub fn ratings_for(&self, user: UserId) -> &[(usize, f64)] {
        self.by_user.get(&user).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn num_users(&self) -> usize { self.by_user.len() }

    pub fn global_mean(&self) -> Option<f64> { self.global_mean }

    pub fn dropped(&self) -> usize { self.dropped }

    /// Arithmetic mean of a user's ratings; `None` when the user has none.
    pub fn user_mean(&self, user: UserId) -> Option<f64> {
        let rated = self.ratings_for(user);
        if rated.is_empty() {
            return None;
        }
        Some(rated.iter().map(|(_, r)| r).sum::<f64>() / rated.len() as f64)
    }
}

/// Content-based rating predictor over a shared, read-only feature index.
pub struct Predictor<'a> {
    index: &'a FeatureIndex,
    training: TrainingSet,
    config: PredictorConfig,
}

impl<'a> Predictor<'a> {
    pub fn new(index: &'a FeatureIndex, train: &[Rating], config: PredictorConfig) -> Self {
        let training = TrainingSet::new(index, train);
        tracing::info!(users = training.num_users(), ratings = train.len() - training.dropped(), "loaded training ratings");
        Self { index, training, config }
    }

    pub fn training(&self) -> &TrainingSet { &self.training }

    /// Predict the rating `user` would give `item`.
    pub fn predict(&self, user: UserId, item: ItemId) -> Result<Prediction> {
        let target = self.index.vector(item)?;
        let rated = self.training.ratings_for(user);

        let mut weighted = 0.0;
        let mut total_sim = 0.0;
        let mut contributors = 0usize;
        for (slot, rating) in rated {
            let sim = match checked_cosine_similarity(self.index.vector_at(*slot), target) {
                Some(s) if s > 0.0 => s,
                _ => continue,
            };
            weighted += sim * rating;
            total_sim += sim;
            contributors += 1;
        }

        if contributors > 0 && total_sim > 0.0 {
            return Ok(Prediction { value: weighted / total_sim, source: PredictionSource::Weighted { contributors } });
        }

        if let Some(mean) = self.training.user_mean(user) {
            tracing::debug!(user, item, rating = mean, "fallback to average rating");
            return Ok(Prediction { value: mean, source: PredictionSource::UserMean });
        }

        match self.config.no_history {
            NoHistoryPolicy::Fail => Err(RecError::NoTrainingRatings(user)),
            NoHistoryPolicy::GlobalMean => {
                let mean = self.training.global_mean().ok_or(RecError::EmptyTrainingSet)?;
                tracing::debug!(user, item, rating = mean, "no training ratings, fallback to global mean");
                Ok(Prediction { value: mean, source: PredictionSource::GlobalMean })
            }
        }
    }

    /// One prediction per query, position-aligned with `queries`.
    pub fn predict_all(&self, queries: &[Rating]) -> Result<Vec<Prediction>> {
        if self.config.parallel {
            queries.par_iter().map(|q| self.predict(q.user_id, q.movie_id)).collect()
        } else {
            queries.iter().map(|q| self.predict(q.user_id, q.movie_id)).collect()
        }
    }
}
