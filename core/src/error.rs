use crate::{ItemId, UserId};
use thiserror::Error;

/// Failures raised by the recommendation pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecError {
    /// A query referenced an item absent from the item table.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    #[error("duplicate item id {0} in item table")]
    DuplicateItem(ItemId),

    /// The queried user has no training ratings and the policy forbids a global fallback.
    #[error("user {0} has no training ratings")]
    NoTrainingRatings(UserId),

    #[error("training set is empty, no global mean rating")]
    EmptyTrainingSet,

    #[error("test set is empty")]
    EmptyTestSet,

    #[error("length mismatch: {predictions} predictions, {actual} actual ratings")]
    LengthMismatch { predictions: usize, actual: usize },

    #[error("invalid split interval {0}, must be at least 1")]
    InvalidSplit(usize),
}

pub type Result<T> = std::result::Result<T, RecError>;
