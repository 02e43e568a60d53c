pub mod error;
pub mod eval;
pub mod predict;
pub mod similarity;
pub mod tokenizer;
pub mod vocab;

pub use error::{RecError, Result};
pub use predict::{NoHistoryPolicy, Prediction, PredictionSource, Predictor, PredictorConfig, Rating, TrainingSet};
pub use similarity::{checked_cosine_similarity, cosine_similarity, FeatureVector};
pub use vocab::{FeatureIndex, Vocabulary};

pub type TermId = u32;
pub type ItemId = u32;
pub type UserId = u32;
