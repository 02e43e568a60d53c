use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use reco_core::eval::{mean_absolute_error, train_test_split};
use reco_core::{FeatureIndex, NoHistoryPolicy, Prediction, PredictionSource, Predictor, PredictorConfig, Rating, Vocabulary};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use std::fs;
use std::path::{Path, PathBuf};

mod dataset;

#[derive(Parser)]
#[command(name = "recommender")]
#[command(about = "Content-based movie rating prediction over genre TF-IDF vectors", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Vectorize movies, predict held-out ratings and report MAE
    Run {
        /// movies.csv (movieId,title,genres)
        #[arg(long)]
        movies: PathBuf,
        /// ratings.csv (userId,movieId,rating,timestamp)
        #[arg(long)]
        ratings: PathBuf,
        /// Every n-th rating is held out for testing
        #[arg(long, default_value_t = 1000)]
        test_every: usize,
        /// What to predict for users with no training ratings
        #[arg(long, value_enum, default_value_t = NoHistory::GlobalMean)]
        no_history: NoHistory,
        /// Predict queries on the rayon thread pool
        #[arg(long, default_value_t = false)]
        parallel: bool,
        /// Write a JSON report to this path
        #[arg(long)]
        report: Option<PathBuf>,
        /// Number of predictions to print
        #[arg(long, default_value_t = 10)]
        show: usize,
    },
    /// Print the vocabulary built from the movie genres
    Vocab {
        #[arg(long)]
        movies: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum NoHistory {
    GlobalMean,
    Fail,
}

impl From<NoHistory> for NoHistoryPolicy {
    fn from(v: NoHistory) -> Self {
        match v {
            NoHistory::GlobalMean => NoHistoryPolicy::GlobalMean,
            NoHistory::Fail => NoHistoryPolicy::Fail,
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct SourceCounts {
    weighted: usize,
    user_mean: usize,
    global_mean: usize,
}

#[derive(Serialize)]
struct PredictionRow {
    user_id: u32,
    movie_id: u32,
    predicted: f64,
    actual: f64,
    source: PredictionSource,
}

#[derive(Serialize)]
struct RunReport<'a> {
    created_at: String,
    num_items: usize,
    vocab_size: usize,
    vocabulary: &'a Vocabulary,
    num_train: usize,
    num_test: usize,
    sources: SourceCounts,
    mae: f64,
    predictions: Vec<PredictionRow>,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { movies, ratings, test_every, no_history, parallel, report, show } => {
            let config = PredictorConfig { no_history: no_history.into(), parallel };
            run(&movies, &ratings, test_every, config, report.as_deref(), show)
        }
        Commands::Vocab { movies, limit } => print_vocab(&movies, limit),
    }
}

fn build_index(movies: &Path) -> Result<FeatureIndex> {
    let records = dataset::load_movies(movies)?;
    let index = FeatureIndex::build(records).context("vectorize movies")?;
    Ok(index)
}

/// Header plus the first `limit` terms with their indices.
fn vocab_preview(vocab: &Vocabulary, limit: usize) -> Vec<String> {
    let mut lines = vec![format!("vocab (size={}):", vocab.len())];
    lines.extend(vocab.iter().take(limit).map(|(term, id)| format!("  {id:>4}  {term}")));
    lines
}

fn print_vocab(movies: &Path, limit: usize) -> Result<()> {
    let index = build_index(movies)?;
    for line in vocab_preview(&index.vocabulary, limit) {
        println!("{line}");
    }
    Ok(())
}

fn run(movies: &Path, ratings: &Path, test_every: usize, config: PredictorConfig, report: Option<&Path>, show: usize) -> Result<()> {
    let index = build_index(movies)?;
    let all = dataset::load_ratings(ratings)?;
    let (train, test) = train_test_split(&all, test_every)?;
    println!("{} movies", index.len());
    for line in vocab_preview(&index.vocabulary, 10) {
        println!("{line}");
    }
    println!("{} training ratings; {} testing ratings", train.len(), test.len());

    let predictor = Predictor::new(&index, &train, config);
    let predictions = predictor.predict_all(&test).context("predict test ratings")?;
    let mae = mean_absolute_error(&predictions, &test)?;
    let sources = count_sources(&predictions);
    tracing::info!(mae, weighted = sources.weighted, user_mean = sources.user_mean, global_mean = sources.global_mean, "prediction complete");

    println!("error={mae:.6}");
    for (p, q) in predictions.iter().zip(&test).take(show) {
        println!("  user {:>5} movie {:>7}  predicted {:.3}  actual {:.1}", q.user_id, q.movie_id, p.value, q.rating);
    }

    if let Some(path) = report {
        write_report(path, &index, &train, &test, &predictions, sources, mae)?;
    }
    Ok(())
}

fn count_sources(predictions: &[Prediction]) -> SourceCounts {
    let mut counts = SourceCounts::default();
    for p in predictions {
        match p.source {
            PredictionSource::Weighted { .. } => counts.weighted += 1,
            PredictionSource::UserMean => counts.user_mean += 1,
            PredictionSource::GlobalMean => counts.global_mean += 1,
        }
    }
    counts
}

fn write_report(
    path: &Path,
    index: &FeatureIndex,
    train: &[Rating],
    test: &[Rating],
    predictions: &[Prediction],
    sources: SourceCounts,
    mae: f64,
) -> Result<()> {
    let rows = predictions
        .iter()
        .zip(test)
        .map(|(p, q)| PredictionRow { user_id: q.user_id, movie_id: q.movie_id, predicted: p.value, actual: q.rating, source: p.source })
        .collect();
    let report = RunReport {
        created_at: time::OffsetDateTime::now_utc().format(&time::format_description::well_known::Rfc3339).unwrap_or_else(|_| "".into()),
        num_items: index.len(),
        vocab_size: index.vocabulary.len(),
        vocabulary: &index.vocabulary,
        num_train: train.len(),
        num_test: test.len(),
        sources,
        mae,
        predictions: rows,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(&report)?;
    fs::write(path, json).with_context(|| format!("write report {}", path.display()))?;
    tracing::info!(path = %path.display(), "report written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn run_writes_report() {
        let dir = tempdir().unwrap();
        let movies = dir.path().join("movies.csv");
        let ratings = dir.path().join("ratings.csv");
        let mut f = fs::File::create(&movies).unwrap();
        writeln!(f, "movieId,title,genres").unwrap();
        writeln!(f, "1,A,Action|Comedy").unwrap();
        writeln!(f, "2,B,Action").unwrap();
        writeln!(f, "3,C,Drama").unwrap();
        let mut f = fs::File::create(&ratings).unwrap();
        writeln!(f, "userId,movieId,rating,timestamp").unwrap();
        writeln!(f, "1,2,4.0,0").unwrap();
        writeln!(f, "1,1,5.0,0").unwrap();
        writeln!(f, "1,3,1.0,0").unwrap();
        writeln!(f, "2,3,2.0,0").unwrap();

        let report = dir.path().join("out/report.json");
        run(&movies, &ratings, 2, PredictorConfig::default(), Some(&report), 0).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(json["num_items"], 3);
        assert_eq!(json["vocab_size"], 3);
        assert_eq!(json["vocabulary"]["terms"], serde_json::json!(["action", "comedy", "drama"]));
        assert_eq!(json["num_test"], 2);
        let preds = json["predictions"].as_array().unwrap();
        assert_eq!(preds.len(), 2);
        // user 1 movie 2: only movie 1 shares a genre
        assert!((preds[0]["predicted"].as_f64().unwrap() - 5.0).abs() < 1e-9);
        // user 1 movie 3: nothing similar, falls back to the user's mean
        assert!((preds[1]["predicted"].as_f64().unwrap() - 5.0).abs() < 1e-9);
        assert_eq!(json["sources"]["weighted"], 1);
        assert_eq!(json["sources"]["user_mean"], 1);
    }

    #[test]
    fn vocab_preview_lists_terms_in_index_order() {
        let index = FeatureIndex::build(vec![(1, "Thriller|Action"), (2, "Sci-Fi|Comedy|Drama")]).unwrap();
        let lines = vocab_preview(&index.vocabulary, 3);
        assert_eq!(lines, vec!["vocab (size=5):", "     0  action", "     1  comedy", "     2  drama"]);
        assert_eq!(vocab_preview(&index.vocabulary, 10).len(), 6);
    }
}
