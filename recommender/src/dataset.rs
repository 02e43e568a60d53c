use anyhow::{Context, Result};
use reco_core::{ItemId, Rating};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: ItemId,
    #[serde(default)]
    genres: Option<String>,
}

/// Read `movieId,title,genres` rows. A missing genres cell becomes the empty string.
pub fn load_movies(path: &Path) -> Result<Vec<(ItemId, String)>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("open movies file {}", path.display()))?;
    let mut out = Vec::new();
    for (line, row) in reader.deserialize::<MovieRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad movie row {}", path.display(), line + 2))?;
        // missing genres give no tokens (see `tokenize_field`), not a "nan" term
        out.push((row.movie_id, row.genres.unwrap_or_default()));
    }
    tracing::info!(path = %path.display(), movies = out.len(), "loaded movies");
    Ok(out)
}

/// Read `userId,movieId,rating[,timestamp]` rows in file order.
pub fn load_ratings(path: &Path) -> Result<Vec<Rating>> {
    let mut reader = csv::Reader::from_path(path).with_context(|| format!("open ratings file {}", path.display()))?;
    let mut out = Vec::new();
    for (line, row) in reader.deserialize::<Rating>().enumerate() {
        let row = row.with_context(|| format!("{}: bad rating row {}", path.display(), line + 2))?;
        out.push(row);
    }
    tracing::info!(path = %path.display(), ratings = out.len(), "loaded ratings");
    Ok(out)
}
