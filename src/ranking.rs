use std::cmp::Ordering;

use crate::metadata::{parse_location, parse_timestamp_date};
use crate::models::{PhotoRecord, ScoredCandidate, StructuredQuery};
use crate::scoring::{
    axis_score, tag_match_score, DAY_WEIGHT, LOCATION_WEIGHT, MONTH_WEIGHT, YEAR_WEIGHT,
};

/// Sum of every axis both sides provide, plus the tag overlap.
pub fn score_photo(photo: &PhotoRecord, query: &StructuredQuery) -> f64 {
    let mut total_score = 0.0;

    if let (Some(location), Some(requested)) = (photo.location.as_deref(), query.location) {
        match parse_location(location) {
            Some(coordinates) => {
                let latitude_score =
                    axis_score(coordinates.latitude, requested.latitude, LOCATION_WEIGHT);
                let longitude_score =
                    axis_score(coordinates.longitude, requested.longitude, LOCATION_WEIGHT);
                log::trace!(
                    "{}: latitude/longitude scores {}, {}",
                    photo.filepath,
                    latitude_score,
                    longitude_score
                );
                total_score += latitude_score + longitude_score;
            }
            None => log::debug!(
                "{}: ignoring unreadable location '{}'",
                photo.filepath,
                location
            ),
        }
    }

    if let (Some(timestamp), Some(requested)) = (photo.timestamp.as_deref(), query.timestamp) {
        match parse_timestamp_date(timestamp) {
            Some(date) => {
                let year_score =
                    axis_score(date.year as f64, requested.year as f64, YEAR_WEIGHT);
                let month_score =
                    axis_score(date.month as f64, requested.month as f64, MONTH_WEIGHT);
                let day_score = axis_score(date.day as f64, requested.day as f64, DAY_WEIGHT);
                log::trace!(
                    "{}: year/month/day scores {}, {}, {}",
                    photo.filepath,
                    year_score,
                    month_score,
                    day_score
                );
                total_score += year_score + month_score + day_score;
            }
            None => log::debug!(
                "{}: ignoring unreadable timestamp '{}'",
                photo.filepath,
                timestamp
            ),
        }
    }

    total_score += tag_match_score(query.tags.as_slice(), &photo.tags);
    total_score
}

/// Scores every photo, drops non-positive totals and keeps the best
/// `max_results`. Equal totals are ordered by filepath.
pub fn rank_scored(
    photos: &[PhotoRecord],
    query: &StructuredQuery,
    max_results: usize,
) -> Vec<ScoredCandidate> {
    let mut candidates: Vec<ScoredCandidate> = photos
        .iter()
        .map(|photo| ScoredCandidate {
            total_score: score_photo(photo, query),
            filepath: photo.filepath.clone(),
        })
        .filter(|candidate| candidate.total_score > 0.0)
        .collect();

    candidates.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.filepath.cmp(&b.filepath))
    });
    candidates.truncate(max_results);

    log::debug!(
        "Ranked {} photos, kept {} (max {})",
        photos.len(),
        candidates.len(),
        max_results
    );

    candidates
}

/// Filepaths of the best matching photos, best first.
pub fn rank(photos: &[PhotoRecord], query: &StructuredQuery, max_results: usize) -> Vec<String> {
    rank_scored(photos, query, max_results)
        .into_iter()
        .map(|candidate| candidate.filepath)
        .collect()
}
