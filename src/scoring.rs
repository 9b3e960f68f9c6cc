//! Per-axis similarity scores that the ranking pass sums into a photo total.
//!
//! Metadata axes decay exponentially: an exact match earns the full axis
//! weight and every unit of distance divides it by [`METADATA_STRICTNESS`].
//! Latitude and longitude are scored separately so that a generator that
//! drops a minus sign still earns credit on the other coordinate.

use std::collections::HashSet;

// Decay base for every metadata axis, must stay above 1
pub const METADATA_STRICTNESS: f64 = 5.0;

// Axis weights
pub const LOCATION_WEIGHT: f64 = 10.0;
pub const YEAR_WEIGHT: f64 = 7.0;
pub const MONTH_WEIGHT: f64 = 7.0;
pub const DAY_WEIGHT: f64 = 7.0;
pub const MATCH_WEIGHT: f64 = 7.0;

/// `METADATA_STRICTNESS^(-|a - b|) * weight`
pub fn axis_score(a: f64, b: f64, weight: f64) -> f64 {
    METADATA_STRICTNESS.powf(-(a - b).abs()) * weight
}

/// Counts photo tags present in the query, each photo tag at most once.
pub fn tag_match_score<S, I>(query_tags: &[S], photo_tags: I) -> f64
where
    S: AsRef<str>,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let requested: HashSet<String> = query_tags
        .iter()
        .map(|tag| tag.as_ref().to_lowercase())
        .collect();

    let matches = photo_tags
        .into_iter()
        .filter(|tag| requested.contains(&tag.as_ref().to_lowercase()))
        .count();

    matches as f64 * MATCH_WEIGHT
}

/// Highest total a photo can reach for a query with `tag_count` tags and both
/// metadata axes present.
pub fn max_attainable_score(tag_count: usize) -> f64 {
    tag_count as f64 * MATCH_WEIGHT + 2.0 * LOCATION_WEIGHT + YEAR_WEIGHT + MONTH_WEIGHT + DAY_WEIGHT
}
