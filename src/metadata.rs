use chrono::NaiveDateTime;
use std::path::Path;

use crate::models::{CalendarDate, Coordinates};

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

// Extensions the object detection model accepts
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "webp", "dng", "tif", "tiff", "mpo", "jpg", "bmp", "heic", "png", "jpeg", "pfm",
];

/// Canonical `"<lat>,<lon>"` form stored in the catalog, 4 decimal places.
pub fn format_location(latitude: f64, longitude: f64) -> String {
    format!("{},{}", round4(latitude), round4(longitude))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Degrees, minutes and seconds to signed decimal degrees.
/// `S` and `W` hemispheres are negative.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64, hemisphere: char) -> f64 {
    let value = degrees + minutes / 60.0 + seconds / 3600.0;
    match hemisphere.to_ascii_uppercase() {
        'S' | 'W' => -value,
        _ => value,
    }
}

/// Parses a catalog location string. Anything but two finite numbers is `None`.
pub fn parse_location(location: &str) -> Option<Coordinates> {
    let mut parts = location.split(',').map(|part| part.trim().parse::<f64>());
    let latitude = parts.next()?.ok()?;
    let longitude = parts.next()?.ok()?;
    if parts.next().is_some() || !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    Some(Coordinates {
        latitude,
        longitude,
    })
}

/// Reads year, month and day from the date part of an EXIF-style timestamp.
///
/// Only the digits are checked, so placeholder dates such as
/// `0000:00:00 00:00:00` still parse.
pub fn parse_timestamp_date(timestamp: &str) -> Option<CalendarDate> {
    let date = timestamp.split_whitespace().next()?;
    let values = date
        .split(':')
        .map(|part| part.parse::<i32>())
        .collect::<Result<Vec<_>, _>>()
        .ok()?;

    match values.as_slice() {
        [year, month, day] => Some(CalendarDate {
            year: *year,
            month: *month,
            day: *day,
        }),
        _ => None,
    }
}

/// `"40.7128,-74.006"` -> `"40.7128°  N, 74.006°  W"`
pub fn location_to_readable(location: &str) -> Option<String> {
    let coordinates = parse_location(location)?;
    let latitude_dir = if coordinates.latitude < 0.0 { 'S' } else { 'N' };
    let longitude_dir = if coordinates.longitude < 0.0 { 'W' } else { 'E' };

    Some(format!(
        "{}°  {}, {}°  {}",
        coordinates.latitude.abs(),
        latitude_dir,
        coordinates.longitude.abs(),
        longitude_dir
    ))
}

/// `"2021:03:05 15:07:42"` -> `"March 5, 2021  3:07 PM"`
pub fn timestamp_to_readable(timestamp: &str) -> Option<String> {
    let datetime = NaiveDateTime::parse_from_str(timestamp.trim(), EXIF_DATETIME_FORMAT).ok()?;
    Some(datetime.format("%B %-d, %Y  %-I:%M %p").to_string())
}

/// Whether the detection stage can index this file, by extension.
pub fn is_supported_media(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
