use serde::Serialize;
use std::collections::BTreeSet;

/// One indexed photo as the catalog stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub filepath: String,
    pub folder_path: String,
    /// Canonical `"<lat>,<lon>"`, decimal degrees rounded to 4 places.
    pub location: Option<String>,
    /// Canonical `"YYYY:MM:DD HH:MM:SS"`.
    pub timestamp: Option<String>,
    pub tags: BTreeSet<String>,
}

impl PhotoRecord {
    pub fn new(filepath: &str, folder_path: &str) -> Self {
        PhotoRecord {
            filepath: filepath.to_string(),
            folder_path: folder_path.to_string(),
            location: None,
            timestamp: None,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = tags
            .into_iter()
            .map(|tag| tag.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = Some(timestamp.to_string());
        self
    }
}

/// Input for a catalog insert, as produced by the detection and EXIF stages.
#[derive(Debug, Clone, Default)]
pub struct NewPhoto {
    pub filepath: String,
    pub folder_path: String,
    pub location: Option<String>,
    pub timestamp: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// A free-text request translated into tags and optional metadata axes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructuredQuery {
    pub tags: Vec<String>,
    pub location: Option<Coordinates>,
    pub timestamp: Option<CalendarDate>,
}

impl StructuredQuery {
    pub fn from_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StructuredQuery {
            tags: tags.into_iter().map(Into::into).collect(),
            location: None,
            timestamp: None,
        }
    }

    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Coordinates {
            latitude,
            longitude,
        });
        self
    }

    pub fn with_date(mut self, year: i32, month: i32, day: i32) -> Self {
        self.timestamp = Some(CalendarDate { year, month, day });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub total_score: f64,
    pub filepath: String,
}
