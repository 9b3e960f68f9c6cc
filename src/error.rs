use serde::{Serialize, Serializer};

/// The text-generation collaborator could not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Text generator unreachable: {0}")]
    Unreachable(String),
    #[error("Text generator returned status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Malformed generator envelope: {0}")]
    Envelope(String),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Failure of a whole search. Malformed generator output never ends up here.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search aborted, text generation unavailable: {0}")]
    GenerationUnavailable(#[from] GenerationError),
    #[error("Search aborted, catalog unavailable: {0}")]
    Catalog(#[from] CatalogError),
}

/// Why one field of a generator response could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseFailure {
    #[error("no bracketed span in response")]
    MissingBrackets,
    #[error("expected {expected} values, found {found}")]
    WrongValueCount { expected: usize, found: usize },
    #[error("value out of range: {0}")]
    InvalidNumber(String),
}

impl Serialize for ParseFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
