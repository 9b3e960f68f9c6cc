pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod models;
pub mod ranking;
pub mod scoring;
pub mod search;
pub mod translator;

pub use error::{CatalogError, GenerationError, ParseFailure, SearchError};
pub use models::{CalendarDate, Coordinates, NewPhoto, PhotoRecord, ScoredCandidate, StructuredQuery};
pub use ranking::{rank, rank_scored};
pub use search::{PhotoCatalog, SearchOutcome, SearchService, SearchSettings, SearchStatus};
pub use translator::{RequestTranslator, TextGenerator, Translation};
