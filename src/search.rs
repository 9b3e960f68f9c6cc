//! One search request end to end: settings and vocabulary are read fresh
//! from the catalog, the request is translated, then the corpus is ranked.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::error::{CatalogError, SearchError};
use crate::models::{PhotoRecord, StructuredQuery};
use crate::ranking::rank;
use crate::translator::{RequestTranslator, TextGenerator, TranslationFailure};

/// Read access to the indexed photos.
pub trait PhotoCatalog {
    fn all_photos(&self) -> Result<Vec<PhotoRecord>, CatalogError>;

    /// Every tag ever detected in the corpus.
    fn found_tags(&self) -> Result<BTreeSet<String>, CatalogError>;
}

pub trait SearchSettings {
    fn use_metadata(&self) -> Result<bool, CatalogError>;

    fn max_photos(&self) -> Result<usize, CatalogError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "count", rename_all = "snake_case")]
pub enum SearchStatus {
    Matches(usize),
    NoMatches,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: StructuredQuery,
    pub failures: Vec<TranslationFailure>,
    pub paths: Vec<String>,
}

impl SearchOutcome {
    pub fn status(&self) -> SearchStatus {
        if self.paths.is_empty() {
            SearchStatus::NoMatches
        } else {
            SearchStatus::Matches(self.paths.len())
        }
    }
}

// The status is derived from `paths`, so it is written alongside the fields
impl Serialize for SearchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SearchOutcome", 4)?;
        state.serialize_field("outcome", &self.status())?;
        state.serialize_field("query", &self.query)?;
        state.serialize_field("failures", &self.failures)?;
        state.serialize_field("paths", &self.paths)?;
        state.end()
    }
}

pub struct SearchService<C, G> {
    catalog: C,
    translator: RequestTranslator<G>,
}

impl<C, G> SearchService<C, G>
where
    C: PhotoCatalog + SearchSettings,
    G: TextGenerator,
{
    pub fn new(catalog: C, generator: G) -> Self {
        Self::with_translator(catalog, RequestTranslator::new(generator))
    }

    pub fn with_translator(catalog: C, translator: RequestTranslator<G>) -> Self {
        Self {
            catalog,
            translator,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn search(&self, request: &str) -> Result<SearchOutcome, SearchError> {
        let start_time = std::time::Instant::now();
        log::info!("Search request: '{}'", request.trim());

        let use_metadata = self.catalog.use_metadata()?;
        let max_photos = self.catalog.max_photos()?;
        let vocabulary = self.catalog.found_tags()?;

        let translation = self
            .translator
            .process_input(request, &vocabulary, use_metadata)
            .map_err(|e| {
                log::error!("Text generation failed: {}", e);
                SearchError::GenerationUnavailable(e)
            })?;
        log::debug!("Translation took: {:?}", start_time.elapsed());

        let photos = self.catalog.all_photos()?;
        let paths = rank(&photos, &translation.query, max_photos);

        if paths.is_empty() {
            log::info!("No photos matched your search");
        } else {
            log::info!(
                "{} of {} photos matched (max {})",
                paths.len(),
                photos.len(),
                max_photos
            );
        }
        log::debug!("Total search time: {:?}", start_time.elapsed());

        Ok(SearchOutcome {
            query: translation.query,
            failures: translation.failures,
            paths,
        })
    }
}
