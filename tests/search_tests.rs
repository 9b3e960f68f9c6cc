use photo_finder::db::SqliteCatalog;
use photo_finder::scoring::{LOCATION_WEIGHT, MATCH_WEIGHT};
use photo_finder::translator::QueryField;
use photo_finder::*;
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Answers by prompt kind and remembers every prompt it was given.
struct CannedGenerator {
    tags: String,
    location: String,
    date: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    fn new(tags: &str, location: &str, date: &str) -> Self {
        Self {
            tags: tags.to_string(),
            location: location.to_string(),
            date: date.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextGenerator for CannedGenerator {
    fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("list of tags") {
            Ok(self.tags.clone())
        } else if prompt.contains("latitude and longitude") {
            Ok(self.location.clone())
        } else {
            Ok(self.date.clone())
        }
    }
}

fn add(
    catalog: &SqliteCatalog,
    filepath: &str,
    tags: &[&str],
    location: Option<&str>,
    timestamp: Option<&str>,
) {
    catalog
        .add_photo(&NewPhoto {
            filepath: filepath.to_string(),
            folder_path: "/photos".to_string(),
            location: location.map(str::to_string),
            timestamp: timestamp.map(str::to_string),
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        })
        .unwrap();
}

#[test]
fn test_scenario_a_partial_tag_overlap_is_included() {
    let query = StructuredQuery::from_tags(["dog", "park"]);
    let photo = PhotoRecord::new("/photos/a.jpg", "/photos").with_tags(["dog", "tree"]);

    let ranked = rank_scored(&[photo], &query, 10);
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].total_score, MATCH_WEIGHT);
    assert_eq!(ranked[0].filepath, "/photos/a.jpg");
}

#[test]
fn test_scenario_b_disjoint_tags_give_empty_result() {
    let query = StructuredQuery::from_tags(["cat"]);
    let photo = PhotoRecord::new("/photos/a.jpg", "/photos").with_tags(["dog"]);
    assert!(rank(&[photo], &query, 10).is_empty());
}

#[test]
fn test_scenario_c_unbracketed_tag_response_matches_nothing() {
    let generator = CannedGenerator::new("dog, park", "", "");
    let translator = RequestTranslator::new(&generator);
    let vocabulary = BTreeSet::from(["dog".to_string(), "park".to_string()]);

    let translation = translator
        .process_input("a dog in a park", &vocabulary, false)
        .unwrap();
    assert!(translation.query.tags.is_empty());
    assert!(translation.failed(QueryField::Tags));

    let photo = PhotoRecord::new("/photos/a.jpg", "/photos").with_tags(["dog", "park"]);
    assert!(rank(&[photo], &translation.query, 10).is_empty());
}

#[test]
fn test_scenario_d_exact_location() {
    let query = StructuredQuery::default().with_location(40.0, -73.0);
    let photo = PhotoRecord::new("/photos/a.jpg", "/photos").with_location("40.0,-73.0");
    let ranked = rank_scored(&[photo], &query, 10);
    assert_eq!(ranked[0].total_score, 2.0 * LOCATION_WEIGHT);
}

#[test]
fn test_scenario_e_truncation_keeps_best_two() {
    let catalog = SqliteCatalog::in_memory().unwrap();
    add(&catalog, "/photos/two_tags.jpg", &["dog", "ball"], None, None);
    add(
        &catalog,
        "/photos/four_tags.jpg",
        &["dog", "ball", "grass", "person"],
        None,
        None,
    );
    add(&catalog, "/photos/one_tag.jpg", &["dog"], None, None);
    catalog.set_max_photos(2).unwrap();

    let generator = CannedGenerator::new("[dog, ball, grass, person]", "", "");
    let service = SearchService::new(catalog, &generator);

    let outcome = service.search("someone playing fetch on the lawn").unwrap();
    assert_eq!(
        outcome.paths,
        vec!["/photos/four_tags.jpg", "/photos/two_tags.jpg"]
    );
    assert_eq!(outcome.status(), SearchStatus::Matches(2));
}

#[test]
fn test_metadata_mode_end_to_end_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("nested").join("catalog.db");

    {
        let catalog = SqliteCatalog::open(&db_path).unwrap();
        add(
            &catalog,
            "/photos/nyc_dog.jpg",
            &["dog", "person"],
            Some("40.7128,-74.006"),
            Some("2021:03:05 15:07:42"),
        );
        add(
            &catalog,
            "/photos/paris_dog.jpg",
            &["dog"],
            Some("48.8566,2.3522"),
            Some("2015:08:20 09:00:00"),
        );
        add(&catalog, "/photos/car.jpg", &["car"], None, None);
        catalog.set_use_metadata(true).unwrap();
    }

    // Reopen to read what the first handle persisted
    let catalog = SqliteCatalog::open(&db_path).unwrap();
    let generator = CannedGenerator::new(
        "Here you go: [dog]",
        "[40.7128° N, 74.0060° W]",
        "[2021:03:05]",
    );
    let service = SearchService::new(catalog, &generator);

    let outcome = service.search("my dog in new york last march").unwrap();
    assert_eq!(generator.prompt_count(), 3);
    assert!(outcome.failures.is_empty());
    assert_eq!(
        outcome.paths,
        vec!["/photos/nyc_dog.jpg", "/photos/paris_dog.jpg"]
    );

    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("Only use tags from this list: car, dog, person."));
}

#[test]
fn test_partial_metadata_failure_still_ranks() {
    let catalog = SqliteCatalog::in_memory().unwrap();
    add(&catalog, "/photos/a.jpg", &["dog"], Some("40.0,-73.0"), None);
    add(&catalog, "/photos/b.jpg", &["cat"], Some("40.0,-73.0"), None);
    catalog.set_use_metadata(true).unwrap();

    let generator = CannedGenerator::new("[dog]", "[40.0, -73.0]", "no idea, sorry");
    let service = SearchService::new(catalog, &generator);
    let outcome = service.search("dog").unwrap();

    assert_eq!(outcome.query.timestamp, None);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].field, QueryField::Timestamp);
    assert_eq!(outcome.paths, vec!["/photos/a.jpg", "/photos/b.jpg"]);
}

#[test]
fn test_empty_catalog_reports_no_matches() {
    let catalog = SqliteCatalog::in_memory().unwrap();
    let generator = CannedGenerator::new("[dog]", "", "");
    let service = SearchService::new(catalog, &generator);

    let outcome = service.search("dog").unwrap();
    assert_eq!(outcome.status(), SearchStatus::NoMatches);
    assert_eq!(generator.prompt_count(), 1);
}
