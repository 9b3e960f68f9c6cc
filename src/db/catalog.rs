use rusqlite::{params, OptionalExtension, Row, Transaction};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use crate::db::schema::{drop_schema, initialize_schema};
use crate::db::{create_db_pool, create_in_memory_pool, DbPool};
use crate::error::CatalogError;
use crate::models::{NewPhoto, PhotoRecord};
use crate::search::{PhotoCatalog, SearchSettings};

/// Photo catalog and search settings backed by SQLite.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: DbPool,
}

fn normalize_tags(tags: &[String]) -> BTreeSet<String> {
    tags.iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

impl SqliteCatalog {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, CatalogError> {
        Ok(Self {
            pool: create_db_pool(db_path)?,
        })
    }

    pub fn in_memory() -> Result<Self, CatalogError> {
        Ok(Self {
            pool: create_in_memory_pool()?,
        })
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    fn photo_from_row(row: &Row) -> Result<(i64, PhotoRecord), rusqlite::Error> {
        Ok((
            row.get(0)?,
            PhotoRecord {
                filepath: row.get(1)?,
                folder_path: row.get(2)?,
                location: row.get(3)?,
                timestamp: row.get(4)?,
                tags: BTreeSet::new(),
            },
        ))
    }

    fn insert_photo(tx: &Transaction, photo: &NewPhoto) -> Result<bool, CatalogError> {
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO photos (filepath, folder_path, location, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                photo.filepath,
                photo.folder_path,
                photo.location,
                photo.timestamp
            ],
        )?;
        if inserted == 0 {
            return Ok(false);
        }
        let photo_id = tx.last_insert_rowid();

        for tag in normalize_tags(&photo.tags) {
            tx.execute("INSERT OR IGNORE INTO tags (tag) VALUES (?1)", [&tag])?;
            let tag_id: i64 =
                tx.query_row("SELECT id FROM tags WHERE tag = ?1", [&tag], |row| row.get(0))?;
            tx.execute(
                "INSERT OR IGNORE INTO photo_tags (photo_id, tag_id) VALUES (?1, ?2)",
                params![photo_id, tag_id],
            )?;
        }
        Ok(true)
    }

    /// Inserts a photo and grows the vocabulary with its tags.
    /// Returns `false` when the filepath is already catalogued.
    pub fn add_photo(&self, photo: &NewPhoto) -> Result<bool, CatalogError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        if !Self::insert_photo(&tx, photo)? {
            log::debug!("Photo already exists in catalog: {}", photo.filepath);
            return Ok(false);
        }

        tx.commit()?;
        log::debug!("Catalogued {}", photo.filepath);
        Ok(true)
    }

    /// Stores `photo`, overwriting any existing entry for the same filepath
    /// along with its tag links. Used when a file is re-indexed.
    pub fn replace_photo(&self, photo: &NewPhoto) -> Result<(), CatalogError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let replaced = tx.execute("DELETE FROM photos WHERE filepath = ?1", [&photo.filepath])?;
        Self::insert_photo(&tx, photo)?;
        tx.commit()?;

        if replaced > 0 {
            log::debug!("Re-catalogued {}", photo.filepath);
        } else {
            log::debug!("Catalogued {}", photo.filepath);
        }
        Ok(())
    }

    /// Returns `false` when the filepath was not catalogued.
    pub fn remove_photo(&self, filepath: &str) -> Result<bool, CatalogError> {
        let conn = self.pool.get()?;
        let removed = conn.execute("DELETE FROM photos WHERE filepath = ?1", [filepath])?;
        Ok(removed > 0)
    }

    pub fn contains_photo(&self, filepath: &str) -> Result<bool, CatalogError> {
        let conn = self.pool.get()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM photos WHERE filepath = ?1)",
            [filepath],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    pub fn photo(&self, filepath: &str) -> Result<Option<PhotoRecord>, CatalogError> {
        let conn = self.pool.get()?;
        let found = conn
            .query_row(
                "SELECT id, filepath, folder_path, location, timestamp
                 FROM photos WHERE filepath = ?1",
                [filepath],
                Self::photo_from_row,
            )
            .optional()?;

        let Some((photo_id, mut photo)) = found else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT t.tag FROM photo_tags pt JOIN tags t ON t.id = pt.tag_id
             WHERE pt.photo_id = ?1",
        )?;
        photo.tags = stmt
            .query_map([photo_id], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;

        Ok(Some(photo))
    }

    pub fn folders(&self) -> Result<Vec<String>, CatalogError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT folder_path FROM folders ORDER BY folder_path")?;
        let folders = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(folders)
    }

    pub fn add_folder(&self, folder_path: &str) -> Result<(), CatalogError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO folders (folder_path) VALUES (?1)",
            [folder_path],
        )?;
        Ok(())
    }

    /// Forgets a folder and every photo indexed from it. Returns the number
    /// of photos removed. Their tags stay in the vocabulary.
    pub fn remove_folder(&self, folder_path: &str) -> Result<usize, CatalogError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let removed = tx.execute("DELETE FROM photos WHERE folder_path = ?1", [folder_path])?;
        tx.execute("DELETE FROM folders WHERE folder_path = ?1", [folder_path])?;
        tx.commit()?;

        log::info!("Removed folder {} ({} photos)", folder_path, removed);
        Ok(removed)
    }

    /// Drops every table and recreates the empty catalog with default settings.
    pub fn reset(&self) -> Result<(), CatalogError> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        drop_schema(&tx)?;
        initialize_schema(&tx)?;
        tx.commit()?;

        log::info!("Catalog reset");
        Ok(())
    }

    pub fn set_use_metadata(&self, use_metadata: bool) -> Result<(), CatalogError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE settings SET use_metadata = ?1 WHERE id = 1",
            [use_metadata],
        )?;
        Ok(())
    }

    pub fn set_max_photos(&self, max_photos: usize) -> Result<(), CatalogError> {
        if max_photos == 0 {
            return Err(CatalogError::InvalidSetting(
                "max_photos must be positive".to_string(),
            ));
        }
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE settings SET max_photos = ?1 WHERE id = 1",
            [max_photos as i64],
        )?;
        Ok(())
    }

    pub fn last_opened_dir(&self) -> Result<String, CatalogError> {
        let conn = self.pool.get()?;
        let dir: String = conn.query_row(
            "SELECT last_opened_dir FROM settings WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(dir)
    }

    pub fn set_last_opened_dir(&self, dir: &str) -> Result<(), CatalogError> {
        let conn = self.pool.get()?;
        conn.execute(
            "UPDATE settings SET last_opened_dir = ?1 WHERE id = 1",
            [dir],
        )?;
        Ok(())
    }
}

impl PhotoCatalog for SqliteCatalog {
    fn all_photos(&self) -> Result<Vec<PhotoRecord>, CatalogError> {
        let conn = self.pool.get()?;

        let mut tags_by_photo: HashMap<i64, BTreeSet<String>> = HashMap::new();
        let mut stmt = conn.prepare(
            "SELECT pt.photo_id, t.tag FROM photo_tags pt JOIN tags t ON t.id = pt.tag_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (photo_id, tag) = row?;
            tags_by_photo.entry(photo_id).or_default().insert(tag);
        }

        let mut stmt = conn.prepare(
            "SELECT id, filepath, folder_path, location, timestamp FROM photos ORDER BY id",
        )?;
        let photos = stmt
            .query_map([], Self::photo_from_row)?
            .map(|row| {
                row.map(|(photo_id, mut photo)| {
                    photo.tags = tags_by_photo.remove(&photo_id).unwrap_or_default();
                    photo
                })
            })
            .collect::<Result<Vec<PhotoRecord>, _>>()?;

        Ok(photos)
    }

    fn found_tags(&self) -> Result<BTreeSet<String>, CatalogError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT tag FROM tags")?;
        let tags = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<String>, _>>()?;
        Ok(tags)
    }
}

impl SearchSettings for SqliteCatalog {
    fn use_metadata(&self) -> Result<bool, CatalogError> {
        let conn = self.pool.get()?;
        let use_metadata: bool = conn.query_row(
            "SELECT use_metadata FROM settings WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(use_metadata)
    }

    fn max_photos(&self) -> Result<usize, CatalogError> {
        let conn = self.pool.get()?;
        let max_photos: i64 = conn.query_row(
            "SELECT max_photos FROM settings WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        usize::try_from(max_photos)
            .map_err(|_| CatalogError::InvalidSetting(format!("max_photos = {}", max_photos)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_photo(filepath: &str, folder_path: &str, tags: &[&str]) -> NewPhoto {
        NewPhoto {
            filepath: filepath.to_string(),
            folder_path: folder_path.to_string(),
            location: None,
            timestamp: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
        }
    }

    fn photo_tag_links(catalog: &SqliteCatalog) -> i64 {
        let conn = catalog.pool.get().unwrap();
        conn.query_row("SELECT COUNT(*) FROM photo_tags", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_default_settings() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert!(!catalog.use_metadata().unwrap());
        assert_eq!(catalog.max_photos().unwrap(), 25);
        assert_eq!(catalog.last_opened_dir().unwrap(), "/");
    }

    #[test]
    fn test_update_settings() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.set_use_metadata(true).unwrap();
        catalog.set_max_photos(50).unwrap();
        catalog.set_last_opened_dir("/home/me/Pictures").unwrap();

        assert!(catalog.use_metadata().unwrap());
        assert_eq!(catalog.max_photos().unwrap(), 50);
        assert_eq!(catalog.last_opened_dir().unwrap(), "/home/me/Pictures");
    }

    #[test]
    fn test_max_photos_must_be_positive() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert!(matches!(
            catalog.set_max_photos(0),
            Err(CatalogError::InvalidSetting(_))
        ));
        assert_eq!(catalog.max_photos().unwrap(), 25);
    }

    #[test]
    fn test_add_photo_normalizes_and_dedups_tags() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let mut photo = new_photo("/pics/a.jpg", "/pics", &["Dog", "dog", " person ", ""]);
        photo.location = Some("40.7128,-74.006".to_string());
        photo.timestamp = Some("2021:03:05 15:07:42".to_string());

        assert!(catalog.add_photo(&photo).unwrap());

        let stored = catalog.photo("/pics/a.jpg").unwrap().unwrap();
        assert_eq!(
            stored.tags,
            BTreeSet::from(["dog".to_string(), "person".to_string()])
        );
        assert_eq!(stored.location.as_deref(), Some("40.7128,-74.006"));
        assert_eq!(stored.timestamp.as_deref(), Some("2021:03:05 15:07:42"));
    }

    #[test]
    fn test_add_photo_twice_is_ignored() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert!(catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog"])).unwrap());
        assert!(!catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["cat"])).unwrap());

        assert!(catalog.contains_photo("/pics/a.jpg").unwrap());
        assert_eq!(catalog.all_photos().unwrap().len(), 1);
        assert!(!catalog.found_tags().unwrap().contains("cat"));
    }

    #[test]
    fn test_missing_photo() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert!(catalog.photo("/nope.jpg").unwrap().is_none());
        assert!(!catalog.contains_photo("/nope.jpg").unwrap());
    }

    #[test]
    fn test_all_photos_and_vocabulary() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog", "tree"])).unwrap();
        catalog.add_photo(&new_photo("/pics/b.jpg", "/pics", &["cat"])).unwrap();
        catalog.add_photo(&new_photo("/pics/c.jpg", "/pics", &[])).unwrap();

        let photos = catalog.all_photos().unwrap();
        let paths: Vec<&str> = photos.iter().map(|p| p.filepath.as_str()).collect();
        assert_eq!(paths, vec!["/pics/a.jpg", "/pics/b.jpg", "/pics/c.jpg"]);
        assert_eq!(photos[0].tags.len(), 2);
        assert!(photos[2].tags.is_empty());

        let vocabulary: Vec<String> = catalog.found_tags().unwrap().into_iter().collect();
        assert_eq!(vocabulary, vec!["cat", "dog", "tree"]);
    }

    #[test]
    fn test_remove_folder_drops_its_photos_but_keeps_vocabulary() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_folder("/pics").unwrap();
        catalog.add_folder("/other").unwrap();
        catalog.add_folder("/pics").unwrap();
        assert_eq!(catalog.folders().unwrap(), vec!["/other", "/pics"]);

        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog"])).unwrap();
        catalog.add_photo(&new_photo("/pics/b.jpg", "/pics", &["cat"])).unwrap();
        catalog.add_photo(&new_photo("/other/c.jpg", "/other", &["car"])).unwrap();

        assert_eq!(catalog.remove_folder("/pics").unwrap(), 2);
        assert_eq!(catalog.folders().unwrap(), vec!["/other"]);

        let photos = catalog.all_photos().unwrap();
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].filepath, "/other/c.jpg");
        assert!(catalog.found_tags().unwrap().contains("dog"));
    }

    #[test]
    fn test_remove_folder_cascades_to_tag_links() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog", "ball"])).unwrap();
        catalog.add_photo(&new_photo("/other/b.jpg", "/other", &["dog"])).unwrap();
        assert_eq!(photo_tag_links(&catalog), 3);

        catalog.remove_folder("/pics").unwrap();
        assert_eq!(photo_tag_links(&catalog), 1);
    }

    #[test]
    fn test_replace_photo_overwrites_metadata_and_tags() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog", "tree"])).unwrap();

        let mut updated = new_photo("/pics/a.jpg", "/pics", &["cat"]);
        updated.timestamp = Some("2022:01:02 03:04:05".to_string());
        catalog.replace_photo(&updated).unwrap();

        let stored = catalog.photo("/pics/a.jpg").unwrap().unwrap();
        assert_eq!(stored.tags, BTreeSet::from(["cat".to_string()]));
        assert_eq!(stored.timestamp.as_deref(), Some("2022:01:02 03:04:05"));
        assert_eq!(catalog.all_photos().unwrap().len(), 1);
        assert_eq!(photo_tag_links(&catalog), 1);
        // Vocabulary only grows
        assert!(catalog.found_tags().unwrap().contains("tree"));
    }

    #[test]
    fn test_replace_photo_inserts_new_filepath() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.replace_photo(&new_photo("/pics/a.jpg", "/pics", &["dog"])).unwrap();
        assert!(catalog.contains_photo("/pics/a.jpg").unwrap());
    }

    #[test]
    fn test_remove_photo() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog"])).unwrap();

        assert!(catalog.remove_photo("/pics/a.jpg").unwrap());
        assert!(!catalog.remove_photo("/pics/a.jpg").unwrap());
        assert!(!catalog.contains_photo("/pics/a.jpg").unwrap());
        assert_eq!(photo_tag_links(&catalog), 0);
    }

    #[test]
    fn test_reset_clears_catalog_and_settings() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.add_folder("/pics").unwrap();
        catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["dog"])).unwrap();
        catalog.set_use_metadata(true).unwrap();
        catalog.set_max_photos(5).unwrap();

        catalog.reset().unwrap();

        assert!(catalog.all_photos().unwrap().is_empty());
        assert!(catalog.found_tags().unwrap().is_empty());
        assert!(catalog.folders().unwrap().is_empty());
        assert!(!catalog.use_metadata().unwrap());
        assert_eq!(catalog.max_photos().unwrap(), 25);

        assert!(catalog.add_photo(&new_photo("/pics/a.jpg", "/pics", &["cat"])).unwrap());
        assert_eq!(photo_tag_links(&catalog), 1);
    }
}
