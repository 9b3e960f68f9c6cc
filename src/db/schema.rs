use rusqlite::{Connection, Result as SqlResult};

pub const PHOTOS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filepath TEXT NOT NULL UNIQUE,
    folder_path TEXT NOT NULL,
    -- "<lat>,<lon>" in decimal degrees
    location TEXT,
    -- "YYYY:MM:DD HH:MM:SS"
    timestamp TEXT
)
"#;

// Every tag ever detected. Rows are never removed so the vocabulary only grows.
pub const TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tag TEXT NOT NULL UNIQUE
)
"#;

pub const PHOTO_TAGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS photo_tags (
    photo_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (photo_id, tag_id),
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
) WITHOUT ROWID
"#;

pub const FOLDERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    folder_path TEXT NOT NULL UNIQUE
)
"#;

// Single row, id = 1
pub const SETTINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    id INTEGER PRIMARY KEY CHECK(id = 1),
    use_metadata BOOLEAN NOT NULL DEFAULT FALSE,
    max_photos INTEGER NOT NULL DEFAULT 25,
    last_opened_dir TEXT NOT NULL DEFAULT '/'
)
"#;

pub const SCHEMA_SQL: &[&str] = &[
    PHOTOS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_photos_folder_path ON photos(folder_path);",
    TAGS_TABLE,
    PHOTO_TAGS_TABLE,
    "CREATE INDEX IF NOT EXISTS idx_photo_tags_tag_id ON photo_tags(tag_id);",
    FOLDERS_TABLE,
    SETTINGS_TABLE,
    "INSERT OR IGNORE INTO settings (id) VALUES (1);",
];

// Dependents first so no foreign key is left dangling mid-drop
pub const DROP_SQL: &[&str] = &[
    "DROP TABLE IF EXISTS photo_tags;",
    "DROP TABLE IF EXISTS photos;",
    "DROP TABLE IF EXISTS tags;",
    "DROP TABLE IF EXISTS folders;",
    "DROP TABLE IF EXISTS settings;",
];

pub fn initialize_schema(conn: &Connection) -> SqlResult<()> {
    for sql in SCHEMA_SQL {
        conn.execute(sql, [])?;
    }
    Ok(())
}

pub fn drop_schema(conn: &Connection) -> SqlResult<()> {
    for sql in DROP_SQL {
        conn.execute(sql, [])?;
    }
    Ok(())
}
