pub const SCHEMA: &str = r#"
-- posts table
CREATE TABLE IF NOT EXISTS posts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(150),
    source VARCHAR(150),
    date DATE,
    content TEXT,
    html TEXT,
    meta TEXT
);
"#;

/// Columns a client may set through a partial update.
pub const WRITABLE_COLUMNS: &[&str] = &["title", "source", "date", "content", "html", "meta"];

/// Columns a client may filter on.
pub const FILTER_COLUMNS: &[&str] = &["id", "title", "source", "date", "content", "html", "meta"];
