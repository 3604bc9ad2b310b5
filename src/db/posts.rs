//! SQLite-backed post store.
//!
//! A single `tokio_rusqlite::Connection` serializes every statement on its own
//! thread, so the store is cheap to clone and safe to share between handlers.
//!
//! Create transforms its input (content lines are joined, `meta` is encoded as
//! JSON text). Update writes the supplied values untouched. Every read decodes
//! `meta` again and fails if the stored text is not valid JSON.

use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Row};
use serde_json::{Map, Value};
use tokio_rusqlite::Connection;

use crate::error::{AppError, Result};
use crate::models::{CreatePost, Post, PostContent, PostFilter, PostRow, SHORT_TEXT_LIMIT};

use super::schema::{FILTER_COLUMNS, SCHEMA, WRITABLE_COLUMNS};

#[derive(Clone)]
pub struct PostStore {
    conn: Connection,
}

impl PostStore {
    pub async fn open(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await.map_err(write_err)?;
        Self::provision(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await.map_err(write_err)?;
        Self::provision(conn).await
    }

    async fn provision(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(write_err)?;

        Ok(Self { conn })
    }

    pub async fn insert(&self, post: &CreatePost) -> Result<i64> {
        check_short_text("title", post.title.as_deref())?;
        check_short_text("source", post.source.as_deref())?;

        let meta = post
            .meta
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::StoreWrite(format!("meta is not serializable: {}", e)))?;
        let content = post.content.as_ref().map(PostContent::joined);
        let title = post.title.clone();
        let source = post.source.clone();
        let date = post.date;
        let html = post.html.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO posts (title, source, date, content, html, meta) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![title, source, date, content, html, meta],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(write_err)
    }

    /// Overwrite the given columns of post `id`. Returns the number of rows
    /// touched, which is 0 when no such post exists.
    pub async fn update(&self, id: i64, fields: Map<String, Value>) -> Result<usize> {
        if fields.is_empty() {
            return Err(AppError::StoreWrite("empty update: no columns to set".to_string()));
        }

        let mut assignments = Vec::with_capacity(fields.len());
        let mut values = Vec::with_capacity(fields.len() + 1);

        for (column, value) in fields {
            if !WRITABLE_COLUMNS.contains(&column.as_str()) {
                return Err(AppError::StoreWrite(format!("no such column: {}", column)));
            }
            if column == "title" || column == "source" {
                check_short_text(&column, value.as_str())?;
            }
            if column == "date" {
                check_date(&value)?;
            }
            values.push(to_sql_value(&column, value)?);
            assignments.push(format!("{} = ?{}", column, values.len()));
        }
        values.push(SqlValue::Integer(id));

        let sql = format!(
            "UPDATE posts SET {} WHERE id = ?{}",
            assignments.join(", "),
            values.len()
        );

        self.conn
            .call(move |conn| Ok(conn.execute(&sql, params_from_iter(values))?))
            .await
            .map_err(write_err)
    }

    pub async fn find(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(map) = &filter.0 {
            for (column, value) in map {
                if !FILTER_COLUMNS.contains(&column.as_str()) {
                    return Err(AppError::StoreRead(format!("no such column: {}", column)));
                }
                if value.is_null() {
                    conditions.push(format!("{} IS NULL", column));
                } else {
                    values.push(to_sql_value(column, value.clone())?);
                    conditions.push(format!("{} = ?{}", column, values.len()));
                }
            }
        }

        let mut sql =
            String::from("SELECT id, title, source, date, content, html, meta FROM posts");
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let rows = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map(params_from_iter(values), post_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| AppError::StoreRead(e.to_string()))?;

        rows.into_iter().map(decode_post).collect()
    }

    pub async fn delete(&self, id: i64) -> Result<usize> {
        self.conn
            .call(move |conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?))
            .await
            .map_err(|e| AppError::StoreDelete(e.to_string()))
    }
}

fn write_err(e: tokio_rusqlite::Error) -> AppError {
    AppError::StoreWrite(e.to_string())
}

fn check_short_text(column: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(text) if text.chars().count() > SHORT_TEXT_LIMIT => Err(AppError::InvalidRequest(
            format!("{} exceeds {} characters", column, SHORT_TEXT_LIMIT),
        )),
        _ => Ok(()),
    }
}

/// Dates are read back as `NaiveDate`, so only `YYYY-MM-DD` text (or null) may be written.
fn check_date(value: &Value) -> Result<()> {
    match value {
        Value::Null => Ok(()),
        Value::String(text) if NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok() => Ok(()),
        other => Err(AppError::InvalidRequest(format!(
            "date {} is not a YYYY-MM-DD calendar date",
            other
        ))),
    }
}

/// Bind a JSON scalar as the matching SQLite value. Arrays and objects have no
/// column representation without encoding them first.
fn to_sql_value(column: &str, value: Value) -> Result<SqlValue> {
    match value {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Integer(b as i64)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(SqlValue::Integer(i)),
            None => Ok(SqlValue::Real(n.as_f64().unwrap_or_default())),
        },
        Value::String(s) => Ok(SqlValue::Text(s)),
        Value::Array(_) | Value::Object(_) => Err(AppError::InvalidRequest(format!(
            "column {} only accepts scalar values",
            column
        ))),
    }
}

fn post_row(row: &Row) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        title: row.get(1)?,
        source: row.get(2)?,
        date: row.get(3)?,
        content: row.get(4)?,
        html: row.get(5)?,
        meta: row.get(6)?,
    })
}

fn decode_post(row: PostRow) -> Result<Post> {
    let meta = match row.meta.as_deref() {
        Some(text) => serde_json::from_str(text).map_err(|source| AppError::Deserialization {
            id: row.id,
            source,
        })?,
        None => Value::Null,
    };

    Ok(Post {
        id: row.id,
        title: row.title,
        source: row.source,
        date: row.date,
        content: row.content,
        html: row.html,
        meta,
    })
}
