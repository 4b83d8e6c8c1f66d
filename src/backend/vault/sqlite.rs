/**
 * SQLite Catalog
 *
 * Persists archived items in a single `archived_items` table. Tags are
 * stored as a JSON array, timestamps as RFC 3339 text. The schema is
 * created on connect.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::BTreeSet;
use std::str::FromStr;
use uuid::Uuid;

use crate::backend::vault::catalog::{Catalog, CatalogError};
use crate::shared::archive::{ArchiveStatus, ArchivedItem};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS archived_items (
    id TEXT PRIMARY KEY NOT NULL,
    owner_id TEXT NOT NULL,
    storage_key TEXT NOT NULL,
    original_name TEXT NOT NULL,
    content_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    title TEXT,
    description TEXT,
    tags TEXT NOT NULL,
    status TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    restore_expires_at TEXT
);
CREATE INDEX IF NOT EXISTS archived_items_owner ON archived_items (owner_id);
CREATE INDEX IF NOT EXISTS archived_items_status ON archived_items (status);
"#;

const COLUMNS: &str = "id, owner_id, storage_key, original_name, content_type, size_bytes, \
                       title, description, tags, status, uploaded_at, restore_expires_at";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    owner_id: String,
    storage_key: String,
    original_name: String,
    content_type: String,
    size_bytes: i64,
    title: Option<String>,
    description: Option<String>,
    tags: String,
    status: String,
    uploaded_at: String,
    restore_expires_at: Option<String>,
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|time| time.with_timezone(&Utc))
        .map_err(|e| CatalogError::Corrupt(format!("bad timestamp '{}': {}", raw, e)))
}

impl TryFrom<ItemRow> for ArchivedItem {
    type Error = CatalogError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| CatalogError::Corrupt(format!("bad id '{}': {}", row.id, e)))?;
        let tags: BTreeSet<String> = serde_json::from_str(&row.tags)
            .map_err(|e| CatalogError::Corrupt(format!("bad tags for {}: {}", id, e)))?;
        let status = ArchiveStatus::from_str(&row.status)
            .map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        let size_bytes = u64::try_from(row.size_bytes)
            .map_err(|_| CatalogError::Corrupt(format!("negative size for {}", id)))?;
        let restore_expires_at = row
            .restore_expires_at
            .as_deref()
            .map(parse_time)
            .transpose()?;

        Ok(ArchivedItem {
            id,
            owner_id: row.owner_id,
            storage_key: row.storage_key,
            original_name: row.original_name,
            content_type: row.content_type,
            size_bytes,
            title: row.title,
            description: row.description,
            tags,
            status,
            uploaded_at: parse_time(&row.uploaded_at)?,
            restore_expires_at,
        })
    }
}

/// Catalog stored in SQLite
#[derive(Debug, Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    /// Connect to `url` (e.g. `sqlite://vault.db` or `sqlite::memory:`) and create the schema
    pub async fn connect(url: &str) -> Result<Self, CatalogError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        // One connection keeps `sqlite::memory:` databases shared.
        let pool = SqlitePoolOptions::new()
            .max_connections(if url.contains(":memory:") { 1 } else { 5 })
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    /// Use an existing pool and create the schema
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, CatalogError> {
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }
}

fn encode_tags(item: &ArchivedItem) -> Result<String, CatalogError> {
    serde_json::to_string(&item.tags).map_err(|e| CatalogError::Corrupt(e.to_string()))
}

fn encode_size(item: &ArchivedItem) -> Result<i64, CatalogError> {
    i64::try_from(item.size_bytes)
        .map_err(|_| CatalogError::Corrupt(format!("size of {} does not fit", item.id)))
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn insert(&self, item: ArchivedItem) -> Result<(), CatalogError> {
        let result = sqlx::query(&format!(
            "INSERT INTO archived_items ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLUMNS
        ))
        .bind(item.id.to_string())
        .bind(&item.owner_id)
        .bind(&item.storage_key)
        .bind(&item.original_name)
        .bind(&item.content_type)
        .bind(encode_size(&item)?)
        .bind(&item.title)
        .bind(&item.description)
        .bind(encode_tags(&item)?)
        .bind(item.status.as_str())
        .bind(item.uploaded_at.to_rfc3339())
        .bind(item.restore_expires_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(CatalogError::Duplicate(item.id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ArchivedItem>, CatalogError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {} FROM archived_items WHERE id = ?",
            COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ArchivedItem::try_from).transpose()
    }

    async fn replace(&self, item: &ArchivedItem) -> Result<(), CatalogError> {
        // Only the mutable columns are written.
        let result = sqlx::query(
            r#"
            UPDATE archived_items
            SET title = ?, description = ?, tags = ?, status = ?, restore_expires_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&item.title)
        .bind(&item.description)
        .bind(encode_tags(item)?)
        .bind(item.status.as_str())
        .bind(item.restore_expires_at.map(|t| t.to_rfc3339()))
        .bind(item.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::Missing(item.id));
        }
        Ok(())
    }

    async fn remove(&self, id: Uuid) -> Result<bool, CatalogError> {
        let result = sqlx::query("DELETE FROM archived_items WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<ArchivedItem>, CatalogError> {
        let sql = format!(
            "SELECT {} FROM archived_items WHERE owner_id = ? ORDER BY uploaded_at DESC",
            COLUMNS
        );
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ArchivedItem::try_from)
            .collect()
    }

    async fn list_with_status(
        &self,
        statuses: &[ArchiveStatus],
    ) -> Result<Vec<ArchivedItem>, CatalogError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM archived_items WHERE status IN ({})",
            COLUMNS, placeholders
        );
        let mut query = sqlx::query_as::<_, ItemRow>(&sql);
        for status in statuses {
            query = query.bind(status.as_str());
        }
        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(ArchivedItem::try_from)
            .collect()
    }
}
