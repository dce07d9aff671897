// Durable store on SQLite. Each requisition row carries the full entity
// as a JSON document plus the columns needed for conditional updates and
// ordering; the sequence counter is a single-statement upsert.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::requisition::{
    FieldPatch, HistoryRecord, Requisition, RequisitionId, RequisitionItem, Status,
};
use crate::storage::{RequisitionFilter, RequisitionStore, StorageError};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to (and if necessary creates) the database, running
    /// migrations when configured to.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if !sqlx::Sqlite::database_exists(&config.url).await? {
            info!("Creating database at {}", config.url);
            sqlx::Sqlite::create_database(&config.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        if config.auto_migrate {
            info!("Running database migrations");
            sqlx::migrate!("./migrations").run(&pool).await?;
        }

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_doc(&self, id: &RequisitionId) -> Result<Option<Requisition>, StorageError> {
        let row = sqlx::query("SELECT doc FROM requisitions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.map(|row| decode_doc(&row)).transpose()
    }

    async fn store_doc(&self, requisition: &Requisition) -> Result<(), StorageError> {
        sqlx::query("UPDATE requisitions SET status = ?2, doc = ?3 WHERE id = ?1")
            .bind(requisition.id.as_str())
            .bind(requisition.status.as_str())
            .bind(encode_doc(requisition)?)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl RequisitionStore for SqliteStore {
    async fn load(&self, id: &RequisitionId) -> Result<Option<Requisition>, StorageError> {
        self.fetch_doc(id).await
    }

    async fn create(&self, requisition: Requisition) -> Result<Requisition, StorageError> {
        sqlx::query(
            "INSERT INTO requisitions (id, status, created_at, doc) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(requisition.id.as_str())
        .bind(requisition.status.as_str())
        .bind(requisition.created_at.to_rfc3339())
        .bind(encode_doc(&requisition)?)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(requisition)
    }

    async fn update_status(
        &self,
        id: &RequisitionId,
        expected: Status,
        new_status: Status,
        rejection_reason: Option<String>,
        record: HistoryRecord,
    ) -> Result<Requisition, StorageError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let row = sqlx::query("SELECT doc FROM requisitions WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StorageError::NotFound)?;
        let mut entity = decode_doc(&row)?;

        if entity.status != expected {
            return Err(StorageError::Conflict {
                expected,
                found: entity.status,
            });
        }

        entity.status = new_status;
        entity.rejection_reason = rejection_reason;
        entity.updated_at = record.timestamp;
        entity.history.push(record);

        // A concurrent writer that committed between our read and this
        // write shows up as a busy/locked error, mapped to Transient; the
        // caller reloads and retries.
        sqlx::query("UPDATE requisitions SET status = ?2, doc = ?3 WHERE id = ?1 AND status = ?4")
            .bind(id.as_str())
            .bind(new_status.as_str())
            .bind(encode_doc(&entity)?)
            .bind(expected.as_str())
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(entity)
    }

    async fn update_fields(
        &self,
        id: &RequisitionId,
        patch: FieldPatch,
    ) -> Result<Requisition, StorageError> {
        let mut entity = self.fetch_doc(id).await?.ok_or(StorageError::NotFound)?;
        patch.apply_to(&mut entity);
        entity.updated_at = Utc::now();
        self.store_doc(&entity).await?;
        Ok(entity)
    }

    async fn replace_items(
        &self,
        id: &RequisitionId,
        items: Vec<RequisitionItem>,
    ) -> Result<Requisition, StorageError> {
        let mut entity = self.fetch_doc(id).await?.ok_or(StorageError::NotFound)?;
        entity.items = items;
        entity.updated_at = Utc::now();
        self.store_doc(&entity).await?;
        Ok(entity)
    }

    async fn delete(&self, id: &RequisitionId) -> Result<(), StorageError> {
        let result = sqlx::query("DELETE FROM requisitions WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn allocate_next_sequence(&self, year: i32) -> Result<u32, StorageError> {
        let row = sqlx::query(
            "INSERT INTO requisition_sequences (year, value) VALUES (?1, 1) \
             ON CONFLICT(year) DO UPDATE SET value = value + 1 \
             RETURNING value",
        )
        .bind(year)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        let value: i64 = row.try_get("value").map_err(map_sqlx_error)?;
        Ok(value as u32)
    }

    async fn list(&self, filter: &RequisitionFilter) -> Result<Vec<Requisition>, StorageError> {
        let rows = sqlx::query("SELECT doc FROM requisitions ORDER BY created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let mut matches = Vec::new();
        for row in &rows {
            let entity = decode_doc(row)?;
            if filter.matches(&entity) {
                matches.push(entity);
            }
        }
        Ok(matches)
    }
}

fn encode_doc(requisition: &Requisition) -> Result<String, StorageError> {
    serde_json::to_string(requisition)
        .map_err(|err| StorageError::Backend(format!("failed to encode requisition: {}", err)))
}

fn decode_doc(row: &sqlx::sqlite::SqliteRow) -> Result<Requisition, StorageError> {
    let doc: String = row.try_get("doc").map_err(map_sqlx_error)?;
    serde_json::from_str(&doc)
        .map_err(|err| StorageError::Backend(format!("failed to decode requisition: {}", err)))
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    match err {
        sqlx::Error::RowNotFound => StorageError::NotFound,
        sqlx::Error::PoolTimedOut => StorageError::Transient("connection pool timed out".to_string()),
        sqlx::Error::Database(db)
            if db.message().contains("locked") || db.message().contains("busy") =>
        {
            StorageError::Transient(db.message().to_string())
        }
        other => StorageError::Backend(other.to_string()),
    }
}
