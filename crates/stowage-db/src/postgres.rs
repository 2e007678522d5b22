//! Postgres implementation of the metadata repository.
//!
//! Queries are dynamic (no offline prepare needed). Code uniqueness rests on
//! the `(kind, entity_id, code)` unique index: `create` inserts and
//! interprets the conflict instead of querying for existence first.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use async_trait::async_trait;
use stowage_core::{
    AppError, Code, DeletedFile, FileKind, FileMetadataPatch, NewStoredFile, StoredFile,
    ThumbnailState, UploadState,
};

use crate::repository::FileRepository;

const RETURNING_COLUMNS: &str = "id, kind, entity_id, code, file_name, title, description, \
     upload_state, thumbnail_state, created_at, modified_at";

/// Repository for stored-file records in Postgres
#[derive(Clone)]
pub struct PgFileRepository {
    pool: PgPool,
}

impl PgFileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::metadata_store("migrate", e.to_string()))
    }

    /// Guarded `Pending -> {Completed, Failed}` transition. Zero rows
    /// affected on an existing record means it already left `Pending`; that
    /// is a no-op, not an error.
    async fn transition_from_pending(&self, id: Uuid, to: UploadState) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE stored_files
            SET upload_state = $2, modified_at = NOW()
            WHERE id = $1 AND upload_state = 'pending'
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("transition_upload_state", e.to_string()))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM stored_files WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::metadata_store("transition_upload_state", e.to_string()))?;
            if exists.is_none() {
                return Err(AppError::NotFound(format!("No stored file with id {}", id)));
            }
            tracing::debug!(
                id = %id,
                to = to.as_str(),
                "Upload state transition on non-pending record ignored"
            );
        }

        Ok(())
    }
}

fn row_to_file(row: &PgRow) -> Result<StoredFile, AppError> {
    let kind: String = try_column(row, "kind")?;
    let code: String = try_column(row, "code")?;
    let upload_state: String = try_column(row, "upload_state")?;
    let thumbnail_state: String = try_column(row, "thumbnail_state")?;

    Ok(StoredFile {
        id: try_column(row, "id")?,
        kind: kind.parse()?,
        entity_id: try_column(row, "entity_id")?,
        code: code.parse()?,
        file_name: try_column(row, "file_name")?,
        title: try_column(row, "title")?,
        description: try_column(row, "description")?,
        upload_state: upload_state.parse()?,
        thumbnail_state: thumbnail_state.parse()?,
        created_at: try_column(row, "created_at")?,
        modified_at: try_column(row, "modified_at")?,
    })
}

fn try_column<'r, T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>>(
    row: &'r PgRow,
    name: &str,
) -> Result<T, AppError> {
    row.try_get(name)
        .map_err(|e| AppError::Internal(format!("Row decode error for column {}: {}", name, e)))
}

#[async_trait]
impl FileRepository for PgFileRepository {
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, AppError> {
        let id = Uuid::new_v4();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO stored_files (
                id, kind, entity_id, code, file_name, title, description,
                upload_state, thumbnail_state, created_at, modified_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, NOW(), NOW())
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(id)
        .bind(file.kind.as_str())
        .bind(&file.entity_id)
        .bind(file.code.as_str())
        .bind(&file.file_name)
        .bind(&file.title)
        .bind(&file.description)
        .bind(file.thumbnail_state.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::DuplicateCode {
                        code: file.code.to_string(),
                    };
                }
            }
            AppError::metadata_store("create", e.to_string())
        })?;

        tracing::info!(
            id = %id,
            kind = file.kind.as_str(),
            entity_id = %file.entity_id,
            code = %file.code,
            "Stored file record created"
        );

        row_to_file(&row)
    }

    async fn get(&self, kind: FileKind, id: Uuid) -> Result<StoredFile, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM stored_files WHERE id = $1 AND kind = $2",
            RETURNING_COLUMNS
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("get", e.to_string()))?;

        match row {
            Some(row) => row_to_file(&row),
            None => Err(AppError::NotFound(format!("No {} with id {}", kind, id))),
        }
    }

    async fn get_by_code(&self, kind: FileKind, code: &Code) -> Result<StoredFile, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM stored_files WHERE code = $1 AND kind = $2",
            RETURNING_COLUMNS
        ))
        .bind(code.as_str())
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("get_by_code", e.to_string()))?;

        match row {
            Some(row) => row_to_file(&row),
            None => Err(AppError::NotFound(format!(
                "No {} with code {}",
                kind, code
            ))),
        }
    }

    async fn list_by_entity(
        &self,
        kind: FileKind,
        entity_id: &str,
    ) -> Result<Vec<StoredFile>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM stored_files
            WHERE kind = $1 AND entity_id = $2
            ORDER BY created_at ASC
            "#,
            RETURNING_COLUMNS
        ))
        .bind(kind.as_str())
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("list_by_entity", e.to_string()))?;

        rows.iter().map(row_to_file).collect()
    }

    async fn count_by_entity(&self, kind: FileKind, entity_id: &str) -> Result<u64, AppError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stored_files WHERE kind = $1 AND entity_id = $2")
                .bind(kind.as_str())
                .bind(entity_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::metadata_store("count_by_entity", e.to_string()))?;

        Ok(count as u64)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError> {
        self.transition_from_pending(id, UploadState::Completed).await
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        self.transition_from_pending(id, UploadState::Failed).await
    }

    async fn set_thumbnail_state(&self, id: Uuid, state: ThumbnailState) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE stored_files SET thumbnail_state = $2, modified_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(state.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("set_thumbnail_state", e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No stored file with id {}", id)));
        }

        Ok(())
    }

    async fn update_metadata(
        &self,
        kind: FileKind,
        id: Uuid,
        patch: FileMetadataPatch,
    ) -> Result<StoredFile, AppError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE stored_files
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                modified_at = NOW()
            WHERE id = $1 AND kind = $2
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(id)
        .bind(kind.as_str())
        .bind(&patch.title)
        .bind(&patch.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("update_metadata", e.to_string()))?;

        match row {
            Some(row) => row_to_file(&row),
            None => Err(AppError::NotFound(format!("No {} with id {}", kind, id))),
        }
    }

    async fn delete(&self, kind: FileKind, id: Uuid) -> Result<DeletedFile, AppError> {
        let row = sqlx::query(
            r#"
            DELETE FROM stored_files
            WHERE id = $1 AND kind = $2
            RETURNING kind, code, thumbnail_state
            "#,
        )
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("delete", e.to_string()))?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("No {} with id {}", kind, id)))?;

        let kind_str: String = try_column(&row, "kind")?;
        let code: String = try_column(&row, "code")?;
        let thumbnail_state: String = try_column(&row, "thumbnail_state")?;

        tracing::info!(id = %id, kind = %kind_str, code = %code, "Stored file record deleted");

        Ok(DeletedFile {
            kind: kind_str.parse()?,
            code: code.parse()?,
            thumbnail_state: thumbnail_state.parse()?,
        })
    }

    async fn list_stale_pending(
        &self,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<StoredFile>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM stored_files
            WHERE upload_state = 'pending' AND created_at < $1
            ORDER BY created_at ASC
            LIMIT $2
            "#,
            RETURNING_COLUMNS
        ))
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::metadata_store("list_stale_pending", e.to_string()))?;

        rows.iter().map(row_to_file).collect()
    }
}
