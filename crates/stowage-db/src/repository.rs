//! Metadata repository trait.
//!
//! Uniqueness of `(kind, entity_id, code)` is guaranteed by the store's
//! atomic insert-conflict behavior, surfaced as `DuplicateCode` from
//! `create`. Implementations must insert and interpret the conflict, never
//! check-then-insert.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stowage_core::{
    AppError, Code, DeletedFile, FileKind, FileMetadataPatch, NewStoredFile, StoredFile,
    ThumbnailState,
};

#[async_trait]
pub trait FileRepository: Send + Sync {
    /// Insert a new record in `Pending` state. Fails with `DuplicateCode`
    /// when a record with the same `(kind, entity_id, code)` already exists.
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, AppError>;

    /// Fetch a record by id. `NotFound` if absent or already deleted.
    async fn get(&self, kind: FileKind, id: Uuid) -> Result<StoredFile, AppError>;

    /// Fetch a record by its external code.
    async fn get_by_code(&self, kind: FileKind, code: &Code) -> Result<StoredFile, AppError>;

    /// All records of a kind attached to one entity, oldest first.
    async fn list_by_entity(
        &self,
        kind: FileKind,
        entity_id: &str,
    ) -> Result<Vec<StoredFile>, AppError>;

    /// Number of records of a kind attached to one entity.
    async fn count_by_entity(&self, kind: FileKind, entity_id: &str) -> Result<u64, AppError>;

    /// Transition `Pending -> Completed`. Idempotent: a record already out
    /// of `Pending` is left untouched without error. `NotFound` only when
    /// the record does not exist.
    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError>;

    /// Transition `Pending -> Failed`, with the same idempotence contract as
    /// `mark_completed`.
    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError>;

    /// Record the outcome of thumbnail derivation.
    async fn set_thumbnail_state(&self, id: Uuid, state: ThumbnailState) -> Result<(), AppError>;

    /// Update the mutable descriptive fields.
    async fn update_metadata(
        &self,
        kind: FileKind,
        id: Uuid,
        patch: FileMetadataPatch,
    ) -> Result<StoredFile, AppError>;

    /// Remove the record, returning what the caller needs for object
    /// cleanup. At-most-once effective: of two concurrent deletes, exactly
    /// one succeeds and the other observes `NotFound`.
    async fn delete(&self, kind: FileKind, id: Uuid) -> Result<DeletedFile, AppError>;

    /// Page of `Pending` records created before `before`, oldest first.
    /// Callers page until an empty result; the sequence is restartable
    /// because swept records are deleted as they are processed.
    async fn list_stale_pending(
        &self,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<StoredFile>, AppError>;
}
