//! Deletion orchestrator.
//!
//! The metadata record goes first: once it is gone the file is unreachable,
//! which is the whole user-visible contract. Backing objects are then
//! deleted best-effort; a failure there leaves bytes to be reclaimed
//! out-of-band, never a resurrectable record.

use std::sync::Arc;

use uuid::Uuid;

use stowage_core::{AppError, DeletedFile, FileKind};
use stowage_db::FileRepository;
use stowage_storage::{keys, ObjectGateway};

/// Service for removing records and their backing objects.
#[derive(Clone)]
pub struct DeletionService {
    repository: Arc<dyn FileRepository>,
    object_store: Arc<dyn ObjectGateway>,
}

impl DeletionService {
    pub fn new(repository: Arc<dyn FileRepository>, object_store: Arc<dyn ObjectGateway>) -> Self {
        Self {
            repository,
            object_store,
        }
    }

    /// Delete a stored file. Concurrent deletes race on the record removal;
    /// exactly one caller succeeds, the other observes `NotFound`.
    pub async fn delete(&self, kind: FileKind, id: Uuid) -> Result<(), AppError> {
        let deleted = self.repository.delete(kind, id).await?;

        purge_objects(self.object_store.as_ref(), &deleted).await;

        tracing::info!(
            record_id = %id,
            kind = kind.as_str(),
            code = %deleted.code,
            "Stored file deleted"
        );

        Ok(())
    }
}

/// Best-effort removal of the objects backing a deleted record. Failures are
/// logged, not surfaced: the record is already gone and the object store's
/// idempotent delete lets any later pass retry.
pub(crate) async fn purge_objects(object_store: &dyn ObjectGateway, deleted: &DeletedFile) {
    let original_key = keys::object_key(deleted.kind, &deleted.code);
    if let Err(e) = object_store.delete(&original_key).await {
        tracing::error!(
            key = %original_key,
            error = %e,
            "Failed to delete backing object; leaving for out-of-band reclamation"
        );
    }

    if deleted.may_have_thumbnail() {
        let thumb_key = keys::thumbnail_key(&deleted.code);
        if let Err(e) = object_store.delete(&thumb_key).await {
            tracing::error!(
                key = %thumb_key,
                error = %e,
                "Failed to delete thumbnail object; leaving for out-of-band reclamation"
            );
        }
    }
}
