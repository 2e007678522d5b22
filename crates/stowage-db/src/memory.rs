//! In-memory implementation of the metadata repository.
//!
//! Enforces the same compound-uniqueness and guarded-transition contracts as
//! the Postgres implementation, so orchestrators behave identically under
//! test and against a real store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stowage_core::{
    AppError, Code, DeletedFile, FileKind, FileMetadataPatch, NewStoredFile, StoredFile,
    ThumbnailState, UploadState,
};

use crate::repository::FileRepository;

#[derive(Debug, Default)]
pub struct MemoryFileRepository {
    files: Mutex<HashMap<Uuid, StoredFile>>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_count(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Backdate a record's creation time; test support for staleness checks.
    pub fn backdate_created_at(&self, id: Uuid, created_at: DateTime<Utc>) {
        if let Some(file) = self.files.lock().unwrap().get_mut(&id) {
            file.created_at = created_at;
        }
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn create(&self, file: NewStoredFile) -> Result<StoredFile, AppError> {
        let mut files = self.files.lock().unwrap();

        // Same check the unique index performs, done under the map lock so
        // the insert-and-interpret-conflict contract holds.
        let duplicate = files.values().any(|existing| {
            existing.kind == file.kind
                && existing.entity_id == file.entity_id
                && existing.code == file.code
        });
        if duplicate {
            return Err(AppError::DuplicateCode {
                code: file.code.to_string(),
            });
        }

        let now = Utc::now();
        let record = StoredFile {
            id: Uuid::new_v4(),
            kind: file.kind,
            entity_id: file.entity_id,
            code: file.code,
            file_name: file.file_name,
            title: file.title,
            description: file.description,
            upload_state: UploadState::Pending,
            thumbnail_state: file.thumbnail_state,
            created_at: now,
            modified_at: now,
        };
        files.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, kind: FileKind, id: Uuid) -> Result<StoredFile, AppError> {
        self.files
            .lock()
            .unwrap()
            .get(&id)
            .filter(|f| f.kind == kind)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No {} with id {}", kind, id)))
    }

    async fn get_by_code(&self, kind: FileKind, code: &Code) -> Result<StoredFile, AppError> {
        self.files
            .lock()
            .unwrap()
            .values()
            .find(|f| f.kind == kind && &f.code == code)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No {} with code {}", kind, code)))
    }

    async fn list_by_entity(
        &self,
        kind: FileKind,
        entity_id: &str,
    ) -> Result<Vec<StoredFile>, AppError> {
        let mut matches: Vec<StoredFile> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.kind == kind && f.entity_id == entity_id)
            .cloned()
            .collect();
        matches.sort_by_key(|f| f.created_at);
        Ok(matches)
    }

    async fn count_by_entity(&self, kind: FileKind, entity_id: &str) -> Result<u64, AppError> {
        let count = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.kind == kind && f.entity_id == entity_id)
            .count();
        Ok(count as u64)
    }

    async fn mark_completed(&self, id: Uuid) -> Result<(), AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("No stored file with id {}", id)))?;
        if file.upload_state == UploadState::Pending {
            file.upload_state = UploadState::Completed;
            file.modified_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid) -> Result<(), AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("No stored file with id {}", id)))?;
        if file.upload_state == UploadState::Pending {
            file.upload_state = UploadState::Failed;
            file.modified_at = Utc::now();
        }
        Ok(())
    }

    async fn set_thumbnail_state(&self, id: Uuid, state: ThumbnailState) -> Result<(), AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("No stored file with id {}", id)))?;
        file.thumbnail_state = state;
        file.modified_at = Utc::now();
        Ok(())
    }

    async fn update_metadata(
        &self,
        kind: FileKind,
        id: Uuid,
        patch: FileMetadataPatch,
    ) -> Result<StoredFile, AppError> {
        let mut files = self.files.lock().unwrap();
        let file = files
            .get_mut(&id)
            .filter(|f| f.kind == kind)
            .ok_or_else(|| AppError::NotFound(format!("No {} with id {}", kind, id)))?;
        if let Some(title) = patch.title {
            file.title = Some(title);
        }
        if let Some(description) = patch.description {
            file.description = Some(description);
        }
        file.modified_at = Utc::now();
        Ok(file.clone())
    }

    async fn delete(&self, kind: FileKind, id: Uuid) -> Result<DeletedFile, AppError> {
        let mut files = self.files.lock().unwrap();
        match files.get(&id) {
            Some(f) if f.kind == kind => {}
            _ => return Err(AppError::NotFound(format!("No {} with id {}", kind, id))),
        }
        let file = files.remove(&id).expect("checked above");
        Ok(DeletedFile {
            kind: file.kind,
            code: file.code,
            thumbnail_state: file.thumbnail_state,
        })
    }

    async fn list_stale_pending(
        &self,
        before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<StoredFile>, AppError> {
        let mut stale: Vec<StoredFile> = self
            .files
            .lock()
            .unwrap()
            .values()
            .filter(|f| f.upload_state == UploadState::Pending && f.created_at < before)
            .cloned()
            .collect();
        stale.sort_by_key(|f| f.created_at);
        stale.truncate(limit.max(0) as usize);
        Ok(stale)
    }
}
