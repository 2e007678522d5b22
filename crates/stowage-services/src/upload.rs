//! Upload orchestrator.
//!
//! Registration is metadata-first: the record is inserted in `Pending` state
//! before the presigned PUT URL is minted. If the presign fails, the pending
//! record is reclaimed later by the reconciliation sweep; the reverse order
//! could leave a client-uploadable key with no metadata and no cleanup hook.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use stowage_core::{
    AppError, Code, CodeGenerator, Config, FileKind, FileMetadataPatch, NewStoredFile,
    PresignedDownload, RegisterFileRequest, RegisteredUpload, StoredFile, ThumbnailState,
    UploadState,
};
use stowage_db::FileRepository;
use stowage_processing::Thumbnailer;
use stowage_storage::{keys, ObjectGateway};

/// Retries of the generate-and-insert loop before giving up. Collisions are
/// cryptographically improbable at a 122-bit code space; hitting this limit
/// means the generator is broken, not unlucky.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// Upload policy knobs, lifted out of [`Config`].
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_attachment_size_bytes: u64,
    pub put_url_expiry: Duration,
    pub get_url_expiry: Duration,
    pub max_files_per_entity: u32,
    pub thumbnail_max_pixels: u32,
}

impl UploadPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attachment_size_bytes: config.max_attachment_size_bytes,
            put_url_expiry: Duration::from_secs(config.put_url_expiry_secs),
            get_url_expiry: Duration::from_secs(config.get_url_expiry_secs),
            max_files_per_entity: config.max_files_per_entity,
            thumbnail_max_pixels: config.thumbnail_max_pixels,
        }
    }
}

/// Service for registering uploads and issuing download capabilities.
#[derive(Clone)]
pub struct UploadService {
    repository: Arc<dyn FileRepository>,
    object_store: Arc<dyn ObjectGateway>,
    code_generator: Arc<dyn CodeGenerator>,
    thumbnailer: Thumbnailer,
    policy: UploadPolicy,
}

impl UploadService {
    pub fn new(
        repository: Arc<dyn FileRepository>,
        object_store: Arc<dyn ObjectGateway>,
        code_generator: Arc<dyn CodeGenerator>,
        policy: UploadPolicy,
    ) -> Self {
        let thumbnailer = Thumbnailer::new(policy.thumbnail_max_pixels);
        Self {
            repository,
            object_store,
            code_generator,
            thumbnailer,
            policy,
        }
    }

    /// Register a new attachment and return its upload capability.
    pub async fn register_attachment(
        &self,
        request: RegisterFileRequest,
    ) -> Result<RegisteredUpload, AppError> {
        self.register(FileKind::Attachment, request).await
    }

    /// Register a new image. The thumbnail is derived after the client
    /// confirms the upload.
    pub async fn register_image(
        &self,
        request: RegisterFileRequest,
    ) -> Result<RegisteredUpload, AppError> {
        self.register(FileKind::Image, request).await
    }

    async fn register(
        &self,
        kind: FileKind,
        request: RegisterFileRequest,
    ) -> Result<RegisteredUpload, AppError> {
        request.validate()?;

        if request.declared_size > self.policy.max_attachment_size_bytes {
            return Err(AppError::CapacityExceeded {
                requested: request.declared_size,
                max: self.policy.max_attachment_size_bytes,
            });
        }

        // Soft cap on files per entity. The count is not transactional with
        // the insert; a race can overshoot by a few records, which is
        // acceptable for a policy limit.
        let existing = self
            .repository
            .count_by_entity(kind, &request.entity_id)
            .await?;
        if existing >= u64::from(self.policy.max_files_per_entity) {
            return Err(AppError::UploadLimitReached {
                entity_id: request.entity_id,
                limit: self.policy.max_files_per_entity,
            });
        }

        let record = self.create_with_fresh_code(kind, &request).await?;

        let key = keys::object_key(kind, &record.code);
        let presigned = self
            .object_store
            .presign_put(
                &key,
                &request.content_type,
                request.declared_size,
                self.policy.put_url_expiry,
            )
            .await
            .map_err(|e| {
                // The pending record stays behind on purpose; the sweep
                // reclaims it once it goes stale.
                tracing::warn!(
                    record_id = %record.id,
                    code = %record.code,
                    error = %e,
                    "Presign failed after record creation; record left pending for sweep"
                );
                AppError::object_store("presign_put", e.to_string())
            })?;

        tracing::info!(
            record_id = %record.id,
            kind = kind.as_str(),
            entity_id = %record.entity_id,
            code = %record.code,
            declared_size = request.declared_size,
            "Upload registered"
        );

        let put_ttl_secs = presigned.expires_in.as_secs();
        Ok(RegisteredUpload {
            record_id: record.id,
            code: record.code,
            presigned_put_url: presigned.url,
            put_ttl_secs,
            expires_at: Utc::now() + chrono::Duration::seconds(put_ttl_secs as i64),
        })
    }

    /// Generate-insert loop: the unique index arbitrates code collisions, so
    /// the loser of a race simply retries with a fresh code.
    async fn create_with_fresh_code(
        &self,
        kind: FileKind,
        request: &RegisterFileRequest,
    ) -> Result<StoredFile, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let code = self.code_generator.generate()?;
            let new_file = NewStoredFile::new(
                kind,
                request.entity_id.clone(),
                code,
                request.file_name.clone(),
                request.title.clone(),
                request.description.clone(),
            );
            match self.repository.create(new_file).await {
                Ok(record) => return Ok(record),
                Err(AppError::DuplicateCode { code }) => {
                    tracing::warn!(
                        kind = kind.as_str(),
                        entity_id = %request.entity_id,
                        code = %code,
                        attempt,
                        "Code collision on insert; retrying with a fresh code"
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(AppError::CodeGenerationExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        })
    }

    /// Record that the client delivered the bytes. Idempotent; retried
    /// confirmation callbacks are no-ops. For images this also derives the
    /// thumbnail, whose failure degrades to "no thumbnail" without failing
    /// the confirmation.
    pub async fn confirm_upload(&self, kind: FileKind, id: Uuid) -> Result<(), AppError> {
        self.repository.mark_completed(id).await?;

        if kind == FileKind::Image {
            let record = self.repository.get(kind, id).await?;
            if record.thumbnail_state == ThumbnailState::Pending {
                if let Err(e) = self.derive_thumbnail(&record).await {
                    tracing::warn!(
                        record_id = %id,
                        code = %record.code,
                        error = %e,
                        "Thumbnail derivation failed; continuing without thumbnail"
                    );
                    if let Err(e) = self
                        .repository
                        .set_thumbnail_state(id, ThumbnailState::Failed)
                        .await
                    {
                        tracing::error!(
                            record_id = %id,
                            error = %e,
                            "Failed to record thumbnail failure"
                        );
                    }
                }
            }
        }

        Ok(())
    }

    async fn derive_thumbnail(&self, record: &StoredFile) -> Result<(), AppError> {
        let original_key = keys::object_key(record.kind, &record.code);
        let data = self
            .object_store
            .fetch(&original_key, self.policy.max_attachment_size_bytes)
            .await
            .map_err(|e| AppError::object_store("fetch_original", e.to_string()))?;

        let thumbnail = self.thumbnailer.derive(&data)?;

        let thumb_key = keys::thumbnail_key(&record.code);
        self.object_store
            .put(&thumb_key, thumbnail.bytes, thumbnail.content_type)
            .await
            .map_err(|e| AppError::object_store("put_thumbnail", e.to_string()))?;

        self.repository
            .set_thumbnail_state(record.id, ThumbnailState::Ready)
            .await?;

        tracing::info!(
            record_id = %record.id,
            code = %record.code,
            width = thumbnail.width,
            height = thumbnail.height,
            "Thumbnail stored"
        );

        Ok(())
    }

    /// Mint a download capability for a completed file. A record still in
    /// `Pending` is reported `NotFound`: until the upload is confirmed it is
    /// indistinguishable from a file that was never uploaded.
    pub async fn get_download_url(
        &self,
        kind: FileKind,
        id: Uuid,
    ) -> Result<PresignedDownload, AppError> {
        let record = self.repository.get(kind, id).await?;
        self.presign_download(&record).await
    }

    /// Same as [`Self::get_download_url`], addressed by external code.
    pub async fn get_download_url_by_code(
        &self,
        kind: FileKind,
        code: &Code,
    ) -> Result<PresignedDownload, AppError> {
        let record = self.repository.get_by_code(kind, code).await?;
        self.presign_download(&record).await
    }

    async fn presign_download(&self, record: &StoredFile) -> Result<PresignedDownload, AppError> {
        if record.upload_state != UploadState::Completed {
            return Err(AppError::NotFound(format!(
                "No {} with id {}",
                record.kind, record.id
            )));
        }

        let key = keys::object_key(record.kind, &record.code);
        let presigned = self
            .object_store
            .presign_get(&key, self.policy.get_url_expiry)
            .await
            .map_err(|e| AppError::object_store("presign_get", e.to_string()))?;

        Ok(PresignedDownload {
            url: presigned.url,
            get_ttl_secs: presigned.expires_in.as_secs(),
        })
    }

    /// Thumbnail capability for an image, or `None` while no thumbnail is
    /// available (still deriving, derivation failed, or not applicable).
    pub async fn get_thumbnail_url(
        &self,
        id: Uuid,
    ) -> Result<Option<PresignedDownload>, AppError> {
        let record = self.repository.get(FileKind::Image, id).await?;
        if record.upload_state != UploadState::Completed {
            return Err(AppError::NotFound(format!("No image with id {}", id)));
        }
        if record.thumbnail_state != ThumbnailState::Ready {
            return Ok(None);
        }

        let key = keys::thumbnail_key(&record.code);
        let presigned = self
            .object_store
            .presign_get(&key, self.policy.get_url_expiry)
            .await
            .map_err(|e| AppError::object_store("presign_get_thumbnail", e.to_string()))?;

        Ok(Some(PresignedDownload {
            url: presigned.url,
            get_ttl_secs: presigned.expires_in.as_secs(),
        }))
    }

    /// Update the mutable descriptive metadata of a record.
    pub async fn update_metadata(
        &self,
        kind: FileKind,
        id: Uuid,
        patch: FileMetadataPatch,
    ) -> Result<StoredFile, AppError> {
        if patch.is_empty() {
            return self.repository.get(kind, id).await;
        }
        self.repository.update_metadata(kind, id, patch).await
    }

    /// List the records of one kind attached to an entity.
    pub async fn list_files(
        &self,
        kind: FileKind,
        entity_id: &str,
    ) -> Result<Vec<StoredFile>, AppError> {
        self.repository.list_by_entity(kind, entity_id).await
    }
}
