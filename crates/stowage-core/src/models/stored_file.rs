use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::code::Code;
use crate::error::AppError;

/// Kind of stored file. Attachments are opaque blobs; images additionally
/// get a derived thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Attachment,
    Image,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Attachment => "attachment",
            FileKind::Image => "image",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attachment" => Ok(FileKind::Attachment),
            "image" => Ok(FileKind::Image),
            other => Err(AppError::InvalidInput(format!(
                "Unknown file kind: {}",
                other
            ))),
        }
    }
}

/// Whether the client has delivered the bytes to the object store yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadState {
    Pending,
    Completed,
    Failed,
}

impl UploadState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadState::Pending => "pending",
            UploadState::Completed => "completed",
            UploadState::Failed => "failed",
        }
    }
}

impl FromStr for UploadState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(UploadState::Pending),
            "completed" => Ok(UploadState::Completed),
            "failed" => Ok(UploadState::Failed),
            other => Err(AppError::InvalidInput(format!(
                "Unknown upload state: {}",
                other
            ))),
        }
    }
}

/// Thumbnail lifecycle for images. Attachments stay `NotApplicable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThumbnailState {
    NotApplicable,
    Pending,
    Ready,
    Failed,
}

impl ThumbnailState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThumbnailState::NotApplicable => "not_applicable",
            ThumbnailState::Pending => "pending",
            ThumbnailState::Ready => "ready",
            ThumbnailState::Failed => "failed",
        }
    }
}

impl FromStr for ThumbnailState {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_applicable" => Ok(ThumbnailState::NotApplicable),
            "pending" => Ok(ThumbnailState::Pending),
            "ready" => Ok(ThumbnailState::Ready),
            "failed" => Ok(ThumbnailState::Failed),
            other => Err(AppError::InvalidInput(format!(
                "Unknown thumbnail state: {}",
                other
            ))),
        }
    }
}

/// Metadata record for one stored file.
///
/// `code` is immutable once set and is the only input to object-key
/// derivation; `file_name` is display-only and never reaches storage
/// addressing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: Uuid,
    pub kind: FileKind,
    /// Opaque reference to the owning domain entity. Existence is not
    /// validated here.
    pub entity_id: String,
    pub code: Code,
    pub file_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub upload_state: UploadState,
    pub thumbnail_state: ThumbnailState,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// Insert model for a stored file. The id is assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewStoredFile {
    pub kind: FileKind,
    pub entity_id: String,
    pub code: Code,
    pub file_name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_state: ThumbnailState,
}

impl NewStoredFile {
    /// Build an insert model in the initial state for its kind: images start
    /// with a pending thumbnail, attachments never get one.
    pub fn new(
        kind: FileKind,
        entity_id: String,
        code: Code,
        file_name: String,
        title: Option<String>,
        description: Option<String>,
    ) -> Self {
        let thumbnail_state = match kind {
            FileKind::Attachment => ThumbnailState::NotApplicable,
            FileKind::Image => ThumbnailState::Pending,
        };
        Self {
            kind,
            entity_id,
            code,
            file_name,
            title,
            description,
            thumbnail_state,
        }
    }
}

/// What the repository hands back from a delete so the caller can clean up
/// the backing objects.
#[derive(Debug, Clone)]
pub struct DeletedFile {
    pub kind: FileKind,
    pub code: Code,
    pub thumbnail_state: ThumbnailState,
}

impl DeletedFile {
    /// Whether a thumbnail object may exist alongside the original.
    pub fn may_have_thumbnail(&self) -> bool {
        matches!(
            self.thumbnail_state,
            ThumbnailState::Ready | ThumbnailState::Pending | ThumbnailState::Failed
        ) && self.kind == FileKind::Image
    }
}

/// Partial update of the mutable descriptive fields. `None` leaves a field
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileMetadataPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl FileMetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings_roundtrip() {
        for state in [
            UploadState::Pending,
            UploadState::Completed,
            UploadState::Failed,
        ] {
            assert_eq!(state.as_str().parse::<UploadState>().unwrap(), state);
        }
        for state in [
            ThumbnailState::NotApplicable,
            ThumbnailState::Pending,
            ThumbnailState::Ready,
            ThumbnailState::Failed,
        ] {
            assert_eq!(state.as_str().parse::<ThumbnailState>().unwrap(), state);
        }
        for kind in [FileKind::Attachment, FileKind::Image] {
            assert_eq!(kind.as_str().parse::<FileKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<UploadState>().is_err());
    }

    #[test]
    fn test_new_stored_file_initial_thumbnail_state() {
        let code: Code = "abc".parse().unwrap();
        let image = NewStoredFile::new(
            FileKind::Image,
            "e1".to_string(),
            code.clone(),
            "a.png".to_string(),
            None,
            None,
        );
        assert_eq!(image.thumbnail_state, ThumbnailState::Pending);

        let attachment = NewStoredFile::new(
            FileKind::Attachment,
            "e1".to_string(),
            code,
            "a.pdf".to_string(),
            None,
            None,
        );
        assert_eq!(attachment.thumbnail_state, ThumbnailState::NotApplicable);
    }

    #[test]
    fn test_deleted_file_thumbnail_presence() {
        let code: Code = "abc".parse().unwrap();
        let image = DeletedFile {
            kind: FileKind::Image,
            code: code.clone(),
            thumbnail_state: ThumbnailState::Ready,
        };
        assert!(image.may_have_thumbnail());

        let attachment = DeletedFile {
            kind: FileKind::Attachment,
            code,
            thumbnail_state: ThumbnailState::NotApplicable,
        };
        assert!(!attachment.may_have_thumbnail());
    }
}
