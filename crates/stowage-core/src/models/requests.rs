use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::code::Code;

/// Request to register a new file and receive a presigned upload URL
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterFileRequest {
    /// ID of the entity the file relates to
    #[validate(length(
        min = 1,
        max = 255,
        message = "Entity id must be between 1 and 255 characters"
    ))]
    pub entity_id: String,
    /// Display file name; never used for storage addressing
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub file_name: String,
    /// Content type (MIME type) the client will upload with
    #[validate(length(
        min = 1,
        max = 255,
        message = "Content type must be between 1 and 255 characters"
    ))]
    pub content_type: String,
    /// Declared file size in bytes; the presigned URL is capped to this
    #[validate(range(min = 1, message = "File size must be at least 1 byte"))]
    pub declared_size: u64,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Response to a registration: the record plus the upload capability
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredUpload {
    pub record_id: Uuid,
    pub code: Code,
    /// Presigned PUT URL for direct upload to the object store
    pub presigned_put_url: String,
    pub put_ttl_secs: u64,
    /// URL expiration time
    pub expires_at: DateTime<Utc>,
}

/// A presigned GET capability for a stored file or its thumbnail
#[derive(Debug, Clone, Serialize)]
pub struct PresignedDownload {
    pub url: String,
    pub get_ttl_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterFileRequest {
        RegisterFileRequest {
            entity_id: "e1".to_string(),
            file_name: "report.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            declared_size: 1024,
            title: None,
            description: None,
        }
    }

    #[test]
    fn test_valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut req = request();
        req.entity_id = String::new();
        assert!(req.validate().is_err());

        let mut req = request();
        req.file_name = String::new();
        assert!(req.validate().is_err());

        let mut req = request();
        req.declared_size = 0;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_overlong_file_name_rejected() {
        let mut req = request();
        req.file_name = "x".repeat(256);
        assert!(req.validate().is_err());
    }
}
