mod helpers;

use bytes::Bytes;
use helpers::*;
use std::sync::Arc;

use stowage_core::{AppError, FileKind, FileMetadataPatch, ThumbnailState, UploadState};
use stowage_db::FileRepository;

#[tokio::test]
async fn test_register_attachment_creates_pending_record_with_capability() {
    let app = setup();

    let registered = app
        .upload
        .register_attachment(register_request("e1", "report.pdf", 1000))
        .await
        .unwrap();

    assert!(registered
        .presigned_put_url
        .contains(&format!("attachments/{}", registered.code)));
    assert_eq!(registered.put_ttl_secs, 600);

    let record = app
        .repository
        .get(FileKind::Attachment, registered.record_id)
        .await
        .unwrap();
    assert_eq!(record.upload_state, UploadState::Pending);
    assert_eq!(record.thumbnail_state, ThumbnailState::NotApplicable);
    assert_eq!(record.file_name, "report.pdf");
    assert_eq!(record.code, registered.code);
}

#[tokio::test]
async fn test_pending_record_is_invisible_to_download() {
    let app = setup();

    let registered = app
        .upload
        .register_attachment(register_request("e1", "report.pdf", 1000))
        .await
        .unwrap();

    let err = app
        .upload
        .get_download_url(FileKind::Attachment, registered.record_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_full_image_round_trip() {
    let app = setup();
    let original = png_bytes(200, 100);

    let registered = app
        .upload
        .register_image(register_request("e1", "photo.png", original.len() as u64))
        .await
        .unwrap();

    // The client uploads directly to the object store via the capability.
    let key = format!("images/{}", registered.code);
    app.object_store
        .redeem_put(&key, Bytes::from(original.clone()), "image/png");

    app.upload
        .confirm_upload(FileKind::Image, registered.record_id)
        .await
        .unwrap();

    let record = app
        .repository
        .get(FileKind::Image, registered.record_id)
        .await
        .unwrap();
    assert_eq!(record.upload_state, UploadState::Completed);
    assert_eq!(record.thumbnail_state, ThumbnailState::Ready);

    // Download resolves and the stored bytes are untouched.
    let download = app
        .upload
        .get_download_url(FileKind::Image, registered.record_id)
        .await
        .unwrap();
    assert!(download.url.contains(&key));
    assert_eq!(&app.object_store.object(&key).unwrap()[..], &original[..]);

    // Thumbnail exists as a sibling object within the bounding box.
    let thumb = app
        .upload
        .get_thumbnail_url(registered.record_id)
        .await
        .unwrap()
        .expect("thumbnail should be ready");
    let thumb_key = format!("images/{}/thumbnail", registered.code);
    assert!(thumb.url.contains(&thumb_key));

    let thumb_bytes = app.object_store.object(&thumb_key).unwrap();
    let decoded = image::load_from_memory(&thumb_bytes).unwrap();
    assert!(decoded.width() <= TEST_THUMBNAIL_MAX_PIXELS);
    assert!(decoded.height() <= TEST_THUMBNAIL_MAX_PIXELS);
}

#[tokio::test]
async fn test_confirm_upload_is_idempotent() {
    let app = setup();

    let registered = app
        .upload
        .register_attachment(register_request("e1", "a.bin", 10))
        .await
        .unwrap();
    app.object_store.redeem_put(
        &format!("attachments/{}", registered.code),
        Bytes::from_static(b"0123456789"),
        "application/octet-stream",
    );

    app.upload
        .confirm_upload(FileKind::Attachment, registered.record_id)
        .await
        .unwrap();
    app.upload
        .confirm_upload(FileKind::Attachment, registered.record_id)
        .await
        .unwrap();

    let record = app
        .repository
        .get(FileKind::Attachment, registered.record_id)
        .await
        .unwrap();
    assert_eq!(record.upload_state, UploadState::Completed);
}

#[tokio::test]
async fn test_capacity_boundary() {
    let app = setup();

    // Exactly at the ceiling is accepted.
    app.upload
        .register_attachment(register_request("e1", "max.bin", TEST_MAX_SIZE_BYTES))
        .await
        .unwrap();

    // One byte over is rejected before any record is created.
    let before = app.repository.record_count();
    let err = app
        .upload
        .register_attachment(register_request("e1", "over.bin", TEST_MAX_SIZE_BYTES + 1))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityExceeded { .. }));
    assert_eq!(app.repository.record_count(), before);
}

#[tokio::test]
async fn test_code_collision_retries_then_exhausts() {
    let code = "stuck".parse().unwrap();
    let app = setup_with_generator(Arc::new(FixedCodeGenerator(code)));

    // First registration claims the only code the generator will ever emit.
    app.upload
        .register_attachment(register_request("e1", "a.bin", 10))
        .await
        .unwrap();

    let err = app
        .upload
        .register_attachment(register_request("e1", "b.bin", 10))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::CodeGenerationExhausted { attempts: 5 }
    ));

    // Only the first record exists; the retry loop left nothing behind.
    assert_eq!(app.repository.record_count(), 1);
}

#[tokio::test]
async fn test_same_code_allowed_across_entities() {
    let code = "shared".parse().unwrap();
    let app = setup_with_generator(Arc::new(FixedCodeGenerator(code)));

    app.upload
        .register_attachment(register_request("e1", "a.bin", 10))
        .await
        .unwrap();
    // Compound uniqueness: a different entity may hold the same code.
    app.upload
        .register_attachment(register_request("e2", "b.bin", 10))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_upload_limit_per_entity() {
    let app = setup();

    for i in 0..TEST_MAX_FILES_PER_ENTITY {
        app.upload
            .register_attachment(register_request("e1", &format!("f{}.bin", i), 10))
            .await
            .unwrap();
    }

    let err = app
        .upload
        .register_attachment(register_request("e1", "one-too-many.bin", 10))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UploadLimitReached { .. }));

    // Another entity is unaffected.
    app.upload
        .register_attachment(register_request("e2", "fine.bin", 10))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_thumbnail_failure_degrades_gracefully() {
    let app = setup();

    let registered = app
        .upload
        .register_image(register_request("e1", "broken.png", 10))
        .await
        .unwrap();
    // Client uploads bytes that are not a decodable image.
    app.object_store.redeem_put(
        &format!("images/{}", registered.code),
        Bytes::from_static(b"not an image"),
        "image/png",
    );

    // Confirmation still succeeds.
    app.upload
        .confirm_upload(FileKind::Image, registered.record_id)
        .await
        .unwrap();

    let record = app
        .repository
        .get(FileKind::Image, registered.record_id)
        .await
        .unwrap();
    assert_eq!(record.upload_state, UploadState::Completed);
    assert_eq!(record.thumbnail_state, ThumbnailState::Failed);

    // Download works, thumbnail degrades to "not available".
    app.upload
        .get_download_url(FileKind::Image, registered.record_id)
        .await
        .unwrap();
    let thumb = app
        .upload
        .get_thumbnail_url(registered.record_id)
        .await
        .unwrap();
    assert!(thumb.is_none());
}

#[tokio::test]
async fn test_get_download_url_by_code() {
    let app = setup();

    let registered = app
        .upload
        .register_attachment(register_request("e1", "a.bin", 10))
        .await
        .unwrap();
    app.object_store.redeem_put(
        &format!("attachments/{}", registered.code),
        Bytes::from_static(b"x"),
        "application/octet-stream",
    );
    app.upload
        .confirm_upload(FileKind::Attachment, registered.record_id)
        .await
        .unwrap();

    let download = app
        .upload
        .get_download_url_by_code(FileKind::Attachment, &registered.code)
        .await
        .unwrap();
    assert!(download.url.contains(registered.code.as_str()));
    assert_eq!(download.get_ttl_secs, 3600);
}

#[tokio::test]
async fn test_update_metadata_and_list() {
    let app = setup();

    let registered = app
        .upload
        .register_attachment(register_request("e1", "a.bin", 10))
        .await
        .unwrap();

    let updated = app
        .upload
        .update_metadata(
            FileKind::Attachment,
            registered.record_id,
            FileMetadataPatch {
                title: Some("Quarterly report".to_string()),
                description: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title.as_deref(), Some("Quarterly report"));

    let listed = app
        .upload
        .list_files(FileKind::Attachment, "e1")
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, registered.record_id);

    assert!(app
        .upload
        .list_files(FileKind::Attachment, "other")
        .await
        .unwrap()
        .is_empty());
}
