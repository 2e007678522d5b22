//! Shared test fixtures: in-memory stores wired into the orchestrators.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use stowage_core::{AppError, Code, CodeGenerator, RegisterFileRequest, UuidCodeGenerator};
use stowage_db::MemoryFileRepository;
use stowage_services::{DeletionService, UploadPolicy, UploadService};
use stowage_storage::MemoryObjectStore;

pub const TEST_MAX_SIZE_BYTES: u64 = 1024 * 1024;
pub const TEST_MAX_FILES_PER_ENTITY: u32 = 3;
pub const TEST_THUMBNAIL_MAX_PIXELS: u32 = 64;

pub struct TestApp {
    pub repository: Arc<MemoryFileRepository>,
    pub object_store: Arc<MemoryObjectStore>,
    pub upload: UploadService,
    pub deletion: DeletionService,
}

pub fn test_policy() -> UploadPolicy {
    UploadPolicy {
        max_attachment_size_bytes: TEST_MAX_SIZE_BYTES,
        put_url_expiry: Duration::from_secs(600),
        get_url_expiry: Duration::from_secs(3600),
        max_files_per_entity: TEST_MAX_FILES_PER_ENTITY,
        thumbnail_max_pixels: TEST_THUMBNAIL_MAX_PIXELS,
    }
}

pub fn setup() -> TestApp {
    setup_with_generator(Arc::new(UuidCodeGenerator))
}

pub fn setup_with_generator(generator: Arc<dyn CodeGenerator>) -> TestApp {
    let repository = Arc::new(MemoryFileRepository::new());
    let object_store = Arc::new(MemoryObjectStore::new());

    let upload = UploadService::new(
        repository.clone(),
        object_store.clone(),
        generator,
        test_policy(),
    );
    let deletion = DeletionService::new(repository.clone(), object_store.clone());

    TestApp {
        repository,
        object_store,
        upload,
        deletion,
    }
}

pub fn register_request(entity_id: &str, file_name: &str, size: u64) -> RegisterFileRequest {
    RegisterFileRequest {
        entity_id: entity_id.to_string(),
        file_name: file_name.to_string(),
        content_type: "application/octet-stream".to_string(),
        declared_size: size,
        title: None,
        description: None,
    }
}

/// Generator that always returns the same code; forces insert conflicts.
pub struct FixedCodeGenerator(pub Code);

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> Result<Code, AppError> {
        Ok(self.0.clone())
    }
}

/// A small gradient PNG for thumbnail tests.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 96, 255])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut buffer, ImageFormat::Png)
        .unwrap();
    buffer.into_inner()
}
