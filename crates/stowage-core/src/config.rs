//! Configuration module
//!
//! Environment-driven configuration for the metadata store, object store and
//! upload policy. Values not present in the environment fall back to the
//! defaults below; a `.env` file is honored when present.

use std::env;

// Defaults
const DEFAULT_MAX_ATTACHMENT_SIZE_BYTES: u64 = 100 * 1024 * 1024;
const DEFAULT_PUT_URL_EXPIRY_SECS: u64 = 600;
const DEFAULT_GET_URL_EXPIRY_SECS: u64 = 3600;
const DEFAULT_THUMBNAIL_MAX_PIXELS: u32 = 300;
const DEFAULT_STALE_PENDING_SECS: i64 = 86_400;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;
const DEFAULT_SWEEP_PAGE_SIZE: i64 = 100;
const DEFAULT_MAX_FILES_PER_ENTITY: u32 = 50;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    // Object store configuration
    pub s3_bucket: String,
    pub s3_region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Ceph RGW, etc.)
    pub s3_endpoint: Option<String>,
    // Upload policy
    pub max_attachment_size_bytes: u64,
    pub put_url_expiry_secs: u64,
    pub get_url_expiry_secs: u64,
    pub max_files_per_entity: u32,
    // Thumbnails
    pub thumbnail_max_pixels: u32,
    // Reconciliation sweep
    /// Age in seconds after which a pending record is considered abandoned.
    pub stale_pending_secs: i64,
    pub sweep_interval_secs: u64,
    pub sweep_page_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        // Load .env if present; ignore absence.
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let s3_bucket =
            env::var("S3_BUCKET").map_err(|_| anyhow::anyhow!("S3_BUCKET must be set"))?;
        let s3_region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let s3_endpoint = env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty());

        let config = Config {
            database_url,
            s3_bucket,
            s3_region,
            s3_endpoint,
            max_attachment_size_bytes: parse_env(
                "MAX_ATTACHMENT_SIZE_BYTES",
                DEFAULT_MAX_ATTACHMENT_SIZE_BYTES,
            )?,
            put_url_expiry_secs: parse_env("PUT_URL_EXPIRY_SECS", DEFAULT_PUT_URL_EXPIRY_SECS)?,
            get_url_expiry_secs: parse_env("GET_URL_EXPIRY_SECS", DEFAULT_GET_URL_EXPIRY_SECS)?,
            max_files_per_entity: parse_env("MAX_FILES_PER_ENTITY", DEFAULT_MAX_FILES_PER_ENTITY)?,
            thumbnail_max_pixels: parse_env("THUMBNAIL_MAX_PIXELS", DEFAULT_THUMBNAIL_MAX_PIXELS)?,
            stale_pending_secs: parse_env("STALE_PENDING_SECS", DEFAULT_STALE_PENDING_SECS)?,
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL_SECS)?,
            sweep_page_size: parse_env("SWEEP_PAGE_SIZE", DEFAULT_SWEEP_PAGE_SIZE)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_attachment_size_bytes == 0 {
            anyhow::bail!("MAX_ATTACHMENT_SIZE_BYTES must be greater than zero");
        }
        if self.put_url_expiry_secs == 0 || self.get_url_expiry_secs == 0 {
            anyhow::bail!("presigned URL expiries must be greater than zero");
        }
        if self.thumbnail_max_pixels == 0 {
            anyhow::bail!("THUMBNAIL_MAX_PIXELS must be greater than zero");
        }
        if self.stale_pending_secs <= 0 {
            anyhow::bail!("STALE_PENDING_SECS must be greater than zero");
        }
        if self.sweep_page_size <= 0 {
            anyhow::bail!("SWEEP_PAGE_SIZE must be greater than zero");
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/stowage".to_string(),
            s3_bucket: "stowage".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint: None,
            max_attachment_size_bytes: DEFAULT_MAX_ATTACHMENT_SIZE_BYTES,
            put_url_expiry_secs: DEFAULT_PUT_URL_EXPIRY_SECS,
            get_url_expiry_secs: DEFAULT_GET_URL_EXPIRY_SECS,
            max_files_per_entity: DEFAULT_MAX_FILES_PER_ENTITY,
            thumbnail_max_pixels: DEFAULT_THUMBNAIL_MAX_PIXELS,
            stale_pending_secs: DEFAULT_STALE_PENDING_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            sweep_page_size: DEFAULT_SWEEP_PAGE_SIZE,
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = base_config();
        config.max_attachment_size_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.put_url_expiry_secs = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.stale_pending_secs = 0;
        assert!(config.validate().is_err());
    }
}
