//! Stowage Core Library
//!
//! This crate provides the domain models, error types, configuration and
//! code generation shared across all Stowage components.

pub mod code;
pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use code::{Code, CodeGenerator, UuidCodeGenerator};
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::*;
