//! Stowage DB Library
//!
//! Metadata repository for stored-file records. The repository is the single
//! source of truth for record existence; the object store only ever holds
//! bytes. `PgFileRepository` is the production implementation;
//! `MemoryFileRepository` backs orchestrator tests and local development.

pub mod memory;
pub mod postgres;
pub mod repository;

pub use memory::MemoryFileRepository;
pub use postgres::PgFileRepository;
pub use repository::FileRepository;
