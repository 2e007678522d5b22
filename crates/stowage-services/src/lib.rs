//! Stowage Services Library
//!
//! Orchestrators over the metadata repository and the object-store gateway:
//! upload registration with presigned-URL issuance, orphan-safe deletion,
//! and the reconciliation sweep that reclaims abandoned pending uploads.
//!
//! All multi-step protocols here are safe to interrupt at any step: the two
//! stores are reconciled eventually (metadata-first creation, idempotent
//! confirm/delete, periodic sweep) rather than transactionally.

pub mod deletion;
pub mod sweep;
pub mod upload;

pub use deletion::DeletionService;
pub use sweep::{SweepReport, SweepService};
pub use upload::{UploadPolicy, UploadService};
