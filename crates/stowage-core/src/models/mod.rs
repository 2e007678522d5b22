//! Data models for the application
//!
//! Domain records for stored files plus the request/response models the
//! orchestrators exchange with the (external) HTTP layer.

mod requests;
mod stored_file;

pub use requests::*;
pub use stored_file::*;
