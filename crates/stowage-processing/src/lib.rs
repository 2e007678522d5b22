//! Stowage Processing Library
//!
//! Image thumbnail derivation. This is the only content transformation the
//! service performs; everything else passes between client and object store
//! untouched.

pub mod thumbnail;

pub use thumbnail::{DerivedImage, Thumbnailer};
