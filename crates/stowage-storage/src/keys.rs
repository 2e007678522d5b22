//! Object key derivation.
//!
//! Keys are a pure function of `(kind, code)`. Display names are untrusted
//! input and never appear in a key, so records cannot collide in storage and
//! no path characters can be injected.

use stowage_core::{Code, FileKind};

/// Key of the original object: `attachments/{code}` or `images/{code}`.
pub fn object_key(kind: FileKind, code: &Code) -> String {
    match kind {
        FileKind::Attachment => format!("attachments/{}", code),
        FileKind::Image => format!("images/{}", code),
    }
}

/// Key of the derived thumbnail, stored as a sibling of the original.
pub fn thumbnail_key(code: &Code) -> String {
    format!("images/{}/thumbnail", code)
}
