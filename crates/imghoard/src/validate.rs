//! Upload acceptance rules.
//!
//! Checks size and declared type only; the bytes are never sniffed, so a
//! client that lies about `Content-Type` is believed.

use thiserror::Error;

use crate::upload::UploadedFile;

/// Declared types must start with this to be accepted.
pub const IMAGE_TYPE_PREFIX: &str = "image/";

/// Why an upload was turned away. Logged, never sent to the client.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("no file in form data")]
    Missing,

    #[error("file is empty")]
    Empty,

    #[error("file is larger than {max} bytes")]
    TooLarge { max: u64 },

    #[error("declared type {0:?} is not an image")]
    NotAnImage(Option<String>),
}

/// Accept or reject an upload candidate.
pub fn validate(candidate: Option<UploadedFile>, max_size: u64) -> Result<UploadedFile, Rejection> {
    let file = candidate.ok_or(Rejection::Missing)?;

    if file.size == 0 {
        return Err(Rejection::Empty);
    }
    if file.size > max_size {
        return Err(Rejection::TooLarge { max: max_size });
    }
    match file.media_type.as_deref() {
        Some(t) if t.starts_with(IMAGE_TYPE_PREFIX) => Ok(file),
        other => Err(Rejection::NotAnImage(other.map(str::to_string))),
    }
}
