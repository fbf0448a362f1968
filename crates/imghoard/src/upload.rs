//! Multipart parsing for image uploads.
//!
//! The form is parsed into a typed `Option<UploadedFile>`. Only the first
//! `file` field is considered, and it counts as a file only if it carries a
//! filename. A plain text value there means no file, even if a later `file`
//! field holds one.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};

use crate::error::ApiError;

/// Form field carrying the image.
pub const FILE_FIELD: &str = "file";

/// A file taken from the upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename. Advisory only; never used for addressing.
    pub name: String,
    /// Declared content type of the part, if the client sent one.
    pub media_type: Option<String>,
    /// Bytes seen on the wire. When this exceeds the read limit, reading
    /// stopped early and `content` holds only a prefix.
    pub size: u64,
    pub content: Bytes,
}

/// Pull the first `file` field out of the form.
///
/// At most `max_size + 1` bytes are buffered; anything beyond that is left
/// unread so oversized uploads cost no more memory than the limit.
pub async fn read_file_field(
    multipart: &mut Multipart,
    max_size: u64,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(name) = field.file_name().map(str::to_string) else {
            tracing::debug!("first '{}' field has no filename", FILE_FIELD);
            return Ok(None);
        };
        let media_type = field.content_type().map(str::to_string);
        let (size, content) = read_limited(field, max_size).await?;

        return Ok(Some(UploadedFile {
            name,
            media_type,
            size,
            content,
        }));
    }

    Ok(None)
}

async fn read_limited(mut field: Field<'_>, max_size: u64) -> Result<(u64, Bytes), ApiError> {
    let mut buf = BytesMut::new();
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_size {
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok((size, buf.freeze()))
}

/// Body-limit overruns are oversized files; every other parse failure is
/// unexpected.
fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!("upload exceeded body limit: {}", err.body_text());
        ApiError::InvalidFile
    } else {
        ApiError::Unexpected(anyhow::Error::new(err).context("failed to parse multipart body"))
    }
}
