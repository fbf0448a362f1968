//! imghoard: a content addressed image store over HTTP.
//!
//! `PUT /images` stores a multipart `file` field under the SHA-1 of its bytes
//! and returns that fingerprint as the id; `GET /images/{id}` serves the bytes
//! back with their declared content type and a year-long cache directive.
//!
//! Storage is delegated to a [`cas::ObjectStore`]; the handlers keep no state
//! between requests.

pub mod error;
pub mod serve;
pub mod telemetry;
pub mod upload;
pub mod validate;
pub mod web;

pub use error::ApiError;
pub use web::{router, ImagePolicy, UploadResponse, WebState};
