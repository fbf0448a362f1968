//! HTTP surface: upload and fetch images by content fingerprint.
//!
//! | Method | Path          | Success                                      |
//! |--------|---------------|----------------------------------------------|
//! | PUT    | `/images`     | `{"id": "<40 hex chars>"}`                   |
//! | GET    | `/images/:id` | raw bytes, stored `Content-Type`, cacheable  |
//! | GET    | `/health`     | liveness JSON                                |

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection, rejection::PathRejection, DefaultBodyLimit, Multipart,
        Path, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use cas::{Fingerprint, ObjectStore};
use hoardconf::ImagesConfig;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::upload;
use crate::validate;

/// Served when an object has no usable stored type.
pub const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Limits and response headers, fixed at startup.
#[derive(Debug, Clone)]
pub struct ImagePolicy {
    pub max_image_size: u64,
    pub cache_control: HeaderValue,
}

impl ImagePolicy {
    pub fn from_config(config: &ImagesConfig) -> anyhow::Result<Self> {
        let cache_control = HeaderValue::from_str(&config.cache_control)
            .with_context(|| format!("invalid cache_control: {:?}", config.cache_control))?;
        Ok(Self {
            max_image_size: config.max_image_size,
            cache_control,
        })
    }

    fn body_limit(&self) -> usize {
        usize::try_from(self.max_image_size.saturating_add(MULTIPART_OVERHEAD))
            .unwrap_or(usize::MAX)
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self {
            max_image_size: hoardconf::DEFAULT_MAX_IMAGE_SIZE,
            cache_control: HeaderValue::from_static(hoardconf::DEFAULT_CACHE_CONTROL),
        }
    }
}

/// Shared state for web handlers
#[derive(Clone)]
pub struct WebState {
    pub store: Arc<dyn ObjectStore>,
    pub policy: Arc<ImagePolicy>,
    pub started: Instant,
}

impl WebState {
    pub fn new(store: Arc<dyn ObjectStore>, policy: ImagePolicy) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            started: Instant::now(),
        }
    }
}

pub fn router(state: WebState) -> Router {
    let body_limit = state.policy.body_limit();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/images", put(upload_image))
        .route("/images/", get(missing_id))
        .route("/images/{id}", get(fetch_image))
        .route("/health", get(health))
        .method_not_allowed_fallback(no_route)
        .fallback(no_route)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: String,
}

#[tracing::instrument(skip_all, fields(image.id = tracing::field::Empty))]
async fn upload_image(
    State(state): State<WebState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.context("request body is not multipart form data")?;

    let candidate = upload::read_file_field(&mut multipart, state.policy.max_image_size).await?;
    let file = validate::validate(candidate, state.policy.max_image_size).map_err(|reason| {
        tracing::warn!(%reason, "rejecting upload");
        ApiError::InvalidFile
    })?;

    tracing::info!(
        name = %file.name,
        size = file.size,
        media_type = file.media_type.as_deref().unwrap_or_default(),
        "got file"
    );

    let store = Arc::clone(&state.store);
    let (key, receipt) = tokio::task::spawn_blocking(move || {
        let key = Fingerprint::from_data(&file.content);
        let receipt = store.put(&key, &file.content, file.media_type.as_deref())?;
        anyhow::Ok((key, receipt))
    })
    .await
    .context("store write task failed")??;

    tracing::Span::current().record("image.id", key.as_str());

    let Some(receipt) = receipt else {
        return Err(ApiError::SaveFailed);
    };
    tracing::info!(
        uploaded = %receipt.uploaded,
        created = receipt.created,
        "saved image"
    );

    Ok(Json(UploadResponse {
        id: key.into_inner(),
    }))
}

async fn missing_id() -> ApiError {
    ApiError::MissingId
}

#[tracing::instrument(skip_all, fields(image.id = tracing::field::Empty))]
async fn fetch_image(
    State(state): State<WebState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let Path(id) = id.context("failed to extract image id")?;
    if id.is_empty() {
        return Err(ApiError::MissingId);
    }
    tracing::Span::current().record("image.id", id.as_str());

    let store = Arc::clone(&state.store);
    let object = tokio::task::spawn_blocking(move || store.get(&id))
        .await
        .context("store read task failed")??
        .ok_or(ApiError::NotFound)?;

    let content_type = resolve_content_type(object.content_type());

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, state.policy.cache_control.clone())
        .body(Body::from(object.content))
        .context("failed to build image response")
        .map_err(ApiError::from)
}

/// The stored type without parameters (`image/png; q=1` → `image/png`), or
/// JPEG when nothing usable was stored.
pub fn resolve_content_type(stored: Option<&str>) -> HeaderValue {
    stored
        .and_then(|t| t.split(';').next())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| HeaderValue::from_str(t).ok())
        .unwrap_or_else(|| HeaderValue::from_static(FALLBACK_CONTENT_TYPE))
}

async fn health(State(state): State<WebState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.started.elapsed().as_secs(),
    }))
}

async fn no_route() -> ApiError {
    ApiError::NoRoute
}
