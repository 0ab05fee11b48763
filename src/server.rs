use crate::batch::{self, BatchInput, BatchReport};
use crate::codec;
use crate::config::Config;
use crate::error::PrepError;
use crate::preprocessing::{Pipeline, PrepConfig};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

/// Per-request overrides for the pipeline configuration
#[derive(Debug, Default, Deserialize)]
pub struct PrepQuery {
    pub block_size: Option<u32>,
    pub k: Option<f32>,
    pub r: Option<f32>,
}

impl PrepQuery {
    fn merge_into(&self, defaults: PrepConfig) -> PrepConfig {
        PrepConfig {
            block_size: self.block_size.unwrap_or(defaults.block_size),
            k: self.k.unwrap_or(defaults.k),
            r: self.r.unwrap_or(defaults.r),
        }
    }
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Server info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub version: String,
    pub supported_formats: Vec<String>,
    pub max_file_size_bytes: usize,
    pub defaults: PrepConfig,
}

/// Run the HTTP server
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let max_file_size = config.max_file_size;

    let state = AppState {
        config: Arc::new(config),
    };

    let app = Router::new()
        .route("/preprocess", post(handle_preprocess))
        .route("/preprocess/batch", post(handle_batch))
        .route("/health", get(handle_health))
        .route("/info", get(handle_info))
        .layer(DefaultBodyLimit::max(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Preprocess a single uploaded image and return the binarized PNG
async fn handle_preprocess(
    State(state): State<AppState>,
    Query(query): Query<PrepQuery>,
    multipart: Multipart,
) -> Result<impl IntoResponse, PrepError> {
    let config = query.merge_into(state.config.defaults);
    config.validate()?;

    let inputs = read_files(multipart, state.config.max_file_size).await?;
    let input = inputs.into_iter().next().ok_or(PrepError::MissingFile)?;

    // CPU-bound work goes on a blocking worker so the runtime stays
    // responsive.
    let (png, time_ms) = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::new(config)?;
        let rgba = codec::decode_rgba(&input.bytes)?;
        let result = pipeline.process(&rgba);
        let png = codec::encode_png(&result.image)?;
        Ok::<_, PrepError>((png, result.total_time_ms))
    })
    .await
    .map_err(|e| PrepError::Internal(format!("Worker task failed: {}", e)))??;

    tracing::info!(
        "preprocessed {} in {}ms ({} bytes out)",
        input.name,
        time_ms,
        png.len()
    );

    Ok((
        [
            ("content-type", "image/png".to_string()),
            ("x-preprocess-time-ms", time_ms.to_string()),
        ],
        png,
    ))
}

/// Preprocess a batch of uploads; continue-on-error, JSON report out
async fn handle_batch(
    State(state): State<AppState>,
    Query(query): Query<PrepQuery>,
    multipart: Multipart,
) -> Result<Json<BatchReport>, PrepError> {
    let config = query.merge_into(state.config.defaults);
    config.validate()?;

    let inputs = read_files(multipart, state.config.max_file_size).await?;
    if inputs.is_empty() {
        return Err(PrepError::MissingFile);
    }

    let report = tokio::task::spawn_blocking(move || batch::process_batch(inputs, config))
        .await
        .map_err(|e| PrepError::Internal(format!("Worker task failed: {}", e)))??;

    tracing::info!(
        "batch complete: {} succeeded, {} failed of {}",
        report.succeeded,
        report.failed,
        report.total
    );

    Ok(Json(report))
}

/// Collect all `file` fields from a multipart form, in submission order.
async fn read_files(
    mut multipart: Multipart,
    max_file_size: usize,
) -> Result<Vec<BatchInput>, PrepError> {
    let mut inputs = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PrepError::InvalidRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" {
            // Ignore unknown fields
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("upload-{}", inputs.len() + 1));
        let bytes = field
            .bytes()
            .await
            .map_err(|e| PrepError::InvalidRequest(format!("Failed to read file data: {}", e)))?;

        if bytes.len() > max_file_size {
            return Err(PrepError::ImageTooLarge {
                size: bytes.len(),
                max: max_file_size,
            });
        }

        inputs.push(BatchInput {
            name: file_name,
            bytes: bytes.to_vec(),
        });
    }

    Ok(inputs)
}

/// Handle health check requests
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handle info requests
async fn handle_info(State(state): State<AppState>) -> impl IntoResponse {
    Json(InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        supported_formats: vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/bmp".to_string(),
            "image/webp".to_string(),
            "image/tiff".to_string(),
        ],
        max_file_size_bytes: state.config.max_file_size,
        defaults: state.config.defaults,
    })
}
