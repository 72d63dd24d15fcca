use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tokio::task;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::audio::{AudioError, WavContainer};
use crate::config::{Config, PdfConfig, QualityLimits};
use crate::convert::{self, ResampleJob};

const BYTES_PER_MB: usize = 1024 * 1024;

/// Accepted by file name when the browser sends no audio content type
const AUDIO_EXTENSIONS: [&str; 8] = ["wav", "mp3", "flac", "ogg", "oga", "aif", "aiff", "aifc"];

// App state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Defaults for every request; `quality` can be overridden per upload
    pub job: ResampleJob,
    pub limits: QualityLimits,
    /// Defaults for the PDF resize tool
    pub pdf: PdfConfig,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let server = config.server_or_default();
        AppState {
            job: config.job(),
            limits: server.limits,
            pdf: config.pdf,
            max_upload_bytes: (server.max_file_size_mb as usize).saturating_mul(BYTES_PER_MB),
        }
    }
}

/// Builds the router for the Web UI
pub fn app(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route("/limits", get(limits_handler))
        .route("/resample", post(resample_handler))
        .merge(super::pdf_routes::routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(Arc::new(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
}

// Handler for the index page
async fn index_handler() -> impl IntoResponse {
    let html = include_str!("static/index.html");
    Html(html)
}

// Handler for the quality limits shown by the page
async fn limits_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "min_quality": state.limits.min_quality,
        "max_quality": state.limits.max_quality,
        "default_quality": state.job.quality,
        "max_file_size_mb": state.max_upload_bytes / BYTES_PER_MB
    }))
}

fn is_audio_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let audio_type = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map_or(false, |m| m.type_() == mime::AUDIO);
    let file_name = file_name.to_ascii_lowercase();
    audio_type
        || AUDIO_EXTENSIONS
            .iter()
            .any(|ext| file_name.ends_with(&format!(".{}", ext)))
}

/// Keeps the download name safe to place inside a quoted header value
pub(super) fn header_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn error_status(err: &AudioError) -> StatusCode {
    match err {
        AudioError::Io(_) | AudioError::ProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AudioError::WavParse(_)
        | AudioError::Decode(_)
        | AudioError::InvalidInput(_)
        | AudioError::InvalidParams(_) => StatusCode::BAD_REQUEST,
    }
}

// Handler for resampling an uploaded audio file
async fn resample_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let mut upload: Option<(String, Bytes)> = None;
    let mut quality = state.job.quality;

    // Process the multipart form
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to process form: {}", e),
        )
    })? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "audio_file" => {
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "audio.wav".to_string());

                // Only accept audio files
                if !is_audio_upload(&file_name, field.content_type()) {
                    return Err((
                        StatusCode::BAD_REQUEST,
                        "Only audio files are accepted".to_string(),
                    ));
                }

                let data = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file: {}", e),
                    )
                })?;
                upload = Some((file_name, data));
            }
            "quality" => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read quality: {}", e),
                    )
                })?;
                quality = text.trim().parse::<f64>().map_err(|_| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Quality is not a number: {}", text.trim()),
                    )
                })?;
            }
            _ => {}
        }
    }

    if !state.limits.contains(quality) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Quality must be between {} and {}",
                state.limits.min_quality, state.limits.max_quality
            ),
        ));
    }

    let (file_name, data) = upload.ok_or_else(|| {
        (
            StatusCode::BAD_REQUEST,
            "No audio file was uploaded".to_string(),
        )
    })?;

    let job = ResampleJob {
        quality,
        ..state.job.clone()
    };
    let download_name = header_file_name(&convert::output_file_name(
        &file_name,
        &job.output_suffix,
    ));

    // Resampling is CPU-bound, keep it off the async workers
    let extension = Path::new(&file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_string);
    let wav = task::spawn_blocking(move || {
        convert::resample_bytes(&data, extension.as_deref(), &job)
    })
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Resampling task failed: {}", e),
            )
        })?
        .map_err(|e| {
            tracing::warn!("Failed to resample {}: {}", file_name, e);
            (error_status(&e), format!("Failed to resample audio: {}", e))
        })?;

    tracing::info!(
        "Resampled {} at quality {} ({} bytes)",
        file_name,
        quality,
        wav.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, WavContainer::MIME_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download_name),
            ),
        ],
        wav.into_bytes(),
    ))
}
