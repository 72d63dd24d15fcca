use axum::{
    body::Bytes,
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task;

use super::routes::{header_file_name, AppState};
use crate::pdf::{self, PageSelection, PageSize, PdfError};

type HandlerError = (StatusCode, String);

/// Uploaded PDF files in form order plus the text fields
#[derive(Debug, Default)]
struct PdfForm {
    files: Vec<(String, Bytes)>,
    fields: HashMap<String, String>,
}

impl PdfForm {
    fn single_file(mut self) -> Result<(String, Bytes, HashMap<String, String>), HandlerError> {
        match self.files.len() {
            1 => {
                let (name, data) = self.files.remove(0);
                Ok((name, data, self.fields))
            }
            0 => Err((
                StatusCode::BAD_REQUEST,
                "No PDF file was uploaded".to_string(),
            )),
            n => Err((
                StatusCode::BAD_REQUEST,
                format!("Expected one PDF file, got {}", n),
            )),
        }
    }
}

/// Routes for the PDF tools, mounted under `/pdf`
pub(super) fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pdf/merge", post(merge_handler))
        .route("/pdf/extract", post(extract_handler))
        .route("/pdf/rotate", post(rotate_handler))
        .route("/pdf/resize", post(resize_handler))
}

fn is_pdf_upload(file_name: &str, content_type: Option<&str>) -> bool {
    let pdf_type = content_type
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .map_or(false, |m| m.essence_str() == pdf::MIME_TYPE);
    pdf_type || file_name.to_ascii_lowercase().ends_with(".pdf")
}

fn error_status(err: &PdfError) -> StatusCode {
    match err {
        PdfError::Io(_) | PdfError::Operation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PdfError::Parse(_) | PdfError::InvalidRange(_) | PdfError::InvalidParams(_) => {
            StatusCode::BAD_REQUEST
        }
    }
}

fn bad_request(err: PdfError) -> HandlerError {
    (StatusCode::BAD_REQUEST, err.to_string())
}

async fn read_form(mut multipart: Multipart) -> Result<PdfForm, HandlerError> {
    let mut form = PdfForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to process form: {}", e),
        )
    })? {
        let name = field.name().unwrap_or("").to_string();
        if name == "pdf_file" {
            let file_name = field
                .file_name()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "document.pdf".to_string());

            if !is_pdf_upload(&file_name, field.content_type()) {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "Only PDF files are accepted".to_string(),
                ));
            }

            let data = field.bytes().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read file: {}", e),
                )
            })?;
            form.files.push((file_name, data));
        } else {
            let text = field.text().await.map_err(|e| {
                (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read {}: {}", name, e),
                )
            })?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Runs a PDF edit off the async workers and wraps the result as a download
async fn run_pdf_task<F>(
    download_name: String,
    task_fn: F,
) -> Result<impl IntoResponse, HandlerError>
where
    F: FnOnce() -> Result<Vec<u8>, PdfError> + Send + 'static,
{
    let bytes = task::spawn_blocking(task_fn)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("PDF task failed: {}", e),
            )
        })?
        .map_err(|e| {
            tracing::warn!("Failed to produce {}: {}", download_name, e);
            (error_status(&e), format!("Failed to process PDF: {}", e))
        })?;

    tracing::info!("Produced {} ({} bytes)", download_name, bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, pdf::MIME_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!(
                    "attachment; filename=\"{}\"",
                    header_file_name(&download_name)
                ),
            ),
        ],
        bytes,
    ))
}

// Handler for merging every uploaded PDF in upload order
async fn merge_handler(multipart: Multipart) -> Result<impl IntoResponse, HandlerError> {
    let form = read_form(multipart).await?;
    if form.files.len() < 2 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Select at least two PDF files to merge".to_string(),
        ));
    }

    let documents: Vec<Vec<u8>> = form.files.into_iter().map(|(_, data)| data.to_vec()).collect();
    run_pdf_task(pdf::MERGED_FILE_NAME.to_string(), move || {
        pdf::merge_documents(&documents)
    })
    .await
}

// Handler for extracting pages, e.g. pages=1-3,5
async fn extract_handler(multipart: Multipart) -> Result<impl IntoResponse, HandlerError> {
    let (file_name, data, fields) = read_form(multipart).await?.single_file()?;
    let pages = pdf::parse_ranges(fields.get("pages").map_or("", String::as_str))
        .map_err(bad_request)?;

    run_pdf_task(pdf::output_file_name("extracted", &file_name), move || {
        pdf::extract_pages(&data, &pages)
    })
    .await
}

// Handler for rotating all, odd or even pages
async fn rotate_handler(multipart: Multipart) -> Result<impl IntoResponse, HandlerError> {
    let (file_name, data, fields) = read_form(multipart).await?.single_file()?;
    let degrees = match fields.get("degrees") {
        Some(text) => text.trim().parse::<i64>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Rotation is not a number: {}", text.trim()),
            )
        })?,
        None => 90,
    };
    let selection = match fields.get("pages") {
        Some(text) => text.parse::<PageSelection>().map_err(bad_request)?,
        None => PageSelection::All,
    };

    run_pdf_task(pdf::output_file_name("rotated", &file_name), move || {
        pdf::rotate_pages(&data, degrees, selection)
    })
    .await
}

// Handler for putting pages on a new paper size
async fn resize_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let (file_name, data, fields) = read_form(multipart).await?.single_file()?;
    let size = match fields.get("page_size") {
        Some(text) => text.parse::<PageSize>().map_err(bad_request)?,
        None => state.pdf.page_size,
    };
    let scale = match fields.get("scale") {
        Some(text) => text.trim().parse::<f32>().map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                format!("Scale is not a number: {}", text.trim()),
            )
        })?,
        None => state.pdf.scale_percent,
    };

    run_pdf_task(pdf::output_file_name("resized", &file_name), move || {
        pdf::resize_pages(&data, size, scale)
    })
    .await
}
