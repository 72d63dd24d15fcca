/// PDF page tools built on lopdf.
///
/// This module provides functionality to:
/// - Merge documents in order
/// - Extract a subset of pages
/// - Rotate all, odd or even pages
/// - Resize pages onto a standard paper size with scaled, centred content
mod pages;
mod transform;
mod types;

pub use pages::{extract_pages, merge_documents, page_count, parse_ranges};
pub use transform::{fit_page, normalize_rotation, resize_pages, rotate_pages, Placement};
pub use types::{PageSelection, PageSize, PdfError};

/// MIME type to deliver PDF output with
pub const MIME_TYPE: &str = "application/pdf";

/// Name of a merged document
pub const MERGED_FILE_NAME: &str = "merged.pdf";

/// Builds the output name for an edited document, e.g. `rotated_report.pdf`
pub fn output_file_name(prefix: &str, input_name: &str) -> String {
    format!("{}_{}", prefix, input_name)
}
