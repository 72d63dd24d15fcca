use serde::Deserialize;
use std::str::FromStr;

/// Errors that can occur while editing PDF documents
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// IO errors when reading/writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The input could not be loaded as a PDF
    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    /// Page numbers that are malformed or outside the document
    #[error("Invalid page range: {0}")]
    InvalidRange(String),

    /// Invalid parameter values
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The document structure could not be edited or saved
    #[error("PDF operation failed: {0}")]
    Operation(String),
}

/// Paper sizes pages can be resized to, in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    A3,
    A5,
}

/// Which pages of a document an edit applies to (page numbers are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PageSelection {
    #[default]
    All,
    Odd,
    Even,
}

impl PageSize {
    /// Width and height in points, portrait
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            PageSize::A4 => (595, 842),
            PageSize::Letter => (612, 792),
            PageSize::A3 => (842, 1191),
            PageSize::A5 => (420, 595),
        }
    }
}

impl PageSelection {
    pub fn contains(self, page_number: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Odd => page_number % 2 == 1,
            PageSelection::Even => page_number % 2 == 0,
        }
    }
}

impl FromStr for PageSize {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            "a3" => Ok(PageSize::A3),
            "a5" => Ok(PageSize::A5),
            other => Err(PdfError::InvalidParams(format!(
                "Unknown page size: {} (expected a4, letter, a3 or a5)",
                other
            ))),
        }
    }
}

impl FromStr for PageSelection {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(PageSelection::All),
            "odd" => Ok(PageSelection::Odd),
            "even" => Ok(PageSelection::Even),
            other => Err(PdfError::InvalidParams(format!(
                "Unknown page selection: {} (expected all, odd or even)",
                other
            ))),
        }
    }
}
