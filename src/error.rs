//! Error types for the PDF toolbox library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the PDF toolbox library
#[derive(Error, Debug)]
pub enum Error {
    /// Source bytes could not be parsed, or a page could not be read
    #[error("Corrupt document '{document}': {reason}")]
    DocumentCorrupt { document: String, reason: String },

    /// Rotation angle outside {0, 90, 180, 270}
    #[error("Invalid rotation: {0} degrees (expected 0, 90, 180 or 270)")]
    InvalidRotation(i64),

    /// Split group size outside [1, total pages]
    #[error("Invalid split granularity: {requested} pages per part (document has {total} pages)")]
    InvalidGranularity { requested: u32, total: u32 },

    /// Merge called without any documents
    #[error("No input documents provided")]
    EmptyInput,

    /// Document (or merge result) without pages
    #[error("Document has no pages: {0}")]
    EmptyDocument(String),

    /// A page position past the end of the document
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    /// Page positions are 1-based; 0 names no page
    #[error("Invalid page position {0}: pages are numbered from 1")]
    InvalidPagePosition(u32),

    /// Order names a document that was never uploaded
    #[error("Unknown document in merge order: {0}")]
    UnknownDocument(String),

    /// A second upload under a name already in the session
    #[error("A document named '{0}' is already uploaded")]
    DuplicateDocument(String),

    /// Unrecognized paper size
    #[error("Invalid paper size: {0}")]
    InvalidPaperSize(String),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Invalid glob pattern
    #[error("Invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// No files matched pattern
    #[error("No PDF files found matching pattern: {0}")]
    NoFilesMatched(String),

    /// Configuration file could not be applied
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// PDF processing error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration parse error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Corrupt-document error for a whole document
    pub fn corrupt(document: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::DocumentCorrupt {
            document: document.into(),
            reason: reason.to_string(),
        }
    }

    /// Corrupt-document error pinned to a single 1-based page
    pub fn corrupt_page(document: impl Into<String>, page: u32, reason: impl std::fmt::Display) -> Self {
        Error::DocumentCorrupt {
            document: document.into(),
            reason: format!("page {}: {}", page, reason),
        }
    }
}
