//! PDF Toolbox Library
//!
//! Merge, split, resize and rotate PDF pages in memory.
//! This library provides functionality to:
//! - Merge documents in a chosen order, optionally normalizing page size
//! - Split a document into single pages or fixed-size page groups
//! - Normalize pages to a paper size by cropping or fit-centering
//! - Rotate individual pages without re-rendering them
//!
//! # Example
//!
//! ```no_run
//! use pdf_toolbox::pdf::{split_document, MergeOptions, SplitGranularity};
//! use pdf_toolbox::session::{MergeRequest, Session};
//! use pdf_toolbox::source::FileSource;
//!
//! let mut session = Session::new();
//! session.upload(&FileSource::new("1. intro.pdf")).unwrap();
//! session.upload(&FileSource::new("2. advanced.pdf")).unwrap();
//!
//! let merged = session
//!     .merge(&MergeRequest {
//!         order: None,
//!         options: MergeOptions::new("handout").normalize_to_a4(),
//!     })
//!     .expect("Failed to merge PDFs");
//! merged.write_to(std::path::Path::new("handout.pdf")).unwrap();
//!
//! let parts = split_document(&session.documents()[0], SplitGranularity::EachPage).unwrap();
//! assert_eq!(parts[0].name(), "page_1.pdf");
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod session;
pub mod source;

#[cfg(test)]
mod test_support;

// Re-export commonly used items
pub use error::{Error, Result};
pub use layout::PaperSize;
pub use output::OutputDocument;
pub use session::{MergeRequest, PageOrderSpec, Session, SplitRequest};
pub use source::{ByteSource, FileSource, MemorySource, SourceDocument};
