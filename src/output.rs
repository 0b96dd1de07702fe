//! Finished, named output buffers

use std::path::{Path, PathBuf};

use lopdf::Document;

use crate::error::Result;
use crate::source::ByteSource;

/// A serialized PDF ready to be offered for download or written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct OutputDocument {
    name: String,
    bytes: Vec<u8>,
    first_page: u32,
    last_page: u32,
}

impl OutputDocument {
    /// Serialize a whole document; pages are numbered from 1
    pub(crate) fn from_document(name: impl Into<String>, doc: Document) -> Result<Self> {
        let last_page = doc.get_pages().len() as u32;
        Self::from_document_range(name, doc, 1, last_page)
    }

    /// Serialize a document holding pages `first_page..=last_page` of some source
    pub(crate) fn from_document_range(
        name: impl Into<String>,
        mut doc: Document,
        first_page: u32,
        last_page: u32,
    ) -> Result<Self> {
        doc.compress();
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(Self {
            name: name.into(),
            bytes,
            first_page,
            last_page,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// First source page (1-based) contained in this output
    pub fn first_page(&self) -> u32 {
        self.first_page
    }

    /// Last source page (1-based) contained in this output
    pub fn last_page(&self) -> u32 {
        self.last_page
    }

    pub fn page_count(&self) -> u32 {
        self.last_page + 1 - self.first_page
    }

    /// Write the buffer into `dir` under its own name
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(&self.name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    /// Write the buffer to an explicit path
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Outputs can be fed back into the pipeline
impl ByteSource for OutputDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}
