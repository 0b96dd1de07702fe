//! Input byte sources and parsed source documents

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use lopdf::Document;
use tracing::debug;

use crate::error::{Error, Result};

/// Anything that can hand over the bytes of an uploaded PDF together with a display name
pub trait ByteSource {
    /// Display name, usually the original file name
    fn name(&self) -> &str;

    /// Full contents of the source
    fn read(&self) -> Result<Vec<u8>>;
}

/// In-memory upload
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    bytes: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

impl ByteSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        Ok(self.bytes.clone())
    }
}

/// A PDF on disk, named by its file name
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    /// A file shown under an explicit name instead of its file name
    pub fn named(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { path: path.into(), name: name.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bare file name of the path, whatever the display name is
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// File sources with names unique among `paths`
///
/// Each file is named by its file name. When several inputs share a file
/// name they are named by their path as given instead, and a path given
/// more than once gets a `#<n>` suffix from its second occurrence on.
pub fn file_sources<P: AsRef<Path>>(paths: &[P]) -> Vec<FileSource> {
    let plain: Vec<FileSource> = paths.iter().map(|p| FileSource::new(p.as_ref())).collect();

    let mut name_counts: HashMap<&str, usize> = HashMap::new();
    for source in &plain {
        *name_counts.entry(source.name()).or_default() += 1;
    }
    let shared: Vec<bool> = plain.iter().map(|source| name_counts[source.name()] > 1).collect();

    let mut seen: HashMap<String, usize> = HashMap::new();
    plain
        .iter()
        .zip(shared)
        .map(|(source, shared)| {
            let base = if shared { source.path.display().to_string() } else { source.name.clone() };
            let occurrence = seen.entry(base.clone()).or_default();
            *occurrence += 1;
            let name = match *occurrence {
                1 => base,
                n => format!("{}#{}", base, n),
            };
            FileSource::named(source.path.clone(), name)
        })
        .collect()
}

impl ByteSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self) -> Result<Vec<u8>> {
        if !self.path.exists() {
            return Err(Error::FileNotFound(self.path.clone()));
        }
        Ok(std::fs::read(&self.path)?)
    }
}

/// A parsed, read-only input document
#[derive(Debug, Clone)]
pub struct SourceDocument {
    name: String,
    document: Document,
}

impl SourceDocument {
    /// Read and parse a source
    ///
    /// Unparseable bytes and encrypted documents fail with
    /// [`Error::DocumentCorrupt`] naming the source.
    pub fn load(source: &dyn ByteSource) -> Result<Self> {
        let bytes = source.read()?;
        Self::from_bytes(source.name(), &bytes)
    }

    /// Parse raw PDF bytes under the given display name
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let document = Document::load_mem(bytes).map_err(|e| Error::corrupt(name.as_str(), e))?;

        if document.trailer.has(b"Encrypt") {
            return Err(Error::corrupt(name, "encrypted documents are not supported"));
        }

        debug!(document = %name, pages = document.get_pages().len(), "loaded source document");
        Ok(Self { name, document })
    }

    /// Wrap an already-built document
    pub(crate) fn from_document(name: impl Into<String>, document: Document) -> Self {
        Self { name: name.into(), document }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without leading directories or a trailing `.pdf` extension
    pub fn stem(&self) -> &str {
        let base = self.name.rsplit(['/', '\\']).next().unwrap_or(&self.name);
        if base.to_ascii_lowercase().ends_with(".pdf") {
            &base[..base.len() - 4]
        } else {
            base
        }
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn into_document(self) -> Document {
        self.document
    }
}
