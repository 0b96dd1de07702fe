//! PDF merging functionality using lopdf

use tracing::info;

use crate::error::{Error, Result};
use crate::output::OutputDocument;
use crate::pdf::assemble::PageAssembler;
use crate::pdf::normalize::{normalize, NormalizeSettings};
use crate::pdf::rotate::RotationMap;
use crate::source::{ByteSource, SourceDocument};

/// Options for merging PDFs
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOptions {
    /// Normalize each input document to one paper size before appending
    pub normalize: Option<NormalizeSettings>,
    /// Rotations keyed by 1-based position in the merged output
    pub rotations: RotationMap,
    /// Output file name; `.pdf` is appended when missing
    pub output_name: String,
}

impl MergeOptions {
    pub fn new(output_name: impl Into<String>) -> Self {
        Self {
            normalize: None,
            rotations: RotationMap::new(),
            output_name: output_name.into(),
        }
    }

    /// Fit every page onto A4
    pub fn normalize_to_a4(mut self) -> Self {
        self.normalize = Some(NormalizeSettings::a4());
        self
    }

    pub fn with_normalize(mut self, settings: NormalizeSettings) -> Self {
        self.normalize = Some(settings);
        self
    }

    pub fn with_rotations(mut self, rotations: RotationMap) -> Self {
        self.rotations = rotations;
        self
    }
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self::new("merged.pdf")
    }
}

/// Ensure a file name carries a `.pdf` extension
pub(crate) fn pdf_file_name(name: &str) -> String {
    let name = name.trim();
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{}.pdf", name)
    }
}

/// Merge parsed documents into a single PDF
///
/// Pages appear document by document in the given order, each document
/// contributing its pages in their original order. Normalization is applied
/// per document before its pages are appended; rotations are applied last,
/// by position in the merged output.
///
/// # Example
///
/// ```no_run
/// use pdf_toolbox::pdf::{merge_documents, MergeOptions};
/// use pdf_toolbox::source::{FileSource, SourceDocument};
///
/// let intro = SourceDocument::load(&FileSource::new("1. intro.pdf")).unwrap();
/// let advanced = SourceDocument::load(&FileSource::new("2. advanced.pdf")).unwrap();
///
/// let merged = merge_documents(&[&intro, &advanced], &MergeOptions::new("handout"))
///     .expect("Failed to merge");
/// assert_eq!(merged.name(), "handout.pdf");
/// ```
pub fn merge_documents(documents: &[&SourceDocument], options: &MergeOptions) -> Result<OutputDocument> {
    if documents.is_empty() {
        return Err(Error::EmptyInput);
    }

    let output_name = pdf_file_name(&options.output_name);
    let mut assembler = PageAssembler::new();

    for &source in documents {
        let prepared = match options.normalize {
            Some(settings) => normalize(source, settings.paper, settings.mode)?,
            None => source.clone(),
        };
        let name = prepared.name().to_string();
        assembler.append(prepared.into_document(), &name)?;
    }

    if assembler.page_count() == 0 {
        return Err(Error::EmptyDocument(output_name));
    }

    let mut merged = assembler.finish();

    // Rotation is a post-assembly pass keyed by final position
    options.rotations.apply(&mut merged, &output_name)?;

    let output = OutputDocument::from_document(output_name, merged)?;
    info!(
        output = %output.name(),
        inputs = documents.len(),
        pages = output.page_count(),
        bytes = output.bytes().len(),
        "merged documents"
    );
    Ok(output)
}

/// Load every source, then merge
///
/// Loading happens before any merging, so a corrupt input fails the call
/// without producing output.
pub fn merge_sources<S: ByteSource>(sources: &[S], options: &MergeOptions) -> Result<OutputDocument> {
    if sources.is_empty() {
        return Err(Error::EmptyInput);
    }

    let documents = sources
        .iter()
        .map(|source| SourceDocument::load(source))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&SourceDocument> = documents.iter().collect();
    merge_documents(&refs, options)
}
