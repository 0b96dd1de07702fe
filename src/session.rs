//! Per-user working set of uploaded documents
//!
//! A [`Session`] replaces ambient UI state: it owns the uploads and is passed
//! by reference into every merge or split request. Sessions share nothing.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::OutputDocument;
use crate::pdf::merge::{merge_documents, MergeOptions};
use crate::pdf::normalize::{normalize_with_policy, CorruptPagePolicy, NormalizeSettings};
use crate::pdf::split::{split_document, SplitGranularity};
use crate::source::{ByteSource, SourceDocument};

/// User-chosen merge order, by document name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOrderSpec(pub Vec<String>);

impl PageOrderSpec {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }
}

/// A merge of (some of) the session's documents
#[derive(Debug, Clone, Default)]
pub struct MergeRequest {
    /// Explicit order; `None` means upload order
    pub order: Option<PageOrderSpec>,
    pub options: MergeOptions,
}

/// A split of one of the session's documents
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub document: String,
    pub granularity: SplitGranularity,
}

/// What a merge would produce
#[derive(Debug, Clone, PartialEq)]
pub struct MergePreview {
    pub document_count: usize,
    pub total_pages: u32,
    /// `(document name, page number)` of pages normalization would drop
    pub skipped_pages: Vec<(String, u32)>,
}

/// Uploaded documents for one user
#[derive(Debug, Default)]
pub struct Session {
    documents: Vec<SourceDocument>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and keep an upload; names must be unique within the session
    pub fn upload(&mut self, source: &dyn ByteSource) -> Result<&SourceDocument> {
        if self.find(source.name()).is_some() {
            return Err(Error::DuplicateDocument(source.name().to_string()));
        }
        let document = SourceDocument::load(source)?;
        debug!(document = %document.name(), pages = document.page_count(), "uploaded");
        self.documents.push(document);
        Ok(&self.documents[self.documents.len() - 1])
    }

    /// Drop an upload, returning it if it existed
    pub fn remove(&mut self, name: &str) -> Option<SourceDocument> {
        let index = self.documents.iter().position(|d| d.name() == name)?;
        Some(self.documents.remove(index))
    }

    /// Forget every upload
    pub fn reset(&mut self) {
        self.documents.clear();
    }

    /// Uploads in upload order
    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn find(&self, name: &str) -> Option<&SourceDocument> {
        self.documents.iter().find(|d| d.name() == name)
    }

    /// Documents to merge, in merge order
    ///
    /// Without an explicit order every upload is used in upload order. With
    /// one, every name must match an upload and unnamed uploads are left out.
    pub fn resolve_order(&self, order: Option<&PageOrderSpec>) -> Result<Vec<&SourceDocument>> {
        match order {
            None => Ok(self.documents.iter().collect()),
            Some(PageOrderSpec(names)) => names
                .iter()
                .map(|name| self.find(name).ok_or_else(|| Error::UnknownDocument(name.clone())))
                .collect(),
        }
    }

    /// Default output name: first document's stem plus `_merged.pdf`
    pub fn default_output_name(&self, order: Option<&PageOrderSpec>) -> String {
        self.resolve_order(order)
            .ok()
            .and_then(|docs| docs.first().map(|d| format!("{}_merged.pdf", d.stem())))
            .unwrap_or_else(|| "merged_output.pdf".to_string())
    }

    pub fn merge(&self, request: &MergeRequest) -> Result<OutputDocument> {
        let documents = self.resolve_order(request.order.as_ref())?;
        let output = merge_documents(&documents, &request.options)?;
        info!(output = %output.name(), "session merge complete");
        Ok(output)
    }

    pub fn split(&self, request: &SplitRequest) -> Result<Vec<OutputDocument>> {
        let document = self
            .find(&request.document)
            .ok_or_else(|| Error::UnknownDocument(request.document.clone()))?;
        split_document(document, request.granularity)
    }

    /// Page totals for a prospective merge
    ///
    /// Unlike a real merge, normalization here skips unreadable pages and
    /// reports them instead of failing.
    pub fn preview(
        &self,
        order: Option<&PageOrderSpec>,
        normalize: Option<NormalizeSettings>,
    ) -> Result<MergePreview> {
        let documents = self.resolve_order(order)?;
        let mut total_pages = 0;
        let mut skipped_pages = Vec::new();

        for document in &documents {
            match normalize {
                Some(settings) => {
                    let normalized =
                        normalize_with_policy(document, settings.paper, settings.mode, CorruptPagePolicy::Skip)?;
                    total_pages += normalized.document.page_count();
                    let name = document.name();
                    skipped_pages.extend(normalized.skipped.into_iter().map(|page| (name.to_string(), page)));
                }
                None => total_pages += document.page_count(),
            }
        }

        Ok(MergePreview {
            document_count: documents.len(),
            total_pages,
            skipped_pages,
        })
    }
}
