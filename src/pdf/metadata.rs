//! PDF metadata extraction

use lopdf::{Document, Object};

use crate::error::{Error, Result};
use crate::pdf::page::PageRef;
use crate::pdf::rotate::Rotation;
use crate::source::SourceDocument;

/// Count pages by reading the Count field from the Pages dictionary
fn count_pages_from_catalog(doc: &Document, name: &str) -> Result<usize> {
    let catalog = doc.catalog().map_err(|e| Error::corrupt(name, e))?;

    let pages_id = catalog
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| Error::corrupt(name, "catalog has no Pages reference"))?;

    let pages_dict = doc
        .get_dictionary(pages_id)
        .map_err(|_| Error::corrupt(name, "Pages is not a dictionary"))?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) if *n >= 0 => Ok(*n as usize),
        _ => Err(Error::corrupt(name, "Pages has no valid Count")),
    }
}

/// Size and rotation of one page
#[derive(Debug, Clone, PartialEq)]
pub struct PageSummary {
    /// 1-based page number
    pub number: u32,
    /// Visible width in points
    pub width: f32,
    /// Visible height in points
    pub height: f32,
    pub rotation: Rotation,
}

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: usize,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Per-page geometry
    pub pages: Vec<PageSummary>,
}

fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").and_then(Object::as_reference).ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    let bytes = info.get(key).and_then(Object::as_str).ok()?;
    String::from_utf8(bytes.to_vec()).ok()
}

/// Extract metadata from a parsed document
pub fn extract_metadata(source: &SourceDocument) -> Result<PdfMetadata> {
    let pages = PageRef::all(source)
        .into_iter()
        .map(|page| {
            let visible = page.visible_box()?;
            Ok(PageSummary {
                number: page.number(),
                width: visible.width(),
                height: visible.height(),
                rotation: page.rotation()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PdfMetadata {
        page_count: pages.len(),
        title: info_string(source.document(), b"Title"),
        author: info_string(source.document(), b"Author"),
        pages,
    })
}

/// Count the pages of a serialized PDF
///
/// This is a quick operation that reads the Count field from the Pages dictionary.
pub fn count_pages(bytes: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(bytes).map_err(|e| Error::corrupt("<buffer>", e))?;
    count_pages_from_catalog(&doc, "<buffer>")
}
