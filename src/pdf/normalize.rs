//! Page size normalization
//!
//! Two strategies bring every page of a document to one paper size:
//!
//! - **Crop** redefines the page boundary and leaves the content alone. The
//!   top-left corner of the old visible area is kept; anything outside the
//!   new boundary is clipped, and a larger boundary leaves blank space.
//! - **Fit-centered** turns the old page into a Form XObject and draws it,
//!   uniformly scaled and centered, on a fresh page of the target size.
//!   Content is never clipped or distorted.
//!
//! Pages already within one point of the target pass through untouched, which
//! also makes normalizing twice a no-op.

use std::fmt;
use std::str::FromStr;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::layout::{FitPlacement, PaperSize, Rect, SIZE_TOLERANCE};
use crate::pdf::assemble::PageAssembler;
use crate::pdf::page::PageRef;
use crate::source::SourceDocument;

/// Resource name of the form holding a fitted page's original content
const FORM_NAME: &str = "SrcPage";

/// Boundary boxes that must not outlive a boundary change
const SECONDARY_BOXES: [&[u8]; 3] = [b"BleedBox", b"TrimBox", b"ArtBox"];

/// How pages are brought to the target size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NormalizeMode {
    /// Redefine the page boundary only
    Crop,
    /// Scale content to fit and center it on a new page
    #[default]
    FitCentered,
}

impl fmt::Display for NormalizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeMode::Crop => f.write_str("crop"),
            NormalizeMode::FitCentered => f.write_str("fit-centered"),
        }
    }
}

impl FromStr for NormalizeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "crop" => Ok(NormalizeMode::Crop),
            "fit-centered" | "fit" => Ok(NormalizeMode::FitCentered),
            other => Err(Error::Config(format!(
                "unknown normalize mode '{}' (expected crop or fit-centered)",
                other
            ))),
        }
    }
}

/// Target size plus strategy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NormalizeSettings {
    pub paper: PaperSize,
    pub mode: NormalizeMode,
}

impl NormalizeSettings {
    /// A4, fit-centered
    pub fn a4() -> Self {
        Self::default()
    }
}

/// What to do with a page whose geometry or content can't be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptPagePolicy {
    /// Fail the whole document
    #[default]
    Abort,
    /// Drop the page and log a warning
    Skip,
}

/// Result of a normalization that may have dropped pages
#[derive(Debug, Clone)]
pub struct Normalized {
    pub document: SourceDocument,
    /// 1-based numbers (in the source) of pages dropped under [`CorruptPagePolicy::Skip`]
    pub skipped: Vec<u32>,
}

/// Per-page decision, made before anything is modified
enum PagePlan {
    PassThrough,
    Crop(Rect),
    Fit {
        visible: Rect,
        placement: FitPlacement,
        content: Vec<u8>,
        resources: Option<Object>,
    },
}

/// Normalize every page of `source`, failing on the first unreadable page
pub fn normalize(source: &SourceDocument, target: PaperSize, mode: NormalizeMode) -> Result<SourceDocument> {
    normalize_with_policy(source, target, mode, CorruptPagePolicy::Abort).map(|n| n.document)
}

/// Normalize every page of `source` with an explicit policy for unreadable pages
pub fn normalize_with_policy(
    source: &SourceDocument,
    target: PaperSize,
    mode: NormalizeMode,
    policy: CorruptPagePolicy,
) -> Result<Normalized> {
    let mut plans: Vec<(ObjectId, PagePlan)> = Vec::new();
    let mut skipped = Vec::new();

    for page in PageRef::all(source) {
        match plan_page(&page, target, mode) {
            Ok(plan) => plans.push((page.id(), plan)),
            Err(err) => match policy {
                CorruptPagePolicy::Abort => return Err(err),
                CorruptPagePolicy::Skip => {
                    warn!(document = %source.name(), page = page.number(), error = %err, "skipping unreadable page");
                    skipped.push(page.number());
                }
            },
        }
    }

    let mut doc = source.document().clone();
    let mut changed = 0usize;
    for (page_id, plan) in plans {
        match plan {
            PagePlan::PassThrough => {}
            PagePlan::Crop(boundary) => {
                apply_crop(&mut doc, page_id, boundary).map_err(|e| Error::corrupt(source.name(), e))?;
                changed += 1;
            }
            PagePlan::Fit {
                visible,
                placement,
                content,
                resources,
            } => {
                apply_fit(&mut doc, page_id, target, visible, placement, content, resources)
                    .map_err(|e| Error::corrupt(source.name(), e))?;
                changed += 1;
            }
        }
    }
    debug!(
        document = %source.name(),
        target = %target,
        mode = %mode,
        changed,
        skipped = skipped.len(),
        "normalized document"
    );

    let document = if skipped.is_empty() {
        SourceDocument::from_document(source.name(), doc)
    } else {
        let mut assembler = PageAssembler::new();
        assembler.append_selected(doc, source.name(), |number| !skipped.contains(&number))?;
        SourceDocument::from_document(source.name(), assembler.finish())
    };

    Ok(Normalized { document, skipped })
}

fn plan_page(page: &PageRef<'_>, target: PaperSize, mode: NormalizeMode) -> Result<PagePlan> {
    let visible = page.visible_box()?;

    if target.matches(visible.width(), visible.height(), SIZE_TOLERANCE) {
        debug!(page = page.number(), "page already at target size");
        return Ok(PagePlan::PassThrough);
    }

    match mode {
        NormalizeMode::Crop => Ok(PagePlan::Crop(visible.anchored_top_left(target))),
        NormalizeMode::FitCentered => Ok(PagePlan::Fit {
            visible,
            placement: FitPlacement::compute(visible.width(), visible.height(), target),
            content: page.content()?,
            resources: page.resources()?,
        }),
    }
}

fn rect_object(rect: Rect) -> Object {
    Object::Array(vec![
        Object::Real(rect.llx),
        Object::Real(rect.lly),
        Object::Real(rect.urx),
        Object::Real(rect.ury),
    ])
}

fn page_dict_mut(doc: &mut Document, page_id: ObjectId) -> lopdf::Result<&mut Dictionary> {
    doc.get_object_mut(page_id).and_then(Object::as_dict_mut)
}

fn apply_crop(doc: &mut Document, page_id: ObjectId, boundary: Rect) -> lopdf::Result<()> {
    let page = page_dict_mut(doc, page_id)?;
    page.set("MediaBox", rect_object(boundary));
    page.set("CropBox", rect_object(boundary));
    for key in SECONDARY_BOXES {
        page.remove(key);
    }
    Ok(())
}

fn apply_fit(
    doc: &mut Document,
    page_id: ObjectId,
    target: PaperSize,
    visible: Rect,
    placement: FitPlacement,
    content: Vec<u8>,
    resources: Option<Object>,
) -> lopdf::Result<()> {
    // Original drawing becomes a form clipped to the old visible area
    let mut form = Dictionary::new();
    form.set("Type", Object::Name(b"XObject".to_vec()));
    form.set("Subtype", Object::Name(b"Form".to_vec()));
    form.set("FormType", Object::Integer(1));
    form.set("BBox", rect_object(visible));
    form.set(
        "Resources",
        resources.unwrap_or_else(|| Object::Dictionary(Dictionary::new())),
    );
    let form_id = doc.add_object(Stream::new(form, content));

    // The form's lower-left corner lands on the centering offset
    let scale = placement.scale;
    let tx = placement.offset_x - visible.llx * scale;
    let ty = placement.offset_y - visible.lly * scale;
    let draw = format!("q {} 0 0 {} {} {} cm /{} Do Q\n", scale, scale, tx, ty, FORM_NAME);
    let draw_id = doc.add_object(Stream::new(Dictionary::new(), draw.into_bytes()));

    let mut xobjects = Dictionary::new();
    xobjects.set(FORM_NAME, Object::Reference(form_id));
    let mut page_resources = Dictionary::new();
    page_resources.set("XObject", Object::Dictionary(xobjects));

    let page = page_dict_mut(doc, page_id)?;
    page.set("MediaBox", rect_object(Rect::sized(target)));
    page.remove(b"CropBox");
    for key in SECONDARY_BOXES {
        page.remove(key);
    }
    page.set("Contents", Object::Reference(draw_id));
    page.set("Resources", Object::Dictionary(page_resources));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        document_with_dangling, page_ids, page_labels, sample_document, sample_pdf_sized, sample_source,
    };

    fn sizes(doc: &SourceDocument) -> Vec<(f32, f32)> {
        PageRef::all(doc)
            .iter()
            .map(|page| {
                let visible = page.visible_box().unwrap();
                (visible.width(), visible.height())
            })
            .collect()
    }

    fn contents(doc: &SourceDocument) -> Vec<Vec<u8>> {
        PageRef::all(doc)
            .iter()
            .map(|page| page.content_with_forms().unwrap())
            .collect()
    }

    #[test]
    fn test_fit_centered_resizes_every_page() {
        let source = sample_source("letter.pdf", "L", 3);
        let normalized = normalize(&source, PaperSize::A4, NormalizeMode::FitCentered).unwrap();

        assert_eq!(normalized.page_count(), 3);
        for (w, h) in sizes(&normalized) {
            assert_eq!((w, h), (595.0, 842.0));
        }
        // Drawing survives inside the form
        assert_eq!(page_labels(&normalized), vec!["L-1", "L-2", "L-3"]);
    }

    #[test]
    fn test_fit_centered_draw_matrix_centers_content() {
        let source = sample_source("letter.pdf", "L", 1);
        let normalized = normalize(&source, PaperSize::A4, NormalizeMode::FitCentered).unwrap();

        let page = PageRef::all(&normalized)[0];
        let draw = String::from_utf8(page.content().unwrap()).unwrap();
        let fit = FitPlacement::compute(612.0, 792.0, PaperSize::A4);
        let expected = format!(
            "q {} 0 0 {} {} {} cm /SrcPage Do Q\n",
            fit.scale, fit.scale, fit.offset_x, fit.offset_y
        );
        assert_eq!(draw, expected);
    }

    #[test]
    fn test_fit_centered_is_idempotent() {
        let source = sample_source("letter.pdf", "L", 2);
        let once = normalize(&source, PaperSize::A4, NormalizeMode::FitCentered).unwrap();
        let twice = normalize(&once, PaperSize::A4, NormalizeMode::FitCentered).unwrap();

        assert_eq!(sizes(&once), sizes(&twice));
        assert_eq!(contents(&once), contents(&twice));
    }

    #[test]
    fn test_matching_pages_pass_through() {
        // 595.3 x 841.9 is within a point of A4
        let source = SourceDocument::from_bytes("a4.pdf", &sample_pdf_sized("A", 2, 595.3, 841.9)).unwrap();
        let normalized = normalize(&source, PaperSize::A4, NormalizeMode::FitCentered).unwrap();

        assert_eq!(contents(&source), contents(&normalized));
        for (w, h) in sizes(&normalized) {
            assert!((w - 595.3).abs() < 0.01 && (h - 841.9).abs() < 0.01);
        }
    }

    #[test]
    fn test_crop_keeps_top_left_and_content() {
        let source = sample_source("letter.pdf", "C", 1);
        let normalized = normalize(&source, PaperSize::A4, NormalizeMode::Crop).unwrap();

        let page = PageRef::all(&normalized)[0];
        let media = page.media_box().unwrap();
        assert_eq!(media.llx, 0.0);
        assert_eq!(media.ury, 792.0);
        assert_eq!((media.width(), media.height()), (595.0, 842.0));
        assert_eq!(contents(&source), contents(&normalized));
    }

    #[test]
    fn test_crop_is_idempotent() {
        let source = sample_source("letter.pdf", "C", 2);
        let once = normalize(&source, PaperSize::A4, NormalizeMode::Crop).unwrap();
        let twice = normalize(&once, PaperSize::A4, NormalizeMode::Crop).unwrap();
        assert_eq!(sizes(&once), sizes(&twice));
    }

    #[test]
    fn test_fit_keeps_stored_rotation() {
        let mut doc = sample_document("R", 1, 612.0, 792.0);
        let id = page_ids(&doc)[0];
        doc.get_object_mut(id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Rotate", Object::Integer(90));
        let source = SourceDocument::from_document("rotated.pdf", doc);

        let normalized = normalize(&source, PaperSize::A4, NormalizeMode::FitCentered).unwrap();
        let page = PageRef::all(&normalized)[0];
        assert_eq!(page.rotation().unwrap().degrees(), 90);
    }

    fn with_broken_second_page() -> SourceDocument {
        SourceDocument::from_document("broken.pdf", document_with_dangling("B", 3, 2, "Contents"))
    }

    #[test]
    fn test_unreadable_page_aborts_by_default() {
        let source = with_broken_second_page();
        match normalize(&source, PaperSize::A4, NormalizeMode::FitCentered) {
            Err(Error::DocumentCorrupt { document, reason }) => {
                assert_eq!(document, "broken.pdf");
                assert!(reason.starts_with("page 2"));
            }
            other => panic!("expected DocumentCorrupt, got {:?}", other.map(|d| d.page_count())),
        }
    }

    #[test]
    fn test_unreadable_page_can_be_skipped() {
        let source = with_broken_second_page();
        let normalized =
            normalize_with_policy(&source, PaperSize::A4, NormalizeMode::FitCentered, CorruptPagePolicy::Skip)
                .unwrap();
        assert_eq!(normalized.skipped, vec![2]);
        assert_eq!(page_labels(&normalized.document), vec!["B-1", "B-3"]);
    }

    #[test]
    fn test_broken_ancestry_can_be_skipped() {
        let source = SourceDocument::from_document("orphan.pdf", document_with_dangling("O", 3, 2, "Parent"));
        let normalized =
            normalize_with_policy(&source, PaperSize::A4, NormalizeMode::FitCentered, CorruptPagePolicy::Skip)
                .unwrap();
        assert_eq!(normalized.skipped, vec![2]);
        assert_eq!(page_labels(&normalized.document), vec!["O-1", "O-3"]);
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("crop".parse::<NormalizeMode>().unwrap(), NormalizeMode::Crop);
        assert_eq!("Fit-Centered".parse::<NormalizeMode>().unwrap(), NormalizeMode::FitCentered);
        assert!("stretch".parse::<NormalizeMode>().is_err());
    }
}
