//! In-memory PDF fixtures for unit tests

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::pdf::page::PageRef;
use crate::source::SourceDocument;

/// Build a document whose pages draw the text `(<label>-<n>)`
pub(crate) fn sample_document(label: &str, pages: u32, width: f32, height: f32) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources = Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]);

    let mut kids: Vec<Object> = Vec::new();
    for i in 0..pages {
        let content = format!("BT /F1 12 Tf 72 700 Td ({}-{}) Tj ET", label, i + 1);
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            ("Resources", Object::Dictionary(resources.clone())),
        ]));
        kids.push(Object::Reference(page_id));
    }

    // MediaBox lives on the Pages node so pages exercise inheritance
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(pages as i64)),
        ("Kids", Object::Array(kids)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(width),
                Object::Real(height),
            ]),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Serialized US Letter document with `pages` labelled pages
pub(crate) fn sample_pdf(label: &str, pages: u32) -> Vec<u8> {
    sample_pdf_sized(label, pages, 612.0, 792.0)
}

pub(crate) fn sample_pdf_sized(label: &str, pages: u32, width: f32, height: f32) -> Vec<u8> {
    let mut doc = sample_document(label, pages, width, height);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize fixture");
    buffer
}

pub(crate) fn sample_source(name: &str, label: &str, pages: u32) -> SourceDocument {
    SourceDocument::from_bytes(name, &sample_pdf(label, pages)).expect("parse fixture")
}

/// Letter document whose page `broken` has `key` pointing at a missing object
///
/// With `Contents` the page's drawing is unreadable; with `Parent` its
/// inherited geometry is.
pub(crate) fn document_with_dangling(label: &str, pages: u32, broken: u32, key: &str) -> Document {
    let mut doc = sample_document(label, pages, 612.0, 792.0);
    let id = doc.get_pages()[&broken];
    doc.get_object_mut(id)
        .expect("page exists")
        .as_dict_mut()
        .expect("page is a dictionary")
        .set(key, Object::Reference((9999, 0)));
    doc
}

/// Serialized form of [`document_with_dangling`]
pub(crate) fn pdf_with_dangling(label: &str, pages: u32, broken: u32, key: &str) -> Vec<u8> {
    let mut doc = document_with_dangling(label, pages, broken, key);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize fixture");
    buffer
}

pub(crate) fn page_ids(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().values().copied().collect()
}

/// Text labels drawn on each page, following Form XObjects one level deep
pub(crate) fn page_labels(doc: &SourceDocument) -> Vec<String> {
    PageRef::all(doc)
        .iter()
        .map(|page| {
            let content = page.content_with_forms().expect("readable page");
            extract_labels(&content).join(",")
        })
        .collect()
}

fn extract_labels(content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    let mut labels = Vec::new();
    let mut rest = text.as_ref();
    while let Some(start) = rest.find('(') {
        let after = &rest[start + 1..];
        match after.find(')') {
            Some(end) => {
                labels.push(after[..end].to_string());
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    labels
}
