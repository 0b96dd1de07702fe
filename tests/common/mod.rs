//! Shared fixtures for integration tests
//!
//! Kept in step with the crate's internal `test_support` module: same page
//! layout (MediaBox inherited from the Pages node) and same label parsing.

#![allow(dead_code)]

use lopdf::{Dictionary, Document, Object, Stream};
use pdf_toolbox::pdf::PageRef;
use pdf_toolbox::{MemorySource, SourceDocument};

/// Document whose pages draw the text `(<label>-<n>)`
pub fn labelled_document(label: &str, pages: u32, width: f32, height: f32) -> Document {
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

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(pages as i64)),
        ("Kids", Object::Array(kids)),
        (
            "MediaBox",
            Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Real(width), Object::Real(height)]),
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

/// Serialized [`labelled_document`]
pub fn labelled_pdf(label: &str, pages: u32, width: f32, height: f32) -> Vec<u8> {
    let mut doc = labelled_document(label, pages, width, height);
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize fixture");
    buffer
}

pub fn letter_source(name: &str, label: &str, pages: u32) -> MemorySource {
    MemorySource::new(name, labelled_pdf(label, pages, 612.0, 792.0))
}

pub fn letter_document(name: &str, label: &str, pages: u32) -> SourceDocument {
    SourceDocument::load(&letter_source(name, label, pages)).expect("parse fixture")
}

/// Text labels drawn on each page, following Form XObjects one level deep
pub fn page_labels(doc: &SourceDocument) -> Vec<String> {
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

/// Visible width and height of each page
pub fn page_sizes(doc: &SourceDocument) -> Vec<(f32, f32)> {
    PageRef::all(doc)
        .iter()
        .map(|page| {
            let visible = page.visible_box().expect("readable page");
            (visible.width(), visible.height())
        })
        .collect()
}
