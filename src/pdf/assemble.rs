//! Page-tree assembly shared by merge, split and lenient normalization
//!
//! Based on the lopdf merge example:
//! https://github.com/J-F-Liu/lopdf/blob/main/examples/merge.rs

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::Result;
use crate::pdf::page::materialize_pages;

/// Collects pages from several documents into one flat page tree
#[derive(Debug)]
pub(crate) struct PageAssembler {
    max_id: u32,
    page_ids: Vec<ObjectId>,
    objects: BTreeMap<ObjectId, Object>,
}

impl PageAssembler {
    pub(crate) fn new() -> Self {
        Self {
            max_id: 1,
            page_ids: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    /// Append every page of `doc`, in page order
    pub(crate) fn append(&mut self, doc: Document, document_name: &str) -> Result<()> {
        self.append_selected(doc, document_name, |_| true)
    }

    /// Append the pages of `doc` whose 1-based number passes `keep`, in page order
    pub(crate) fn append_selected(
        &mut self,
        mut doc: Document,
        document_name: &str,
        keep: impl Fn(u32) -> bool,
    ) -> Result<()> {
        // Pages are about to lose their ancestors
        materialize_pages(&mut doc, document_name, &keep)?;

        // Renumber objects in this document to avoid conflicts
        doc.renumber_objects_with(self.max_id);
        self.max_id = doc.max_id + 1;

        self.page_ids.extend(
            doc.get_pages()
                .into_iter()
                .filter(|(number, _)| keep(*number))
                .map(|(_, id)| id),
        );
        self.objects.extend(doc.objects);
        Ok(())
    }

    /// Copy the given pages of `doc`, and only the objects they reach
    ///
    /// `doc` must already carry inherited attributes on its pages (see
    /// [`materialize_inherited`](crate::pdf::page::materialize_inherited)).
    /// References to pages outside `pages` become null.
    pub(crate) fn append_pages(&mut self, doc: &Document, pages: &[ObjectId]) {
        let selected: BTreeSet<ObjectId> = pages.iter().copied().collect();
        let mut renumbered: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
        let mut pending: Vec<ObjectId> = pages.to_vec();

        while let Some(id) = pending.pop() {
            if renumbered.contains_key(&id) {
                continue;
            }
            let Ok(object) = doc.get_object(id) else {
                continue;
            };
            let is_selected = selected.contains(&id);
            if !is_selected && is_page(object) {
                continue;
            }
            renumbered.insert(id, (self.max_id, 0));
            self.max_id += 1;
            // Parent of a selected page is replaced in finish()
            collect_references(object, is_selected, &mut pending);
        }

        for (old_id, &new_id) in &renumbered {
            if let Ok(object) = doc.get_object(*old_id) {
                self.objects.insert(new_id, rewrite_references(object, &renumbered));
            }
        }
        self.page_ids.extend(pages.iter().filter_map(|id| renumbered.get(id).copied()));
    }

    pub(crate) fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Build the output document around the collected pages
    pub(crate) fn finish(self) -> Document {
        let mut merged_doc = Document::with_version("1.5");

        // Add all collected objects FIRST
        merged_doc.objects.extend(self.objects);

        // new_object_id() must hand out ids above everything just added
        merged_doc.max_id = self.max_id - 1;

        let pages_id = merged_doc.new_object_id();

        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();

        let mut pages_object = Dictionary::new();
        pages_object.set("Type", Object::Name(b"Pages".to_vec()));
        pages_object.set("Count", Object::Integer(self.page_ids.len() as i64));
        pages_object.set("Kids", Object::Array(kids));

        let catalog_id = merged_doc.new_object_id();
        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));

        merged_doc.objects.insert(catalog_id, Object::Dictionary(catalog));
        merged_doc.objects.insert(pages_id, Object::Dictionary(pages_object));
        merged_doc.trailer.set("Root", Object::Reference(catalog_id));

        for &page_id in &self.page_ids {
            if let Ok(Object::Dictionary(dict)) = merged_doc.get_object_mut(page_id) {
                dict.set("Parent", Object::Reference(pages_id));
            }
        }

        // Old catalogs, page tree nodes and unselected pages
        merged_doc.prune_objects();
        merged_doc
    }
}

fn is_page(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .map(|name| name == b"Page")
        .unwrap_or(false)
}

fn collect_references(object: &Object, skip_parent: bool, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => {
            for item in items {
                collect_references(item, false, out);
            }
        }
        Object::Dictionary(dict) => collect_dictionary_references(dict, skip_parent, out),
        Object::Stream(stream) => collect_dictionary_references(&stream.dict, false, out),
        _ => {}
    }
}

fn collect_dictionary_references(dict: &Dictionary, skip_parent: bool, out: &mut Vec<ObjectId>) {
    for (key, value) in dict.iter() {
        if skip_parent && key.as_slice() == b"Parent" {
            continue;
        }
        collect_references(value, false, out);
    }
}

/// Clone `object`, mapping every reference through `renumbered`; unknown targets become null
fn rewrite_references(object: &Object, renumbered: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => renumbered.get(id).map_or(Object::Null, |&new_id| Object::Reference(new_id)),
        Object::Array(items) => Object::Array(items.iter().map(|item| rewrite_references(item, renumbered)).collect()),
        Object::Dictionary(dict) => Object::Dictionary(rewrite_dictionary(dict, renumbered)),
        Object::Stream(stream) => {
            let mut copy = stream.clone();
            copy.dict = rewrite_dictionary(&stream.dict, renumbered);
            Object::Stream(copy)
        }
        other => other.clone(),
    }
}

fn rewrite_dictionary(dict: &Dictionary, renumbered: &BTreeMap<ObjectId, ObjectId>) -> Dictionary {
    dict.iter().map(|(key, value)| (key.clone(), rewrite_references(value, renumbered))).collect()
}
