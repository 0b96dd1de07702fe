//! Read access to a single page: inherited attributes, boxes, rotation, content

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::layout::{PaperSize, Rect};
use crate::pdf::rotate::Rotation;
use crate::source::SourceDocument;

/// Page attributes a page may inherit from its ancestors in the page tree
pub const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Guards against cyclic `Parent` chains in malformed files
const MAX_TREE_DEPTH: usize = 64;

/// A page of a document, addressed by its 1-based number and object id
#[derive(Debug, Clone, Copy)]
pub struct PageRef<'a> {
    document: &'a Document,
    document_name: &'a str,
    number: u32,
    id: ObjectId,
}

impl<'a> PageRef<'a> {
    pub fn new(document: &'a Document, document_name: &'a str, number: u32, id: ObjectId) -> Self {
        Self { document, document_name, number, id }
    }

    /// Every page of a source document, in page order
    pub fn all(source: &'a SourceDocument) -> Vec<PageRef<'a>> {
        source
            .document()
            .get_pages()
            .into_iter()
            .map(|(number, id)| PageRef::new(source.document(), source.name(), number, id))
            .collect()
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    fn corrupt(&self, reason: impl std::fmt::Display) -> Error {
        Error::corrupt_page(self.document_name, self.number, reason)
    }

    fn dictionary(&self) -> Result<&'a Dictionary> {
        self.document
            .get_dictionary(self.id)
            .map_err(|e| self.corrupt(e))
    }

    /// Look up `key` on the page or the nearest ancestor that has it
    ///
    /// The raw value is returned, so references stay references.
    pub fn inherited(&self, key: &[u8]) -> Result<Option<&'a Object>> {
        let mut node = self.dictionary()?;
        for _ in 0..MAX_TREE_DEPTH {
            if let Ok(value) = node.get(key) {
                return Ok(Some(value));
            }
            node = match node.get(b"Parent").and_then(Object::as_reference) {
                Ok(parent_id) => self
                    .document
                    .get_dictionary(parent_id)
                    .map_err(|e| self.corrupt(format!("broken page tree: {}", e)))?,
                Err(_) => return Ok(None),
            };
        }
        Err(self.corrupt("page tree is nested too deeply or cyclic"))
    }

    fn resolve(&self, object: &'a Object) -> Result<&'a Object> {
        match object {
            Object::Reference(id) => self.document.get_object(*id).map_err(|e| self.corrupt(e)),
            other => Ok(other),
        }
    }

    fn rect(&self, key: &[u8]) -> Result<Option<Rect>> {
        let Some(raw) = self.inherited(key)? else {
            return Ok(None);
        };
        let array = self
            .resolve(raw)?
            .as_array()
            .map_err(|_| self.corrupt(format!("{} is not an array", String::from_utf8_lossy(key))))?;
        if array.len() != 4 {
            return Err(self.corrupt(format!(
                "{} has {} entries, expected 4",
                String::from_utf8_lossy(key),
                array.len()
            )));
        }
        let mut values = [0.0f32; 4];
        for (slot, item) in values.iter_mut().zip(array) {
            *slot = self
                .resolve(item)?
                .as_float()
                .map_err(|_| self.corrupt(format!("{} holds a non-number", String::from_utf8_lossy(key))))?;
        }
        let rect = Rect::from_corners(values[0], values[1], values[2], values[3]);
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            return Err(self.corrupt(format!("{} is empty", String::from_utf8_lossy(key))));
        }
        Ok(Some(rect))
    }

    /// The page's MediaBox, or US Letter when the file omits it entirely
    pub fn media_box(&self) -> Result<Rect> {
        Ok(self.rect(b"MediaBox")?.unwrap_or_else(|| Rect::sized(PaperSize::LETTER)))
    }

    /// The displayed region: CropBox clipped to MediaBox, falling back to MediaBox
    pub fn visible_box(&self) -> Result<Rect> {
        let media = self.media_box()?;
        Ok(self
            .rect(b"CropBox")?
            .and_then(|crop| crop.intersect(&media))
            .unwrap_or(media))
    }

    /// Rotation stored on the page (or inherited), `None` when absent
    pub fn rotation(&self) -> Result<Rotation> {
        let Some(raw) = self.inherited(b"Rotate")? else {
            return Ok(Rotation::None);
        };
        let value = self
            .resolve(raw)?
            .as_i64()
            .map_err(|_| self.corrupt("Rotate is not an integer"))?;
        Rotation::from_stored(value).ok_or_else(|| self.corrupt(format!("Rotate {} is not a multiple of 90", value)))
    }

    /// The page's resources as stored (possibly a reference), if any
    pub fn resources(&self) -> Result<Option<Object>> {
        Ok(self.inherited(b"Resources")?.cloned())
    }

    /// Decoded content of all the page's content streams, concatenated
    ///
    /// A page without `/Contents` is blank and yields an empty buffer.
    pub fn content(&self) -> Result<Vec<u8>> {
        let page = self.dictionary()?;
        let contents = match page.get(b"Contents") {
            Ok(contents) => self.resolve(contents)?,
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Stream(_) => self.stream_content(contents),
            Object::Array(parts) => {
                let mut combined = Vec::new();
                for part in parts {
                    combined.extend(self.stream_content(self.resolve(part)?)?);
                    combined.push(b'\n');
                }
                Ok(combined)
            }
            _ => Err(self.corrupt("Contents is neither a stream nor an array")),
        }
    }

    fn stream_content(&self, object: &Object) -> Result<Vec<u8>> {
        let stream = object
            .as_stream()
            .map_err(|_| self.corrupt("content entry is not a stream"))?;
        if stream.dict.has(b"Filter") {
            stream
                .decompressed_content()
                .map_err(|e| self.corrupt(format!("content stream is not decodable: {}", e)))
        } else {
            Ok(stream.content.clone())
        }
    }

    /// Page content followed by the content of every Form XObject it names
    ///
    /// Used to compare pages whose drawing was moved into a form by
    /// fit-centered normalization.
    pub fn content_with_forms(&self) -> Result<Vec<u8>> {
        let mut content = self.content()?;
        let Some(resources) = self.inherited(b"Resources")? else {
            return Ok(content);
        };
        let resources = self
            .resolve(resources)?
            .as_dict()
            .map_err(|_| self.corrupt("Resources is not a dictionary"))?;
        let Ok(xobjects) = resources.get(b"XObject") else {
            return Ok(content);
        };
        let xobjects = self
            .resolve(xobjects)?
            .as_dict()
            .map_err(|_| self.corrupt("XObject resources are not a dictionary"))?;

        for (_, entry) in xobjects.iter() {
            let object = self.resolve(entry)?;
            if let Ok(stream) = object.as_stream() {
                let is_form = stream
                    .dict
                    .get(b"Subtype")
                    .and_then(Object::as_name)
                    .map(|name| name == b"Form")
                    .unwrap_or(false);
                if is_form {
                    content.push(b'\n');
                    content.extend(self.stream_content(object)?);
                }
            }
        }
        Ok(content)
    }
}

/// Copy inherited attributes onto every page of `doc`
///
/// Pages moved into a new page tree lose their old ancestors, so anything
/// they inherited has to live on the page itself first.
pub fn materialize_inherited(doc: &mut Document, document_name: &str) -> Result<()> {
    materialize_pages(doc, document_name, |_| true)
}

/// [`materialize_inherited`] restricted to the pages whose 1-based number passes `keep`
///
/// Pages that are about to be dropped are never read, so a broken ancestry
/// on one of them does not fail the rest.
pub(crate) fn materialize_pages(doc: &mut Document, document_name: &str, keep: impl Fn(u32) -> bool) -> Result<()> {
    let mut updates: Vec<(ObjectId, Vec<(&'static [u8], Object)>)> = Vec::new();

    for (number, id) in doc.get_pages().into_iter().filter(|(number, _)| keep(*number)) {
        let page = PageRef::new(doc, document_name, number, id);
        let own = page.dictionary()?;
        let mut missing = Vec::new();
        for key in INHERITABLE {
            if own.has(key) {
                continue;
            }
            if let Some(value) = page.inherited(key)? {
                missing.push((key, value.clone()));
            }
        }
        if !missing.is_empty() {
            updates.push((id, missing));
        }
    }

    for (id, entries) in updates {
        let page = doc
            .get_object_mut(id)
            .and_then(Object::as_dict_mut)
            .map_err(|e| Error::corrupt(document_name, e))?;
        for (key, value) in entries {
            page.set(key, value);
        }
    }
    Ok(())
}
