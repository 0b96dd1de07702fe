//! Metadata-level page rotation
//!
//! Rotation is stored in the page's `/Rotate` entry; content streams are
//! never rewritten. A new rotation is added to whatever the page already
//! carries, modulo 360.

use std::collections::BTreeMap;

use lopdf::{Document, Object};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pdf::page::PageRef;

/// A clockwise quarter-turn rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Half,
    Clockwise270,
}

impl Rotation {
    /// Accepts exactly 0, 90, 180 or 270
    pub fn from_degrees(degrees: i64) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::None),
            90 => Ok(Rotation::Clockwise90),
            180 => Ok(Rotation::Half),
            270 => Ok(Rotation::Clockwise270),
            other => Err(Error::InvalidRotation(other)),
        }
    }

    /// Interpret a stored `/Rotate` value, which may be negative or exceed 360
    pub(crate) fn from_stored(value: i64) -> Option<Self> {
        if value % 90 != 0 {
            return None;
        }
        Self::from_degrees(value.rem_euclid(360)).ok()
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 90,
            Rotation::Half => 180,
            Rotation::Clockwise270 => 270,
        }
    }

    /// This rotation followed by `other`
    pub fn then(self, other: Rotation) -> Rotation {
        match (self.degrees() + other.degrees()) % 360 {
            90 => Rotation::Clockwise90,
            180 => Rotation::Half,
            270 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    /// True for 90 and 270, where width and height swap on screen
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

impl TryFrom<i64> for Rotation {
    type Error = Error;

    fn try_from(degrees: i64) -> Result<Self> {
        Self::from_degrees(degrees)
    }
}

/// Rotate one page (1-based) of `doc` in place
///
/// Returns the rotation now stored on the page.
pub fn rotate_page(doc: &mut Document, document_name: &str, page_number: u32, rotation: Rotation) -> Result<Rotation> {
    let pages = doc.get_pages();
    let total = pages.len() as u32;
    let page_id = *pages
        .get(&page_number)
        .ok_or(Error::PageOutOfRange { page: page_number, total })?;

    let current = PageRef::new(doc, document_name, page_number, page_id).rotation()?;
    let updated = current.then(rotation);

    let page = doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| Error::corrupt_page(document_name, page_number, e))?;
    page.set("Rotate", Object::Integer(updated.degrees()));

    debug!(
        document = %document_name,
        page = page_number,
        from = current.degrees(),
        to = updated.degrees(),
        "rotated page"
    );
    Ok(updated)
}

/// Sparse rotations keyed by 1-based position in the merged page stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RotationMap {
    entries: BTreeMap<u32, Rotation>,
}

impl RotationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a rotation for `page`, validating the angle
    pub fn insert(&mut self, page: u32, degrees: i64) -> Result<()> {
        if page == 0 {
            return Err(Error::InvalidPagePosition(page));
        }
        let rotation = Rotation::from_degrees(degrees)?;
        self.entries.insert(page, rotation);
        Ok(())
    }

    /// Builder-style [`RotationMap::insert`]
    pub fn with(mut self, page: u32, degrees: i64) -> Result<Self> {
        self.insert(page, degrees)?;
        Ok(self)
    }

    pub fn get(&self, page: u32) -> Option<Rotation> {
        self.entries.get(&page).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, Rotation)> + '_ {
        self.entries.iter().map(|(&page, &rotation)| (page, rotation))
    }

    /// Highest page position mentioned, if any
    pub fn last_page(&self) -> Option<u32> {
        self.entries.keys().next_back().copied()
    }

    /// Apply every entry to `doc`, failing before any change if a position is out of range
    pub fn apply(&self, doc: &mut Document, document_name: &str) -> Result<()> {
        let total = doc.get_pages().len() as u32;
        if let Some(page) = self.last_page().filter(|&page| page > total) {
            return Err(Error::PageOutOfRange { page, total });
        }
        for (page, rotation) in self.iter() {
            rotate_page(doc, document_name, page, rotation)?;
        }
        Ok(())
    }
}
