//! Page geometry: paper sizes, rectangles and fit calculations
//!
//! All values are PDF points (1/72 inch). The coordinate system has its
//! origin at the bottom-left of the page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Points per millimeter
const PT_PER_MM: f32 = 72.0 / 25.4;

/// Tolerance (in points) under which two page sizes count as equal
pub const SIZE_TOLERANCE: f32 = 1.0;

/// Target paper size in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaperSize {
    pub width: f32,
    pub height: f32,
}

impl PaperSize {
    /// A4 (210mm × 297mm), rounded to whole points like most PDF tools
    pub const A4: PaperSize = PaperSize { width: 595.0, height: 842.0 };
    /// A3 (297mm × 420mm)
    pub const A3: PaperSize = PaperSize { width: 842.0, height: 1191.0 };
    /// A5 (148mm × 210mm)
    pub const A5: PaperSize = PaperSize { width: 420.0, height: 595.0 };
    /// US Letter (8.5" × 11")
    pub const LETTER: PaperSize = PaperSize { width: 612.0, height: 792.0 };
    /// US Legal (8.5" × 14")
    pub const LEGAL: PaperSize = PaperSize { width: 612.0, height: 1008.0 };

    /// Create a size from points, rejecting non-positive dimensions
    pub fn new(width: f32, height: f32) -> Result<Self> {
        if !(width > 0.0 && height > 0.0) || !width.is_finite() || !height.is_finite() {
            return Err(Error::InvalidPaperSize(format!("{}x{}", width, height)));
        }
        Ok(Self { width, height })
    }

    /// Create a size from millimeters
    pub fn from_mm(width_mm: f32, height_mm: f32) -> Result<Self> {
        Self::new(width_mm * PT_PER_MM, height_mm * PT_PER_MM)
    }

    /// True when both dimensions are within `tolerance` points of `other`
    pub fn matches(&self, width: f32, height: f32, tolerance: f32) -> bool {
        (self.width - width).abs() <= tolerance && (self.height - height).abs() <= tolerance
    }
}

impl Default for PaperSize {
    fn default() -> Self {
        Self::A4
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = [
            ("a3", Self::A3),
            ("a4", Self::A4),
            ("a5", Self::A5),
            ("letter", Self::LETTER),
            ("legal", Self::LEGAL),
        ];
        match named.iter().find(|(_, size)| size == self) {
            Some((name, _)) => f.write_str(name),
            None => write!(f, "{}x{}", self.width, self.height),
        }
    }
}

/// Parse `"a4"`, `"letter"`, ... or `"<width>x<height>"` in points
impl FromStr for PaperSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "a3" => return Ok(Self::A3),
            "a4" => return Ok(Self::A4),
            "a5" => return Ok(Self::A5),
            "letter" => return Ok(Self::LETTER),
            "legal" => return Ok(Self::LEGAL),
            _ => {}
        }

        let (w, h) = s
            .split_once('x')
            .ok_or_else(|| Error::InvalidPaperSize(s.clone()))?;
        let width: f32 = w.trim().parse().map_err(|_| Error::InvalidPaperSize(s.clone()))?;
        let height: f32 = h.trim().parse().map_err(|_| Error::InvalidPaperSize(s.clone()))?;
        Self::new(width, height)
    }
}

impl TryFrom<String> for PaperSize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PaperSize> for String {
    fn from(size: PaperSize) -> Self {
        size.to_string()
    }
}

/// A PDF rectangle `[llx lly urx ury]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub llx: f32,
    pub lly: f32,
    pub urx: f32,
    pub ury: f32,
}

impl Rect {
    /// Build a rectangle from two arbitrary corners
    pub fn from_corners(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self {
            llx: x0.min(x1),
            lly: y0.min(y1),
            urx: x0.max(x1),
            ury: y0.max(y1),
        }
    }

    /// Rectangle at the origin with the given size
    pub fn sized(size: PaperSize) -> Self {
        Self::from_corners(0.0, 0.0, size.width, size.height)
    }

    pub fn width(&self) -> f32 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f32 {
        self.ury - self.lly
    }

    /// Overlap of two rectangles, `None` when they don't intersect
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let r = Rect {
            llx: self.llx.max(other.llx),
            lly: self.lly.max(other.lly),
            urx: self.urx.min(other.urx),
            ury: self.ury.min(other.ury),
        };
        (r.width() > 0.0 && r.height() > 0.0).then_some(r)
    }

    /// Rectangle of `size` sharing this rectangle's top-left corner
    pub fn anchored_top_left(&self, size: PaperSize) -> Rect {
        Rect {
            llx: self.llx,
            lly: self.ury - size.height,
            urx: self.llx + size.width,
            ury: self.ury,
        }
    }
}

/// Uniform scale and offsets placing a source box centered inside a target page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitPlacement {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl FitPlacement {
    /// Largest uniform scale at which `src_width × src_height` fits `target`,
    /// centered on both axes
    pub fn compute(src_width: f32, src_height: f32, target: PaperSize) -> Self {
        let scale = (target.width / src_width).min(target.height / src_height);
        Self {
            scale,
            offset_x: (target.width - src_width * scale) / 2.0,
            offset_y: (target.height - src_height * scale) / 2.0,
        }
    }
}
