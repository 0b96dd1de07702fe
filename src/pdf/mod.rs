//! PDF page pipeline: normalize, rotate, merge, split

mod assemble;
pub mod merge;
pub mod metadata;
pub mod normalize;
pub mod page;
pub mod rotate;
pub mod split;

// Re-export commonly used items
pub use merge::{merge_documents, merge_sources, MergeOptions};
pub use metadata::{count_pages, extract_metadata, PageSummary, PdfMetadata};
pub use normalize::{
    normalize, normalize_with_policy, CorruptPagePolicy, NormalizeMode, NormalizeSettings, Normalized,
};
pub use page::PageRef;
pub use rotate::{rotate_page, Rotation, RotationMap};
pub use split::{split_document, SplitGranularity};
