//! PDF splitting by page count
//!
//! Pages are walked in order and grouped; the last group keeps whatever is
//! left over, so concatenating the outputs reproduces the source.

use std::fmt;

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::output::OutputDocument;
use crate::pdf::assemble::PageAssembler;
use crate::pdf::page::materialize_inherited;
use crate::source::SourceDocument;

/// How many source pages go into each output document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitGranularity {
    /// One output per page, named `page_<k>.pdf`
    #[default]
    EachPage,
    /// `n` pages per output, named by part and page range
    GroupOf(u32),
}

impl SplitGranularity {
    fn group_size(self) -> u32 {
        match self {
            SplitGranularity::EachPage => 1,
            SplitGranularity::GroupOf(n) => n,
        }
    }
}

impl fmt::Display for SplitGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitGranularity::EachPage => f.write_str("each page"),
            SplitGranularity::GroupOf(n) => write!(f, "{} pages per part", n),
        }
    }
}

/// File name of one split output
fn part_name(source: &SourceDocument, granularity: SplitGranularity, part: u32, first: u32, last: u32) -> String {
    match granularity {
        SplitGranularity::EachPage => format!("page_{}.pdf", first),
        SplitGranularity::GroupOf(_) => {
            format!("{}_part_{}_pages_{}-{}.pdf", source.stem(), part, first, last)
        }
    }
}

/// Split a PDF into consecutive page groups
///
/// # Example
///
/// ```no_run
/// use pdf_toolbox::pdf::{split_document, SplitGranularity};
/// use pdf_toolbox::source::{FileSource, SourceDocument};
///
/// let report = SourceDocument::load(&FileSource::new("report.pdf")).unwrap();
/// for part in split_document(&report, SplitGranularity::GroupOf(3)).unwrap() {
///     println!("{}: pages {}-{}", part.name(), part.first_page(), part.last_page());
/// }
/// ```
pub fn split_document(source: &SourceDocument, granularity: SplitGranularity) -> Result<Vec<OutputDocument>> {
    let total = source.page_count();
    if total == 0 {
        return Err(Error::EmptyDocument(source.name().to_string()));
    }

    let size = granularity.group_size();
    if size == 0 || size > total {
        return Err(Error::InvalidGranularity { requested: size, total });
    }

    // Materialized once; each part then copies only what its pages reach
    let mut doc = source.document().clone();
    materialize_inherited(&mut doc, source.name())?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();

    let mut outputs = Vec::with_capacity(total.div_ceil(size) as usize);
    let mut first = 1;
    while first <= total {
        let last = (first + size - 1).min(total);
        let part = outputs.len() as u32 + 1;

        let mut assembler = PageAssembler::new();
        assembler.append_pages(&doc, &page_ids[(first - 1) as usize..last as usize]);

        let name = part_name(source, granularity, part, first, last);
        debug!(document = %source.name(), part, first, last, "writing split part");
        outputs.push(OutputDocument::from_document_range(name, assembler.finish(), first, last)?);

        first = last + 1;
    }

    info!(
        document = %source.name(),
        granularity = %granularity,
        parts = outputs.len(),
        "split document"
    );
    Ok(outputs)
}
