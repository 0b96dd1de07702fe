//! Property tests for merge and split page accounting

mod common;

use common::{letter_document, page_labels};
use pdf_toolbox::pdf::{merge_documents, split_document, MergeOptions, SplitGranularity};
use pdf_toolbox::SourceDocument;
use proptest::prelude::*;

fn reload(output: &pdf_toolbox::OutputDocument) -> SourceDocument {
    SourceDocument::load(output).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn merged_page_count_is_sum(counts in prop::collection::vec(1u32..5, 1..5)) {
        let docs: Vec<SourceDocument> = counts
            .iter()
            .enumerate()
            .map(|(i, &pages)| letter_document(&format!("doc{}.pdf", i), &format!("D{}", i), pages))
            .collect();
        let refs: Vec<&SourceDocument> = docs.iter().collect();

        let merged = merge_documents(&refs, &MergeOptions::new("sum")).unwrap();
        prop_assert_eq!(merged.page_count(), counts.iter().sum::<u32>());

        let expected: Vec<String> = docs.iter().flat_map(page_labels).collect();
        prop_assert_eq!(page_labels(&reload(&merged)), expected);
    }

    #[test]
    fn split_then_merge_restores_pages(total in 1u32..8, group in 1u32..8) {
        prop_assume!(group <= total);
        let doc = letter_document("source.pdf", "S", total);

        let parts = split_document(&doc, SplitGranularity::GroupOf(group)).unwrap();
        prop_assert_eq!(parts.len() as u32, (total + group - 1) / group);
        for part in &parts[..parts.len() - 1] {
            prop_assert_eq!(part.page_count(), group);
        }

        let reloaded: Vec<SourceDocument> = parts.iter().map(reload).collect();
        let refs: Vec<&SourceDocument> = reloaded.iter().collect();
        let rejoined = merge_documents(&refs, &MergeOptions::new("rejoined")).unwrap();
        prop_assert_eq!(page_labels(&reload(&rejoined)), page_labels(&doc));
    }
}

#[test]
fn merge_is_associative() {
    let a = letter_document("a.pdf", "A", 2);
    let b = letter_document("b.pdf", "B", 1);
    let c = letter_document("c.pdf", "C", 3);

    let ab = reload(&merge_documents(&[&a, &b], &MergeOptions::new("ab")).unwrap());
    let left = reload(&merge_documents(&[&ab, &c], &MergeOptions::new("left")).unwrap());

    let bc = reload(&merge_documents(&[&b, &c], &MergeOptions::new("bc")).unwrap());
    let right = reload(&merge_documents(&[&a, &bc], &MergeOptions::new("right")).unwrap());

    let flat = reload(&merge_documents(&[&a, &b, &c], &MergeOptions::new("flat")).unwrap());

    assert_eq!(page_labels(&left), page_labels(&right));
    assert_eq!(page_labels(&left), page_labels(&flat));
}
