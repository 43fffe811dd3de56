//! Property test for the batch-accounting invariant:
//! `total == completed + failed + skipped` for any mix of documents.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;

use crate::core::batch::{process_batch, BatchConfig};
use crate::core::document::DocumentInput;
use crate::core::segmenter::Segmenter;

#[derive(Debug, Clone)]
enum DocShape {
    MissingId,
    NoThaiContent,
    ThaiContent,
}

fn arb_doc_shape() -> impl Strategy<Value = DocShape> {
    prop_oneof![Just(DocShape::MissingId), Just(DocShape::NoThaiContent), Just(DocShape::ThaiContent)]
}

fn doc_from_shape(idx: usize, shape: &DocShape) -> DocumentInput {
    match shape {
        DocShape::MissingId => DocumentInput {
            id: None,
            title: "no id".to_string(),
            content: String::new(),
            metadata: HashMap::new(),
        },
        DocShape::NoThaiContent => DocumentInput {
            id: Some(format!("doc-{idx}")),
            title: "hello".to_string(),
            content: "world".to_string(),
            metadata: HashMap::new(),
        },
        DocShape::ThaiContent => DocumentInput {
            id: Some(format!("doc-{idx}")),
            title: "ราคา".to_string(),
            content: "100 บาท".to_string(),
            metadata: HashMap::new(),
        },
    }
}

proptest! {
    /// Invariant 5: whatever the mix of missing-id / no-Thai / Thai
    /// documents in a batch, `total` always equals the sum of the three
    /// per-status counts.
    #[test]
    fn batch_accounting_sums_to_total(shapes in prop::collection::vec(arb_doc_shape(), 0..40)) {
        let documents: Vec<DocumentInput> = shapes.iter().enumerate().map(|(i, s)| doc_from_shape(i, s)).collect();
        let expected_total = documents.len();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(async {
            let segmenter = Arc::new(Segmenter::new("newmm", false, None).unwrap());
            process_batch(documents, segmenter, &BatchConfig::default()).await
        });

        prop_assert_eq!(result.total, expected_total);
        prop_assert_eq!(result.completed + result.failed + result.skipped, result.total);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_from_shape_produces_expected_id_presence() {
        assert!(doc_from_shape(0, &DocShape::MissingId).id.is_none());
        assert!(doc_from_shape(0, &DocShape::ThaiContent).id.is_some());
    }
}
