//! Property-based tests for the tokenization/indexing core.
//!
//! Run all of them with:
//! ```sh
//! cargo test property
//! ```
//!
//! - `segmentation_props`: boundary coverage, reconstruction and
//!   determinism invariants for [`crate::core::segmenter::Segmenter`].
//! - `batch_props`: the `total = completed + failed + skipped` accounting
//!   invariant for [`crate::core::batch::process_batch`].
//! - `highlight_props`: no two [`crate::core::enhance::HighlightSpan`]s
//!   overlap after [`crate::core::enhance::merge_overlapping_spans`].

mod batch_props;
mod highlight_props;
mod segmentation_props;
