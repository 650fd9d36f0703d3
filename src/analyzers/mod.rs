//! Earnings classification and aggregation.
//!
//! Rows are labelled by keyword matching against item titles, folded into
//! per-label (and per-source) buckets, then ranked. The unpopular-item scan and
//! keyword suggestions build on the same classification.

pub mod aggregate;
pub mod classify;
pub mod sort;
pub mod suggest;
pub mod types;
pub mod unpopular;
pub mod utility;
