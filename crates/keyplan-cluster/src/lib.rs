//! # keyplan-cluster
//!
//! Deterministic keyword-planning algorithms: bounded cluster selection,
//! the three-level topic taxonomy, per-keyword classification, and
//! per-cluster volume totals. Nothing in this crate performs I/O.

pub mod classify;
pub mod limiter;
pub mod taxonomy;
pub mod totals;

// Re-export core types for convenience
pub use keyplan_core::*;

pub use classify::{
    find_competitor, guess_cluster, infer_intent_stage, infer_source_type, KeywordClassifier,
};
pub use limiter::limit_clusters;
pub use taxonomy::{build_taxonomy, TaxonomyBuilder};
pub use totals::cluster_totals;
