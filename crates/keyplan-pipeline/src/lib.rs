//! # keyplan-pipeline
//!
//! Orchestration of a keyplan project run.
//!
//! - [`ClusterGenerator`]: candidate clusters from a text model, with
//!   deterministic fallbacks
//! - [`KeywordPipeline`]: seed derivation, provider ideas and metrics,
//!   classification, filtering, ranking and per-cluster caps
//! - [`TaxonomyRun`]: keyword expansion and the three-level topic hierarchy
//!
//! Collaborators are injected as trait objects so one rate-limited provider
//! client can be shared by every run in the process.

pub mod enrichment;
pub mod generation;
pub mod seeds;
pub mod taxonomy;

pub use enrichment::{
    cap_rows_per_cluster, passes_exclusions, rank_rows, select_clusters, KeywordPipeline,
    KeywordRun,
};
pub use generation::{
    build_cluster_prompt, dedupe_by_id, fallback_clusters, initial_clusters, normalize_clusters,
    ClusterGeneration, ClusterGenerator, ClusterSource, Prompt,
};
pub use seeds::{collect_seed_keywords, limited_seeds, seed_families, url_seed_terms};
pub use taxonomy::{KeywordExpansion, TaxonomyReport, TaxonomyRun};
