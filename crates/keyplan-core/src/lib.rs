//! # keyplan-core
//!
//! Core types, traits, and text utilities for keyplan.
//!
//! This crate provides the data model shared by the clustering, provider,
//! inference and pipeline crates, the collaborator traits they plug into,
//! and the keyword sanitizer every outbound keyword passes through.

pub mod defaults;
pub mod error;
pub mod models;
pub mod sanitizer;
pub mod text;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use sanitizer::{normalize_keyword, sanitize_keyword_list};
pub use text::{extract_brand_terms, extract_keywords_from_url, slugify, tokenize};
pub use traits::*;
