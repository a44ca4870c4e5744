//! # keyplan-inference
//!
//! Text generation backends for keyplan.
//!
//! Cluster generation asks a chat model for strict JSON and falls back to
//! deterministic heuristics when nothing usable comes back. This crate
//! provides the backend that answers those prompts.
//!
//! # Feature Flags
//!
//! - `openai` (default): OpenAI-compatible chat completions backend
//!
//! # Example
//!
//! ```rust,no_run
//! use keyplan_inference::OpenAIBackend;
//! use keyplan_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = OpenAIBackend::from_env().unwrap();
//!     let reply = backend
//!         .generate_json("Only return JSON.", "Return {\"ok\": true}")
//!         .await
//!         .unwrap();
//!     println!("{reply:?}");
//! }
//! ```

#[cfg(feature = "openai")]
pub mod openai;

// Re-export core types
pub use keyplan_core::*;

#[cfg(feature = "openai")]
pub use openai::{OpenAIBackend, OpenAIConfig};
