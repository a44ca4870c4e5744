//! OpenAI-compatible generation backend.
//!
//! Works with any endpoint that speaks the chat completions protocol
//! (OpenAI, Azure OpenAI, OpenRouter, vLLM, Ollama in compatibility mode).
//!
//! When no API key is configured the backend stays constructible but every
//! generation returns an empty reply, which callers read as "nothing".
//!
//! # Example
//!
//! ```rust,no_run
//! use keyplan_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use keyplan_core::GenerationBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "http://localhost:11434/v1".to_string(),
//!         api_key: Some("local".to_string()),
//!         model: "llama3".to_string(),
//!         timeout_seconds: 120,
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!     let clusters = backend
//!         .generate_json("Only return JSON.", "List clusters for lash serums.")
//!         .await
//!         .unwrap();
//!     println!("{clusters:?}");
//! }
//! ```

mod backend;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use types::*;
