//! Collaborator traits for the external services a run depends on.

use async_trait::async_trait;
use serde_json::Value;

use crate::{KeywordMetric, Result};

// =============================================================================
// TEXT GENERATION
// =============================================================================

/// Backend for text generation.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate and parse a strict-JSON reply.
    ///
    /// Returns `Ok(None)` when the reply is empty or not valid JSON.
    async fn generate_json(&self, system: &str, prompt: &str) -> Result<Option<Value>> {
        let content = self.generate_with_system(system, prompt).await?;
        Ok(parse_json_content(&content))
    }

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Parse a model reply as JSON, tolerating a surrounding markdown fence.
pub fn parse_json_content(content: &str) -> Option<Value> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))?
        .trim_end()
        .strip_suffix("```")?;
    serde_json::from_str(unfenced.trim()).ok()
}

// =============================================================================
// KEYWORD METRICS
// =============================================================================

/// Rate-limited keyword metrics provider.
#[async_trait]
pub trait KeywordDataProvider: Send + Sync {
    /// Related keyword ideas for the given seeds, sanitized and deduplicated.
    async fn keyword_ideas(&self, seeds: &[String], location_code: u32) -> Result<Vec<String>>;

    /// Volume, CPC and competition for the given keywords.
    async fn search_volume(
        &self,
        keywords: &[String],
        location_code: u32,
    ) -> Result<Vec<KeywordMetric>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CannedBackend(&'static str);

    #[async_trait]
    impl GenerationBackend for CannedBackend {
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_parse_json_content_plain() {
        assert_eq!(
            parse_json_content(r#"{"clusters": []}"#),
            Some(json!({"clusters": []}))
        );
    }

    #[test]
    fn test_parse_json_content_fenced() {
        let content = "```json\n{\"a\": 1}\n```";
        assert_eq!(parse_json_content(content), Some(json!({"a": 1})));
        assert_eq!(parse_json_content("```\n[1, 2]\n```"), Some(json!([1, 2])));
    }

    #[test]
    fn test_parse_json_content_unusable() {
        assert_eq!(parse_json_content(""), None);
        assert_eq!(parse_json_content("Sure! Here are some clusters."), None);
        assert_eq!(parse_json_content("```json\nnot json\n```"), None);
    }

    #[tokio::test]
    async fn test_generate_json_default_method() {
        let backend = CannedBackend(r#"{"clusters": [{"name": "Lash serum"}]}"#);
        let value = backend.generate_json("system", "prompt").await.unwrap();
        assert_eq!(value.unwrap()["clusters"][0]["name"], "Lash serum");

        let backend = CannedBackend("");
        assert!(backend.generate_json("system", "prompt").await.unwrap().is_none());
    }
}
