//! Taxonomy run: expand seed families into keywords, then build the
//! three-level hierarchy over them.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use keyplan_cluster::build_taxonomy;
use keyplan_core::{location_code, GenerationBackend, KeywordDataProvider, RunInput, TaxonomyBuild};

use crate::seeds::seed_families;

const EXPANSION_SYSTEM: &str = "You are a keyword expansion engine. Only return JSON.";

fn expansion_prompt(families: &[String]) -> String {
    format!(
        "Expand these seed families into keyword families: {}. Return JSON with {{ expandedKeywords: string[], suggestedQueries: string[] }}.",
        families.join(", ")
    )
}

fn string_list(reply: Option<&Value>, key: &str) -> Vec<String> {
    reply
        .and_then(|r| r.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Keywords gathered for a taxonomy run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordExpansion {
    pub seed_families: Vec<String>,
    /// Model suggestions followed by provider ideas.
    pub expanded_keywords: Vec<String>,
    pub suggested_queries: Vec<String>,
    pub provider_suggestions: Vec<String>,
}

/// Expansion plus the taxonomy built over it.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyReport {
    pub expansion: KeywordExpansion,
    #[serde(flatten)]
    pub build: TaxonomyBuild,
}

/// Expands seed families through both collaborators and builds a taxonomy.
pub struct TaxonomyRun {
    backend: Arc<dyn GenerationBackend>,
    provider: Arc<dyn KeywordDataProvider>,
}

impl TaxonomyRun {
    pub fn new(backend: Arc<dyn GenerationBackend>, provider: Arc<dyn KeywordDataProvider>) -> Self {
        Self { backend, provider }
    }

    /// Ask the model and the provider for keywords related to `families`.
    ///
    /// Either collaborator failing contributes nothing; the other's
    /// keywords are still used.
    pub async fn expand(&self, families: Vec<String>, location: u32) -> KeywordExpansion {
        let reply = match self
            .backend
            .generate_json(EXPANSION_SYSTEM, &expansion_prompt(&families))
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Keyword expansion generation failed");
                None
            }
        };

        let provider_suggestions = if families.is_empty() {
            Vec::new()
        } else {
            self.provider
                .keyword_ideas(&families, location)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "Keyword expansion ideas failed");
                    Vec::new()
                })
        };

        let mut expanded_keywords = string_list(reply.as_ref(), "expandedKeywords");
        expanded_keywords.extend(provider_suggestions.iter().cloned());

        KeywordExpansion {
            seed_families: families,
            expanded_keywords,
            suggested_queries: string_list(reply.as_ref(), "suggestedQueries"),
            provider_suggestions,
        }
    }

    /// Expand the run's seed families and build the taxonomy.
    #[instrument(skip_all, fields(subsystem = "pipeline", component = "taxonomy", op = "run"))]
    pub async fn run(&self, input: &RunInput) -> TaxonomyReport {
        let families = seed_families(input);
        let expansion = self.expand(families, location_code(&input.country)).await;
        let build = build_taxonomy(&expansion.expanded_keywords);
        info!(
            seed_count = expansion.seed_families.len(),
            item_count = build.assignments.len(),
            leaf_count = build.taxonomy.l3.len(),
            "Taxonomy run complete"
        );
        TaxonomyReport { expansion, build }
    }
}
