//! Cluster generation: prompt a text model, fall back to heuristics.
//!
//! The generated list is the candidate set a user later selects from before
//! the keyword run. Three sources are tried in order: the model's reply, the
//! user's initial clusters, and pseudo-clusters derived from URL tokens.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use keyplan_core::{defaults, slugify, Cluster, GenerationBackend, IntentStage, MarketType, RunInput};

use crate::seeds::url_seed_terms;

const COMMON_RULES: &str = r#"Return JSON only. Provide 12-25 clusters.
Each cluster must include: name, intentStage (awareness|consideration|decision), concern (optional), score (0-100).
Avoid duplicates. Keep names short and specific. Prefer customer language over internal jargon.
Format: { "clusters": [ { "name": "...", "intentStage": "...", "concern": "...", "score": 0 } ] }"#;

const B2B_FRAMING: &str = "Follow this B2B intent framing:
- Transactional: pricing/demo/quote/vendor selection
- Commercial investigation: best, reviews, alternatives, comparisons
- Problem-led: operational pain, compliance, workflow bottlenecks
- Procurement/social value: tenders, bid content, evidence packs
- Governance: due diligence, audit trail, risk controls

Cluster naming examples:
- Grant management software
- Corporate giving platform
- Social value reporting
- Due diligence workflow
- Impact dashboard
- Stakeholder voting tool";

const B2C_FRAMING: &str = "Follow this B2C intent framing:
- Awareness: concerns, symptoms, routines (e.g., pigmentation causes)
- Consideration: best/top/reviews/comparison
- Decision: buy/price/discount/trial

Cluster naming examples:
- Pigmented skin treatment
- Dark spots correction
- Brightening serums
- Lash growth serum
- Sensitive skin routine";

/// System instruction and user prompt for one generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub prompt: String,
}

/// Build the cluster prompt for the run's market type.
pub fn build_cluster_prompt(input: &RunInput) -> Prompt {
    let context = json!({
        "targetUrl": input.target_url,
        "competitors": input.competitors,
        "industry": input.industry,
        "audience": input.audience,
        "constraints": input.constraints,
        "initialClusters": input.initial_clusters,
    });

    let (system, framing) = match input.market_type {
        MarketType::B2b => ("You are a B2B keyword clustering assistant.", B2B_FRAMING),
        MarketType::B2c => ("You are a B2C keyword clustering assistant.", B2C_FRAMING),
    };

    Prompt {
        system: system.to_string(),
        prompt: format!("{COMMON_RULES}\n{framing}\n\nInput: {context}"),
    }
}

fn text_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn number_field(item: &Value, key: &str) -> f64 {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Normalize a model reply into clusters.
///
/// Accepts `{clusters: [...]}` or a bare array. The id is the slug of the
/// given id, else of the name; entries without an id or name are dropped.
/// Non-numeric scores read as 0.
pub fn normalize_clusters(reply: &Value) -> Vec<Cluster> {
    let items = match reply.get("clusters").unwrap_or(reply) {
        Value::Array(items) => items,
        _ => return Vec::new(),
    };

    let clusters = items
        .iter()
        .filter_map(|item| {
            let name = text_field(item, "name").unwrap_or_default().trim().to_string();
            let id = slugify(text_field(item, "id").unwrap_or(&name));
            if id.is_empty() || name.is_empty() {
                return None;
            }
            let concern = text_field(item, "concern").unwrap_or_default();
            Some(Cluster {
                id,
                name,
                intent_stage: IntentStage::parse(text_field(item, "intentStage").unwrap_or_default()),
                concern: (!concern.is_empty()).then(|| concern.to_string()),
                score: number_field(item, "score"),
            })
        })
        .collect();
    dedupe_by_id(clusters)
}

/// Keep the first cluster for each id.
pub fn dedupe_by_id(clusters: Vec<Cluster>) -> Vec<Cluster> {
    let mut seen = HashSet::new();
    clusters
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

/// Clusters from the user's initial list: awareness, concern = industry.
pub fn initial_clusters(input: &RunInput) -> Vec<Cluster> {
    let clusters = input
        .initial_clusters
        .iter()
        .map(|name| {
            Cluster::new(name.trim(), IntentStage::Awareness, defaults::INITIAL_CLUSTER_SCORE)
                .with_concern(input.industry.trim())
        })
        .filter(|c| !c.id.is_empty() && !c.name.is_empty())
        .collect();
    dedupe_by_id(clusters)
}

/// Deterministic pseudo-clusters from the initial list, the industry, and
/// the non-brand URL terms.
///
/// Names that slug to the same id count once. The first
/// [`defaults::FALLBACK_CLUSTER_LIMIT`] distinct names are kept; scores count
/// down from [`defaults::FALLBACK_SCORE_BASE`].
pub fn fallback_clusters(input: &RunInput) -> Vec<Cluster> {
    let industry = input.industry.trim();

    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let candidates = input
        .initial_clusters
        .iter()
        .cloned()
        .chain((!industry.is_empty()).then(|| industry.to_string()))
        .chain(url_seed_terms(input));
    for name in candidates {
        let slug = slugify(&name);
        let key = if slug.is_empty() { name.clone() } else { slug };
        if !name.is_empty() && seen.insert(key) {
            names.push(name);
        }
    }

    names
        .into_iter()
        .take(defaults::FALLBACK_CLUSTER_LIMIT)
        .enumerate()
        .map(|(index, name)| {
            let mut cluster = Cluster::new(
                name,
                IntentStage::Awareness,
                defaults::FALLBACK_SCORE_BASE - index as f64,
            )
            .with_concern(industry);
            if cluster.id.is_empty() {
                cluster.id = format!("cluster-{}", index + 1);
            }
            cluster
        })
        .collect()
}

/// Where a generated cluster list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterSource {
    Generated,
    Initial,
    Fallback,
}

/// Result of cluster generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterGeneration {
    pub source: ClusterSource,
    pub clusters: Vec<Cluster>,
}

/// Produces the candidate cluster list for a run.
pub struct ClusterGenerator {
    backend: Arc<dyn GenerationBackend>,
}

impl ClusterGenerator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Generate clusters, never failing: a generation error is logged and
    /// treated as an empty reply.
    #[instrument(skip_all, fields(subsystem = "pipeline", component = "generation", op = "clusters"))]
    pub async fn generate(&self, input: &RunInput) -> ClusterGeneration {
        let prompt = build_cluster_prompt(input);
        let reply = match self.backend.generate_json(&prompt.system, &prompt.prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, model = self.backend.model_name(), "Cluster generation failed, using fallbacks");
                None
            }
        };

        let generated = reply.as_ref().map(normalize_clusters).unwrap_or_default();
        let result = if !generated.is_empty() {
            ClusterGeneration {
                source: ClusterSource::Generated,
                clusters: generated,
            }
        } else {
            let initial = initial_clusters(input);
            if !initial.is_empty() {
                ClusterGeneration {
                    source: ClusterSource::Initial,
                    clusters: initial,
                }
            } else {
                warn!("No usable clusters from generation or input, deriving from URLs");
                ClusterGeneration {
                    source: ClusterSource::Fallback,
                    clusters: fallback_clusters(input),
                }
            }
        };

        debug!(names = ?result.clusters.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), "Chosen clusters");
        info!(
            source = ?result.source,
            item_count = result.clusters.len(),
            "Cluster generation complete"
        );
        result
    }
}
