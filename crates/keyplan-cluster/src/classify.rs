//! Per-keyword classification: intent stage, brand/generic source,
//! competitor association, and owning cluster.
//!
//! All matching is lowercase substring matching. Every function here always
//! produces a value.

use tracing::trace;

use keyplan_core::{
    extract_brand_terms, Cluster, IntentStage, KeywordMetric, KeywordRow, RunInput, SourceType,
};

const DECISION_TERMS: &[&str] = &[
    "buy", "price", "pricing", "order", "discount", "coupon", "deal", "quote", "demo", "trial",
    "subscribe", "sign up", "book",
];

const CONSIDERATION_TERMS: &[&str] = &[
    "best",
    "top",
    "review",
    "reviews",
    "compare",
    "comparison",
    "vs",
    "versus",
    "alternatives",
    "ranking",
    "recommended",
];

const AWARENESS_TERMS: &[&str] = &[
    "what is", "how to", "benefits", "symptoms", "causes", "guide", "ideas",
];

fn contains_any(value: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| value.contains(term))
}

/// Infer an intent stage from keyword phrasing.
///
/// Decision terms win over consideration terms, which win over awareness
/// terms; keywords matching nothing are awareness.
pub fn infer_intent_stage(keyword: &str) -> IntentStage {
    let value = keyword.to_lowercase();
    if contains_any(&value, DECISION_TERMS) {
        IntentStage::Decision
    } else if contains_any(&value, CONSIDERATION_TERMS) {
        IntentStage::Consideration
    } else {
        IntentStage::Awareness
    }
}

/// `Brand` when the keyword contains any brand token.
pub fn infer_source_type<S: AsRef<str>>(keyword: &str, brand_terms: &[S]) -> SourceType {
    let value = keyword.to_lowercase();
    if brand_terms.iter().any(|term| value.contains(AsRef::<str>::as_ref(term))) {
        SourceType::Brand
    } else {
        SourceType::Generic
    }
}

/// First competitor brand token found in the keyword.
pub fn find_competitor<'a, S: AsRef<str>>(
    keyword: &str,
    competitor_brands: &'a [S],
) -> Option<&'a str> {
    let value = keyword.to_lowercase();
    competitor_brands
        .iter()
        .map(|term| -> &'a str { term.as_ref() })
        .find(|term| value.contains(*term))
}

/// Cluster whose name is the longest substring of the keyword.
///
/// Equal-length matches keep list order. Falls back to the first cluster,
/// and to `None` only when there are no clusters.
pub fn guess_cluster<'a>(keyword: &str, clusters: &'a [Cluster]) -> Option<&'a Cluster> {
    let value = keyword.to_lowercase();
    let mut best: Option<&Cluster> = None;
    for cluster in clusters {
        let name = cluster.name.to_lowercase();
        if name.is_empty() || !value.contains(&name) {
            continue;
        }
        if best.map_or(true, |b| cluster.name.len() > b.name.len()) {
            best = Some(cluster);
        }
    }
    best.or_else(|| clusters.first())
}

/// Brand context for one run, extracted once from the input URLs.
#[derive(Debug, Clone, Default)]
pub struct KeywordClassifier {
    brand_terms: Vec<String>,
    competitor_brands: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(target_brands: Vec<String>, competitor_brands: Vec<String>) -> Self {
        let mut brand_terms = target_brands;
        for term in &competitor_brands {
            if !brand_terms.contains(term) {
                brand_terms.push(term.clone());
            }
        }
        Self {
            brand_terms,
            competitor_brands,
        }
    }

    pub fn from_input(input: &RunInput) -> Self {
        Self::new(
            extract_brand_terms(&[input.target_url.as_str()]),
            extract_brand_terms(input.competitors.as_slice()),
        )
    }

    /// Target and competitor brand tokens, target first.
    pub fn brand_terms(&self) -> &[String] {
        &self.brand_terms
    }

    pub fn competitor_brands(&self) -> &[String] {
        &self.competitor_brands
    }

    /// Turn a provider metric into an export row.
    ///
    /// The owning cluster's stage wins when known; otherwise the stage is
    /// inferred from the keyword. `default_concern` fills in for clusters
    /// without a concern.
    pub fn classify(
        &self,
        metric: &KeywordMetric,
        clusters: &[Cluster],
        default_concern: &str,
    ) -> KeywordRow {
        let cluster = guess_cluster(&metric.keyword, clusters);
        let intent_stage = match cluster {
            Some(c) if c.intent_stage.is_known() => c.intent_stage,
            _ => infer_intent_stage(&metric.keyword),
        };
        let concern = cluster
            .and_then(|c| c.concern.clone())
            .filter(|c| !c.is_empty())
            .or_else(|| (!default_concern.is_empty()).then(|| default_concern.to_string()));

        let row = KeywordRow {
            keyword: metric.keyword.clone(),
            search_volume: Some(metric.search_volume),
            cpc: Some(metric.cpc),
            competition: Some(metric.competition),
            intent_stage,
            source_type: infer_source_type(&metric.keyword, &self.brand_terms),
            competitor: find_competitor(&metric.keyword, &self.competitor_brands)
                .map(str::to_string),
            cluster: cluster.map(|c| c.name.clone()).unwrap_or_default(),
            concern,
        };
        trace!(keyword = %row.keyword, cluster = %row.cluster, stage = %row.intent_stage, "Classified keyword");
        row
    }
}
