//! Data model shared across keyplan crates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::text::slugify;

// =============================================================================
// INTENT AND SOURCE
// =============================================================================

/// Buyer-readiness stage implied by a keyword or cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum IntentStage {
    Awareness,
    Consideration,
    Decision,
    #[default]
    Unknown,
}

impl IntentStage {
    /// Parse leniently: case-insensitive, `conversion` is an alias of
    /// `decision`, anything unrecognized is `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "awareness" => Self::Awareness,
            "consideration" => Self::Consideration,
            "decision" | "conversion" => Self::Decision,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Awareness => "awareness",
            Self::Consideration => "consideration",
            Self::Decision => "decision",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl From<Option<String>> for IntentStage {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Self::parse).unwrap_or_default()
    }
}

impl fmt::Display for IntentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a keyword names one of the tracked brands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Brand,
    #[default]
    Generic,
}

// =============================================================================
// CLUSTERS
// =============================================================================

/// A named topical grouping of keywords.
///
/// A missing or blank `id` is filled with the slug of `name` on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCluster")]
pub struct Cluster {
    /// URL-safe slug derived from `name`.
    pub id: String,
    pub name: String,
    pub intent_stage: IntentStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concern: Option<String>,
    /// Ranking score, 0-100. Missing scores read as 0.
    pub score: f64,
}

/// Wire shape of a cluster before its id is settled.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCluster {
    #[serde(default)]
    id: String,
    name: String,
    #[serde(default)]
    intent_stage: IntentStage,
    #[serde(default)]
    concern: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    score: f64,
}

impl From<RawCluster> for Cluster {
    fn from(raw: RawCluster) -> Self {
        let id = match raw.id.trim() {
            "" => slugify(&raw.name),
            id => id.to_string(),
        };
        Self {
            id,
            name: raw.name,
            intent_stage: raw.intent_stage,
            concern: raw.concern,
            score: raw.score,
        }
    }
}

impl Cluster {
    /// Create a cluster whose id is the slug of its name.
    pub fn new(name: impl Into<String>, intent_stage: IntentStage, score: f64) -> Self {
        let name = name.into();
        Self {
            id: slugify(&name),
            name,
            intent_stage,
            concern: None,
            score,
        }
    }

    pub fn with_concern(mut self, concern: impl Into<String>) -> Self {
        let concern = concern.into();
        self.concern = (!concern.is_empty()).then_some(concern);
        self
    }
}

/// How a cluster list is reduced to a cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum ClusterLimitMode {
    /// Return the input unchanged.
    None,
    /// Highest scores first.
    #[default]
    Top,
    /// Proportional allocation across intent stages.
    Banded,
}

impl ClusterLimitMode {
    /// Parse leniently; unrecognized modes behave as `Top`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "none" => Self::None,
            "banded" => Self::Banded,
            _ => Self::Top,
        }
    }
}

impl From<Option<String>> for ClusterLimitMode {
    fn from(value: Option<String>) -> Self {
        value.as_deref().map(Self::parse).unwrap_or_default()
    }
}

// =============================================================================
// KEYWORDS
// =============================================================================

/// Volume and cost metrics for one keyword as reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMetric {
    pub keyword: String,
    pub search_volume: f64,
    pub cpc: f64,
    pub competition: f64,
    #[serde(default)]
    pub competition_level: String,
}

impl KeywordMetric {
    pub fn new(keyword: impl Into<String>, search_volume: f64) -> Self {
        Self {
            keyword: keyword.into(),
            search_volume,
            cpc: 0.0,
            competition: 0.0,
            competition_level: String::new(),
        }
    }
}

/// One enriched keyword in a run's export.
///
/// Field names follow the export columns so persisted rows read back as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KeywordRow {
    #[serde(rename = "Keyword", default)]
    pub keyword: String,
    #[serde(rename = "Search Volume", default, deserialize_with = "lenient::opt_number")]
    pub search_volume: Option<f64>,
    #[serde(rename = "CPC", default, deserialize_with = "lenient::opt_number")]
    pub cpc: Option<f64>,
    #[serde(rename = "Competition", default, deserialize_with = "lenient::opt_number")]
    pub competition: Option<f64>,
    #[serde(rename = "Intent Stage", default)]
    pub intent_stage: IntentStage,
    #[serde(rename = "Source Type (brand/generic)", default)]
    pub source_type: SourceType,
    #[serde(rename = "Competitor", default)]
    pub competitor: Option<String>,
    #[serde(rename = "Cluster", default)]
    pub cluster: String,
    #[serde(rename = "Concern", default)]
    pub concern: Option<String>,
}

impl KeywordRow {
    /// Volume used for ranking; missing volume ranks as 0.
    pub fn volume(&self) -> f64 {
        self.search_volume.unwrap_or(0.0)
    }

    /// Cluster name used for caps and totals; blank clusters fold into `General`.
    pub fn cluster_key(&self) -> &str {
        let name = self.cluster.trim();
        if name.is_empty() {
            defaults::GENERAL_CLUSTER
        } else {
            name
        }
    }
}

/// Per-cluster search volume summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTotal {
    #[serde(rename = "Cluster")]
    pub cluster: String,
    #[serde(rename = "Intent Stage")]
    pub intent_stage: IntentStage,
    #[serde(rename = "Total Search Volume")]
    pub total_search_volume: i64,
}

// =============================================================================
// TAXONOMY
// =============================================================================

/// One node of the three-level topic hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Topic (L1) → subtopic (L2) → leaf cluster (L3).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "L1")]
    pub l1: Vec<TaxonomyNode>,
    #[serde(rename = "L2")]
    pub l2: Vec<TaxonomyNode>,
    #[serde(rename = "L3")]
    pub l3: Vec<TaxonomyNode>,
}

/// Taxonomy node tagged with its level, for flat exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatTaxonomyNode<'a> {
    pub level: &'static str,
    #[serde(flatten)]
    pub node: &'a TaxonomyNode,
}

impl Taxonomy {
    /// All nodes tagged with their level, L1 first.
    pub fn flatten(&self) -> Vec<FlatTaxonomyNode<'_>> {
        [("L1", &self.l1), ("L2", &self.l2), ("L3", &self.l3)]
            .into_iter()
            .flat_map(|(level, nodes)| {
                nodes
                    .iter()
                    .map(move |node| FlatTaxonomyNode { level, node })
            })
            .collect()
    }
}

/// A keyword's placement on a leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub keyword: String,
    pub cluster_id: String,
    pub intent: String,
}

/// Output of a taxonomy build.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaxonomyBuild {
    pub taxonomy: Taxonomy,
    pub assignments: Vec<Assignment>,
}

// =============================================================================
// RUNS
// =============================================================================

/// Consolidated outcome of a provider-backed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Ok,
    Empty,
    Error,
}

/// Status signal reported to callers instead of an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: StatusKind,
    pub message: String,
}

impl RunStatus {
    pub fn ok() -> Self {
        Self {
            status: StatusKind::Ok,
            message: String::new(),
        }
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            status: StatusKind::Empty,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == StatusKind::Error
    }
}

/// Market framing used when prompting for clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Option<String>")]
pub enum MarketType {
    B2b,
    #[default]
    B2c,
}

impl From<Option<String>> for MarketType {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "b2b" => Self::B2b,
            _ => Self::B2c,
        }
    }
}

fn default_country() -> String {
    defaults::DEFAULT_COUNTRY.to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_clusters() -> usize {
    defaults::MAX_CLUSTERS
}

fn default_max_rows() -> usize {
    defaults::MAX_ROWS_PER_CLUSTER
}

/// User inputs for one project run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInput {
    pub target_url: String,
    #[serde(default)]
    pub competitors: Vec<String>,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub audience: String,
    /// Exclusion terms.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub constraints: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub initial_clusters: Vec<String>,
    #[serde(default)]
    pub market_type: MarketType,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_true")]
    pub min_volume_enabled: bool,
    #[serde(default)]
    pub cluster_limit_mode: ClusterLimitMode,
    #[serde(default = "default_max_clusters", deserialize_with = "lenient::count")]
    pub max_clusters: usize,
    #[serde(default = "default_max_rows", deserialize_with = "lenient::count")]
    pub max_rows_per_cluster: usize,
}

impl RunInput {
    /// Input for a target with every other field at its default.
    pub fn new(target_url: impl Into<String>) -> Self {
        Self {
            target_url: target_url.into(),
            competitors: Vec::new(),
            industry: String::new(),
            audience: String::new(),
            constraints: Vec::new(),
            initial_clusters: Vec::new(),
            market_type: MarketType::default(),
            country: default_country(),
            min_volume_enabled: true,
            cluster_limit_mode: ClusterLimitMode::default(),
            max_clusters: defaults::MAX_CLUSTERS,
            max_rows_per_cluster: defaults::MAX_ROWS_PER_CLUSTER,
        }
    }

    /// Target followed by competitors.
    pub fn all_urls(&self) -> Vec<&str> {
        std::iter::once(self.target_url.as_str())
            .chain(self.competitors.iter().map(String::as_str))
            .collect()
    }
}

/// Map a country code to the provider's location code.
///
/// Unrecognized countries use the UK location.
pub fn location_code(country: &str) -> u32 {
    match country.trim().to_uppercase().as_str() {
        "US" => defaults::LOCATION_US,
        _ => defaults::LOCATION_UK,
    }
}

/// Tolerant deserializers for values that arrive as numbers, numeric
/// strings, lists, or delimited strings.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::text::parse_list_input;

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|f| f.is_finite())
    }

    /// Number or numeric string; anything else is `None`.
    pub fn opt_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(value.as_ref().and_then(as_f64))
    }

    /// Number or numeric string; anything else is 0.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_number(d)?.unwrap_or(0.0))
    }

    /// Non-negative count; negatives and garbage clamp to 0.
    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<usize, D::Error> {
        Ok(opt_number(d)?.map(|f| f.max(0.0) as usize).unwrap_or(0))
    }

    /// A JSON list of strings, or one comma/newline separated string.
    pub fn string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::String(s)) => parse_list_input(&s),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        })
    }
}
