//! DataForSEO request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use keyplan_core::{defaults, KeywordMetric};

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// One task in a keywords-data request body. The body is a list of these.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordTask {
    pub location_code: u32,
    pub language_code: String,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
}

impl KeywordTask {
    pub fn new(keywords: Vec<String>, location_code: u32) -> Self {
        Self {
            location_code,
            language_code: defaults::LANGUAGE_CODE.to_string(),
            keywords,
            sort_by: None,
        }
    }

    pub fn sorted_by(mut self, sort_by: &str) -> Self {
        self.sort_by = Some(sort_by.to_string());
        self
    }
}

// =============================================================================
// RESPONSE TYPES
// =============================================================================

/// Top-level response envelope.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderResponse {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub tasks: Option<Vec<ProviderTask>>,
}

impl ProviderResponse {
    /// The first task, which is the only one keyplan ever submits.
    pub fn into_first_task(self) -> Option<ProviderTask> {
        self.tasks.and_then(|tasks| tasks.into_iter().next())
    }
}

/// Per-task result block.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderTask {
    #[serde(default)]
    pub status_code: Option<i64>,
    #[serde(default)]
    pub status_message: Option<String>,
    #[serde(default)]
    pub result: Option<Vec<Value>>,
}

impl ProviderTask {
    /// The provider accepted the task but has not processed it yet.
    pub fn is_queued(&self) -> bool {
        self.status_code == Some(defaults::STATUS_TASK_QUEUED)
    }

    /// A status code is present and is not the success code.
    pub fn is_failure(&self) -> bool {
        matches!(self.status_code, Some(code) if code != 0 && code != defaults::STATUS_OK)
    }

    pub fn message(&self) -> &str {
        self.status_message.as_deref().unwrap_or_default()
    }

    /// Raw result entries.
    pub fn raw_result(&self) -> &[Value] {
        self.result.as_deref().unwrap_or_default()
    }

    /// Result items: `result[0].items` when present, otherwise `result` itself.
    pub fn items(&self) -> Vec<ResultItem> {
        let raw = self.raw_result();
        let entries: &[Value] = match raw.first().and_then(|r| r.get("items")) {
            Some(Value::Array(items)) => items,
            _ => raw,
        };
        entries.iter().filter_map(ResultItem::from_value).collect()
    }
}

/// One keyword entry in a result list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub search_volume: Option<f64>,
    #[serde(default)]
    pub cpc: Option<f64>,
    #[serde(default)]
    pub competition_index: Option<f64>,
    /// Either a 0-1 number or a level label such as `"HIGH"`.
    #[serde(default)]
    pub competition: Option<Value>,
    #[serde(default)]
    pub competition_level: Option<String>,
}

impl ResultItem {
    fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// The keyword, if present and not blank.
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Convert to a metric. Items without a keyword yield `None`.
    pub fn to_metric(&self) -> Option<KeywordMetric> {
        let keyword = self.keyword()?;
        let competition = self
            .competition_index
            .or_else(|| self.competition.as_ref().and_then(Value::as_f64))
            .unwrap_or(0.0);
        let competition_level = self
            .competition_level
            .clone()
            .or_else(|| {
                self.competition
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_default();

        Some(KeywordMetric {
            keyword: keyword.to_string(),
            search_volume: self.search_volume.unwrap_or(0.0),
            cpc: self.cpc.unwrap_or(0.0),
            competition,
            competition_level,
        })
    }
}
