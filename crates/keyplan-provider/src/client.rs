//! DataForSEO keywords-data client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use keyplan_core::{
    defaults, sanitize_keyword_list, Error, KeywordDataProvider, KeywordMetric, Result,
    StatusKind,
};

use crate::ideas::{chunk, group_ideas_by_seed, SeedIdeas};
use crate::scheduler::{Attempt, RequestScheduler};
use crate::types::{KeywordTask, ProviderResponse, ProviderTask};

const IDEAS_ENDPOINT: &str = "keywords_data/google_ads/keywords_for_keywords/live";
const SEARCH_VOLUME_ENDPOINT: &str = "keywords_data/google_ads/search_volume/live";

const MISSING_CREDENTIALS: &str = "Missing DataForSEO credentials.";

/// Configuration for the DataForSEO client.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base URL including the API version segment.
    pub base_url: String,
    pub login: Option<String>,
    pub password: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum number of 100-keyword metrics calls per request.
    pub metrics_batch_limit: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::PROVIDER_URL.to_string(),
            login: None,
            password: None,
            timeout_seconds: defaults::PROVIDER_TIMEOUT_SECS,
            metrics_batch_limit: defaults::METRICS_BATCH_LIMIT,
        }
    }
}

impl ProviderConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATAFORSEO_LOGIN` | unset | API login |
    /// | `DATAFORSEO_PASSWORD` | unset | API password |
    /// | `DATAFORSEO_BASE_URL` | `https://api.dataforseo.com/v3` | API base URL |
    /// | `DATAFORSEO_TIMEOUT` | `60` | Request timeout in seconds |
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            base_url: non_empty("DATAFORSEO_BASE_URL")
                .unwrap_or_else(|| defaults::PROVIDER_URL.to_string()),
            login: non_empty("DATAFORSEO_LOGIN"),
            password: non_empty("DATAFORSEO_PASSWORD"),
            timeout_seconds: std::env::var("DATAFORSEO_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::PROVIDER_TIMEOUT_SECS),
            metrics_batch_limit: defaults::METRICS_BATCH_LIMIT,
        }
    }

    pub fn with_credentials(mut self, login: impl Into<String>, password: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self.password = Some(password.into());
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.login.is_some() && self.password.is_some()
    }
}

/// Outcome of a provider self-test.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCheck {
    pub status: StatusKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
    pub items_count: usize,
}

impl ProviderCheck {
    fn error(message: impl Into<String>, status_code: Option<i64>, items_count: usize) -> Self {
        Self {
            status: StatusKind::Error,
            message: message.into(),
            status_code,
            items_count,
        }
    }
}

/// Rate-limited DataForSEO client.
///
/// Every call goes through the shared [`RequestScheduler`].
#[derive(Clone)]
pub struct DataForSeoClient {
    client: Client,
    config: ProviderConfig,
    scheduler: RequestScheduler,
}

impl DataForSeoClient {
    /// Create a new client with the given configuration.
    pub fn new(config: ProviderConfig, scheduler: RequestScheduler) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "provider",
            base_url = %config.base_url,
            credentials = config.has_credentials(),
            "Initializing DataForSEO client"
        );

        Ok(Self {
            client,
            config,
            scheduler,
        })
    }

    /// Create from environment variables.
    pub fn from_env(scheduler: RequestScheduler) -> Result<Self> {
        Self::new(ProviderConfig::from_env(), scheduler)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn authorization(&self) -> Result<String> {
        match (&self.config.login, &self.config.password) {
            (Some(login), Some(password)) => Ok(format!(
                "Basic {}",
                BASE64.encode(format!("{}:{}", login, password))
            )),
            _ => Err(Error::Config(MISSING_CREDENTIALS.to_string())),
        }
    }

    /// POST one task through the scheduler and return the first response task.
    ///
    /// Credentials are checked before anything is queued. Queued responses are
    /// retried by the scheduler; a non-2xx reply is a provider error.
    async fn post_task(
        &self,
        op: &'static str,
        endpoint: &str,
        task: KeywordTask,
    ) -> Result<Option<ProviderTask>> {
        let authorization = self.authorization()?;
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let client = self.client.clone();
        let body = vec![task];

        self.scheduler
            .schedule(op, move || {
                let request = client
                    .post(&url)
                    .header("Authorization", &authorization)
                    .header("Content-Type", "application/json")
                    .json(&body);
                async move {
                    let start = Instant::now();
                    let response = request.send().await?;
                    let status = response.status();
                    if !status.is_success() {
                        let text = response.text().await.unwrap_or_default();
                        return Err(Error::Provider(format!(
                            "DataForSEO error: {} {}",
                            status, text
                        )));
                    }

                    let parsed: ProviderResponse = response.json().await.map_err(|e| {
                        Error::Provider(format!("Failed to parse response: {}", e))
                    })?;
                    let task = parsed.into_first_task();
                    debug!(
                        op,
                        status_code = ?task.as_ref().and_then(|t| t.status_code),
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Provider call complete"
                    );

                    match task {
                        Some(task) if task.is_queued() => Ok(Attempt::Queued),
                        other => Ok(Attempt::Ready(other)),
                    }
                }
            })
            .await
    }

    /// Post a task and reject non-success task status codes.
    async fn fetch_task(
        &self,
        op: &'static str,
        endpoint: &str,
        task: KeywordTask,
    ) -> Result<ProviderTask> {
        let task = self.post_task(op, endpoint, task).await?.unwrap_or_default();
        if task.is_failure() {
            return Err(Error::Provider(format!("task error: {}", task.message())));
        }
        Ok(task)
    }

    fn idea_seeds(seeds: &[String]) -> Vec<String> {
        let mut seeds = sanitize_keyword_list(seeds);
        seeds.truncate(defaults::MAX_IDEA_SEEDS);
        seeds
    }

    /// Keyword ideas grouped by the seed that produced them.
    #[instrument(skip(self, seeds), fields(subsystem = "provider", seed_count = seeds.len()))]
    pub async fn keyword_ideas_by_seed(
        &self,
        seeds: &[String],
        location_code: u32,
    ) -> Result<Vec<SeedIdeas>> {
        let seeds = Self::idea_seeds(seeds);
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        let task = self
            .fetch_task(
                "keyword_ideas",
                IDEAS_ENDPOINT,
                KeywordTask::new(seeds.clone(), location_code),
            )
            .await?;
        Ok(group_ideas_by_seed(task.raw_result(), &seeds))
    }

    /// Issue one search-volume call for a fixed sample keyword and report
    /// whether the provider returns metrics.
    #[instrument(skip(self), fields(subsystem = "provider", op = "check"))]
    pub async fn check(&self, location_code: u32) -> ProviderCheck {
        if !self.config.has_credentials() {
            return ProviderCheck::error(MISSING_CREDENTIALS, None, 0);
        }

        let task = KeywordTask::new(vec![defaults::PROBE_KEYWORD.to_string()], location_code);
        let task = match self.post_task("check", SEARCH_VOLUME_ENDPOINT, task).await {
            Ok(Some(task)) => task,
            Ok(None) => return ProviderCheck::error("DataForSEO response missing task", None, 0),
            Err(e) => {
                warn!(error = %e, "Provider check failed");
                return ProviderCheck::error(e.to_string(), None, 0);
            }
        };

        let items_count = task.items().len();
        let result = if task.is_failure() {
            let message = if task.message().is_empty() {
                "DataForSEO task error."
            } else {
                task.message()
            };
            ProviderCheck::error(message, task.status_code, items_count)
        } else if items_count == 0 {
            ProviderCheck {
                status: StatusKind::Empty,
                message: "DataForSEO returned zero items. Metrics will be blank.".to_string(),
                status_code: task.status_code,
                items_count,
            }
        } else {
            ProviderCheck {
                status: StatusKind::Ok,
                message: "DataForSEO returned keyword metrics.".to_string(),
                status_code: task.status_code,
                items_count,
            }
        };
        info!(status = ?result.status, status_code = ?result.status_code, item_count = items_count, "Provider check complete");
        result
    }
}

#[async_trait]
impl KeywordDataProvider for DataForSeoClient {
    #[instrument(skip(self, seeds), fields(subsystem = "provider", op = "keyword_ideas", seed_count = seeds.len()))]
    async fn keyword_ideas(&self, seeds: &[String], location_code: u32) -> Result<Vec<String>> {
        let seeds = Self::idea_seeds(seeds);
        if seeds.is_empty() {
            return Ok(Vec::new());
        }
        let task = self
            .fetch_task(
                "keyword_ideas",
                IDEAS_ENDPOINT,
                KeywordTask::new(seeds, location_code),
            )
            .await?;

        let ideas = sanitize_keyword_list(
            task.items()
                .iter()
                .filter_map(|item| item.keyword().map(str::to_string)),
        );
        debug!(item_count = ideas.len(), "Keyword ideas received");
        Ok(ideas)
    }

    #[instrument(skip(self, keywords), fields(subsystem = "provider", op = "search_volume", keyword_count = keywords.len()))]
    async fn search_volume(
        &self,
        keywords: &[String],
        location_code: u32,
    ) -> Result<Vec<KeywordMetric>> {
        let keywords = sanitize_keyword_list(keywords);
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let mut metrics = Vec::new();
        let batches = chunk(&keywords, defaults::MAX_METRICS_KEYWORDS);
        for batch in batches.into_iter().take(self.config.metrics_batch_limit.max(1)) {
            let task = self
                .fetch_task(
                    "search_volume",
                    SEARCH_VOLUME_ENDPOINT,
                    KeywordTask::new(batch, location_code).sorted_by(defaults::SEARCH_VOLUME_SORT),
                )
                .await?;
            metrics.extend(task.items().iter().filter_map(|item| item.to_metric()));
        }
        debug!(item_count = metrics.len(), "Search volume metrics received");
        Ok(metrics)
    }
}
