//! Keyword enrichment: seeds → provider ideas and metrics → classified,
//! filtered, ranked and capped export rows.
//!
//! Provider failures never abort a run. They are reported through the
//! run's [`RunStatus`], and the later stages simply see no metrics.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use keyplan_cluster::{limit_clusters, KeywordClassifier};
use keyplan_core::{
    defaults, location_code, Cluster, Error, KeywordDataProvider, KeywordMetric, KeywordRow,
    RunInput, RunStatus, StatusKind,
};

use crate::generation::dedupe_by_id;
use crate::seeds::limited_seeds;

const MSG_NO_ITEMS: &str = "Provider returned zero items. Metrics will be blank.";
const MSG_NO_METRICS: &str =
    "Provider returned keywords but no metrics. Check the metrics endpoint.";
const MSG_BELOW_VOLUME: &str =
    "All keyword metrics were below volume 10. Disable the filter to include them.";
const MSG_FILTERED: &str = "All rows were filtered by cluster limits or exclusions.";

/// Record a provider failure on the run. Local failures (credentials,
/// scheduler) are logged louder than upstream ones.
fn degrade(status: &mut RunStatus, stage: &'static str, e: &Error) {
    if e.is_upstream() {
        warn!(stage, error = %e, "Provider call failed, run degraded");
    } else {
        error!(stage, error = %e, "Provider unusable, run degraded");
    }
    *status = RunStatus::error(e.to_string());
}

/// Keep only clusters whose id is selected. An empty selection keeps all.
pub fn select_clusters(clusters: &[Cluster], selected_ids: &[String]) -> Vec<Cluster> {
    let selected = clusters
        .iter()
        .filter(|c| selected_ids.is_empty() || selected_ids.contains(&c.id))
        .cloned()
        .collect();
    dedupe_by_id(selected)
}

/// Whether `keyword` contains none of the exclusion terms (case-insensitive).
pub fn passes_exclusions(keyword: &str, exclusions: &[String]) -> bool {
    let value = keyword.to_lowercase();
    !exclusions
        .iter()
        .filter(|term| !term.is_empty())
        .any(|term| value.contains(&term.to_lowercase()))
}

/// Sort rows by search volume, highest first. Equal volumes keep their order.
pub fn rank_rows(rows: &mut [KeywordRow]) {
    rows.sort_by(|a, b| b.volume().total_cmp(&a.volume()));
}

/// Keep at most `max_per_cluster` rows per cluster, walking `rows` in order.
///
/// A cap of 0 keeps everything. Once a cluster is saturated its later rows
/// are dropped; earlier rows are never displaced.
pub fn cap_rows_per_cluster(rows: Vec<KeywordRow>, max_per_cluster: usize) -> Vec<KeywordRow> {
    if max_per_cluster == 0 {
        return rows;
    }
    let mut counts: HashMap<String, usize> = HashMap::new();
    rows.into_iter()
        .filter(|row| {
            let count = counts.entry(row.cluster_key().to_string()).or_insert(0);
            if *count >= max_per_cluster {
                return false;
            }
            *count += 1;
            true
        })
        .collect()
}

/// Output of one keyword run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Clusters after selection and limiting.
    pub clusters: Vec<Cluster>,
    /// Seeds sent to the provider.
    pub seeds: Vec<String>,
    pub rows: Vec<KeywordRow>,
    pub status: RunStatus,
}

/// Runs keyword enrichment against a metrics provider.
///
/// The provider is usually shared across concurrent runs; its own scheduler
/// serializes the outbound calls.
pub struct KeywordPipeline {
    provider: Arc<dyn KeywordDataProvider>,
}

impl KeywordPipeline {
    pub fn new(provider: Arc<dyn KeywordDataProvider>) -> Self {
        Self { provider }
    }

    /// Fetch ideas for the seeds, then metrics for the ideas (or the seeds
    /// when there are no ideas).
    async fn fetch_metrics(
        &self,
        seeds: &[String],
        location: u32,
        status: &mut RunStatus,
    ) -> Vec<KeywordMetric> {
        let ideas = match self.provider.keyword_ideas(seeds, location).await {
            Ok(ideas) => ideas,
            Err(e) => {
                degrade(status, "ideas", &e);
                return Vec::new();
            }
        };
        debug!(item_count = ideas.len(), "Keyword ideas received");

        let metric_seeds = if ideas.is_empty() { seeds } else { ideas.as_slice() };
        let metrics = match self.provider.search_volume(metric_seeds, location).await {
            Ok(metrics) => metrics,
            Err(e) => {
                degrade(status, "metrics", &e);
                return Vec::new();
            }
        };

        if metrics.is_empty() {
            *status = RunStatus::empty(if ideas.is_empty() { MSG_NO_ITEMS } else { MSG_NO_METRICS });
        }
        metrics
    }

    /// Run enrichment for the selected clusters.
    ///
    /// `clusters` is the full candidate list; `selected_ids` narrows it
    /// (empty means all) before the run's cluster limit is applied.
    pub async fn run(
        &self,
        input: &RunInput,
        clusters: &[Cluster],
        selected_ids: &[String],
    ) -> KeywordRun {
        let run_id = Uuid::now_v7();
        let span = info_span!(
            "keyword_run",
            subsystem = "pipeline",
            component = "enrichment",
            run_id = %run_id
        );
        self.run_inner(run_id, input, clusters, selected_ids)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        input: &RunInput,
        clusters: &[Cluster],
        selected_ids: &[String],
    ) -> KeywordRun {
        let started_at = Utc::now();
        let start = Instant::now();

        let selected = select_clusters(clusters, selected_ids);
        let clusters = limit_clusters(&selected, input.max_clusters, input.cluster_limit_mode);
        let seeds = limited_seeds(&clusters, input);
        let location = location_code(&input.country);
        info!(
            cluster_count = clusters.len(),
            seed_count = seeds.len(),
            location_code = location,
            "Keyword run started"
        );

        let mut status = RunStatus::ok();
        let metrics = self.fetch_metrics(&seeds, location, &mut status).await;

        let metrics: Vec<KeywordMetric> = if input.min_volume_enabled {
            let kept: Vec<KeywordMetric> = metrics
                .iter()
                .filter(|m| m.search_volume >= defaults::MIN_SEARCH_VOLUME)
                .cloned()
                .collect();
            if !metrics.is_empty() && kept.is_empty() {
                status = RunStatus::empty(MSG_BELOW_VOLUME);
            }
            kept
        } else {
            metrics
        };

        let classifier = KeywordClassifier::from_input(input);
        let mut rows: Vec<KeywordRow> = metrics
            .iter()
            .filter(|m| passes_exclusions(&m.keyword, &input.constraints))
            .map(|m| classifier.classify(m, &clusters, input.industry.trim()))
            .collect();

        rank_rows(&mut rows);
        let rows = cap_rows_per_cluster(rows, input.max_rows_per_cluster);

        if rows.is_empty() && status.status == StatusKind::Ok {
            status = RunStatus::empty(MSG_FILTERED);
        }

        info!(
            item_count = rows.len(),
            status = ?status.status,
            duration_ms = start.elapsed().as_millis() as u64,
            "Keyword run complete"
        );

        KeywordRun {
            run_id,
            started_at,
            clusters,
            seeds,
            rows,
            status,
        }
    }
}
