//! End-to-end tests for keyword and taxonomy runs with in-memory collaborators.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyplan_core::{
    Cluster, Error, GenerationBackend, IntentStage, KeywordDataProvider, KeywordMetric, Result,
    RunInput, SourceType, StatusKind,
};
use keyplan_pipeline::{KeywordPipeline, TaxonomyRun};

#[derive(Debug, Clone, PartialEq)]
struct Call {
    op: &'static str,
    keywords: Vec<String>,
    location_code: u32,
}

#[derive(Default)]
struct FakeProvider {
    ideas: Vec<String>,
    ideas_error: Option<String>,
    metrics: Vec<KeywordMetric>,
    metrics_error: Option<String>,
    calls: Mutex<Vec<Call>>,
}

impl FakeProvider {
    fn record(&self, op: &'static str, keywords: &[String], location_code: u32) {
        self.calls.lock().unwrap().push(Call {
            op,
            keywords: keywords.to_vec(),
            location_code,
        });
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeywordDataProvider for FakeProvider {
    async fn keyword_ideas(&self, seeds: &[String], location_code: u32) -> Result<Vec<String>> {
        self.record("ideas", seeds, location_code);
        match &self.ideas_error {
            Some(msg) => Err(Error::Provider(msg.clone())),
            None => Ok(self.ideas.clone()),
        }
    }

    async fn search_volume(
        &self,
        keywords: &[String],
        location_code: u32,
    ) -> Result<Vec<KeywordMetric>> {
        self.record("metrics", keywords, location_code);
        match &self.metrics_error {
            Some(msg) => Err(Error::Provider(msg.clone())),
            None => Ok(self.metrics.clone()),
        }
    }
}

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

fn run_input() -> RunInput {
    let mut input = RunInput::new("https://revitalash.co.uk/lash-growth-serum");
    input.competitors = vec!["https://rapidlash.com".to_string()];
    input.industry = "Beauty".to_string();
    input.constraints = vec!["diy".to_string()];
    input.country = "US".to_string();
    input.max_rows_per_cluster = 3;
    input
}

fn clusters() -> Vec<Cluster> {
    vec![
        Cluster::new("Lash serum", IntentStage::Decision, 90.0),
        Cluster::new("Brow gel", IntentStage::Unknown, 70.0),
        Cluster::new("Lash growth", IntentStage::Awareness, 50.0),
    ]
}

fn metrics() -> Vec<KeywordMetric> {
    vec![
        KeywordMetric::new("how to grow lashes", 100.0),
        KeywordMetric::new("brow gel price", 400.0),
        KeywordMetric::new("rapidlash lash serum", 3000.0),
        KeywordMetric::new("eyelash tips", 5.0),
        KeywordMetric::new("diy lash growth", 900.0),
        KeywordMetric::new("lash serum", 5000.0),
        KeywordMetric::new("best lash serum", 2000.0),
    ]
}

#[tokio::test]
async fn test_keyword_run_enriches_filters_and_caps() {
    let provider = Arc::new(FakeProvider {
        ideas: vec!["lash serum".to_string(), "brow gel price".to_string()],
        metrics: metrics(),
        ..Default::default()
    });
    let pipeline = KeywordPipeline::new(provider.clone());

    let run = pipeline.run(&run_input(), &clusters(), &[]).await;

    assert_eq!(run.status.status, StatusKind::Ok);
    let keywords: Vec<_> = run.rows.iter().map(|r| r.keyword.as_str()).collect();
    assert_eq!(
        keywords,
        vec!["lash serum", "rapidlash lash serum", "best lash serum", "brow gel price"]
    );

    let branded = &run.rows[1];
    assert_eq!(branded.cluster, "Lash serum");
    assert_eq!(branded.intent_stage, IntentStage::Decision);
    assert_eq!(branded.source_type, SourceType::Brand);
    assert_eq!(branded.competitor.as_deref(), Some("rapidlash"));
    assert_eq!(branded.concern.as_deref(), Some("Beauty"));

    let brow = &run.rows[3];
    assert_eq!(brow.cluster, "Brow gel");
    assert_eq!(brow.intent_stage, IntentStage::Decision);
    assert_eq!(brow.source_type, SourceType::Generic);
    assert_eq!(brow.competitor, None);

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].op, "ideas");
    assert_eq!(calls[0].location_code, 2840);
    assert_eq!(calls[0].keywords, run.seeds);
    assert_eq!(&run.seeds[..2], &["Lash serum", "Lash serum Beauty"]);
    assert_eq!(calls[1].op, "metrics");
    assert_eq!(calls[1].keywords, vec!["lash serum", "brow gel price"]);
}

#[tokio::test]
async fn test_keyword_run_uses_seeds_when_no_ideas() {
    let provider = Arc::new(FakeProvider {
        metrics: vec![KeywordMetric::new("lash serum", 50.0)],
        ..Default::default()
    });
    let pipeline = KeywordPipeline::new(provider.clone());

    let run = pipeline.run(&run_input(), &clusters(), &[]).await;

    let calls = provider.calls();
    assert_eq!(calls[1].keywords, run.seeds);
    assert_eq!(run.rows.len(), 1);
    assert_eq!(run.status.status, StatusKind::Ok);
}

#[tokio::test]
async fn test_keyword_run_provider_failure_is_error_status() {
    let provider = Arc::new(FakeProvider {
        ideas_error: Some("task error: You are not authorized.".to_string()),
        ..Default::default()
    });
    let pipeline = KeywordPipeline::new(provider.clone());

    let run = pipeline.run(&run_input(), &clusters(), &[]).await;

    assert_eq!(run.status.status, StatusKind::Error);
    assert!(run.status.message.contains("You are not authorized."));
    assert!(run.rows.is_empty());
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn test_keyword_run_metrics_failure_is_error_status() {
    let provider = Arc::new(FakeProvider {
        ideas: vec!["lash serum".to_string()],
        metrics_error: Some("DataForSEO error: 500 Internal Server Error".to_string()),
        ..Default::default()
    });

    let run = KeywordPipeline::new(provider)
        .run(&run_input(), &clusters(), &[])
        .await;

    assert!(run.status.is_error());
    assert!(run.rows.is_empty());
}

#[tokio::test]
async fn test_keyword_run_empty_messages_name_the_stage() {
    let nothing = Arc::new(FakeProvider::default());
    let run = KeywordPipeline::new(nothing)
        .run(&run_input(), &clusters(), &[])
        .await;
    assert_eq!(run.status.status, StatusKind::Empty);
    assert_eq!(
        run.status.message,
        "Provider returned zero items. Metrics will be blank."
    );

    let ideas_only = Arc::new(FakeProvider {
        ideas: vec!["lash serum".to_string()],
        ..Default::default()
    });
    let run = KeywordPipeline::new(ideas_only)
        .run(&run_input(), &clusters(), &[])
        .await;
    assert!(run.status.message.contains("no metrics"));

    let quiet = Arc::new(FakeProvider {
        metrics: vec![KeywordMetric::new("lash serum", 9.0)],
        ..Default::default()
    });
    let run = KeywordPipeline::new(quiet)
        .run(&run_input(), &clusters(), &[])
        .await;
    assert_eq!(run.status.status, StatusKind::Empty);
    assert!(run.status.message.contains("below volume 10"));

    let excluded = Arc::new(FakeProvider {
        metrics: vec![KeywordMetric::new("diy lash serum", 900.0)],
        ..Default::default()
    });
    let run = KeywordPipeline::new(excluded)
        .run(&run_input(), &clusters(), &[])
        .await;
    assert_eq!(run.status.status, StatusKind::Empty);
    assert_eq!(
        run.status.message,
        "All rows were filtered by cluster limits or exclusions."
    );
}

#[tokio::test]
async fn test_keyword_run_min_volume_toggle() {
    let provider = Arc::new(FakeProvider {
        metrics: vec![KeywordMetric::new("lash serum", 9.0)],
        ..Default::default()
    });
    let mut input = run_input();
    input.min_volume_enabled = false;

    let run = KeywordPipeline::new(provider).run(&input, &clusters(), &[]).await;

    assert_eq!(run.status.status, StatusKind::Ok);
    assert_eq!(run.rows.len(), 1);
}

#[tokio::test]
async fn test_keyword_run_selection_and_limit() {
    let provider = Arc::new(FakeProvider {
        metrics: vec![KeywordMetric::new("brow gel price", 400.0)],
        ..Default::default()
    });
    let mut input = run_input();
    input.max_clusters = 1;
    let selected = vec!["brow-gel".to_string(), "lash-growth".to_string()];

    let run = KeywordPipeline::new(provider)
        .run(&input, &clusters(), &selected)
        .await;

    assert_eq!(run.clusters.len(), 1);
    assert_eq!(run.clusters[0].name, "Brow gel");
    assert_eq!(run.seeds[0], "Brow gel");
    assert_eq!(run.rows[0].cluster, "Brow gel");
}

#[tokio::test]
async fn test_taxonomy_run_merges_model_and_provider_keywords() {
    let backend = Arc::new(CannedBackend(
        r#"{"expandedKeywords": ["lash serum uk", "brow gel"], "suggestedQueries": ["does lash serum work"]}"#,
    ));
    let provider = Arc::new(FakeProvider {
        ideas: vec!["lash serum boots".to_string()],
        ..Default::default()
    });
    let run = TaxonomyRun::new(backend, provider.clone());

    let report = run.run(&run_input()).await;

    assert_eq!(
        report.expansion.expanded_keywords,
        vec!["lash serum uk", "brow gel", "lash serum boots"]
    );
    assert_eq!(report.expansion.suggested_queries, vec!["does lash serum work"]);
    assert_eq!(report.build.assignments.len(), 3);
    assert_eq!(report.build.assignments[0].cluster_id, "l3-lash-serum-lash-serum");
    assert_eq!(report.build.taxonomy.l1.len(), 2);

    let calls = provider.calls();
    assert_eq!(calls[0].keywords, report.expansion.seed_families);
    assert_eq!(calls[0].location_code, 2840);
}

#[tokio::test]
async fn test_taxonomy_run_survives_unusable_collaborators() {
    let backend = Arc::new(CannedBackend("no json here"));
    let provider = Arc::new(FakeProvider {
        ideas_error: Some("boom".to_string()),
        ..Default::default()
    });

    let report = TaxonomyRun::new(backend, provider).run(&run_input()).await;

    assert!(report.expansion.expanded_keywords.is_empty());
    assert!(report.build.assignments.is_empty());
}
