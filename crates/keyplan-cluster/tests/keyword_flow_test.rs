//! Tests for the pure keyword flow: select clusters, classify metrics,
//! summarize totals, and build a taxonomy from the same keywords.

use keyplan_cluster::{
    build_taxonomy, cluster_totals, limit_clusters, Cluster, ClusterLimitMode, IntentStage,
    KeywordClassifier, KeywordMetric, RunInput, SourceType,
};

fn candidate_clusters() -> Vec<Cluster> {
    vec![
        Cluster::new("lash serum", IntentStage::Decision, 90.0).with_concern("Short lashes"),
        Cluster::new("lash growth", IntentStage::Awareness, 80.0),
        Cluster::new("brow gel", IntentStage::Consideration, 70.0),
        Cluster::new("lash glue", IntentStage::Awareness, 20.0),
        Cluster::new("mascara", IntentStage::Consideration, 10.0),
    ]
}

#[test]
fn test_selected_clusters_drive_classification_and_totals() {
    let clusters = limit_clusters(&candidate_clusters(), 3, ClusterLimitMode::Top);
    let names: Vec<&str> = clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["lash serum", "lash growth", "brow gel"]);

    let mut input = RunInput::new("https://revitalash.co.uk");
    input.competitors = vec!["https://rapidlash.co.uk".to_string()];
    input.industry = "Beauty".to_string();
    let classifier = KeywordClassifier::from_input(&input);

    let metrics = vec![
        KeywordMetric::new("revitalash lash serum", 500.0),
        KeywordMetric::new("rapidlash vs revitalash", 120.0),
        KeywordMetric::new("how to boost lash growth", 300.0),
        KeywordMetric::new("clear brow gel", 80.0),
    ];
    let rows: Vec<_> = metrics
        .iter()
        .map(|m| classifier.classify(m, &clusters, &input.industry))
        .collect();

    assert_eq!(rows[0].cluster, "lash serum");
    assert_eq!(rows[0].intent_stage, IntentStage::Decision);
    assert_eq!(rows[0].source_type, SourceType::Brand);
    assert_eq!(rows[0].concern.as_deref(), Some("Short lashes"));
    assert_eq!(rows[1].competitor.as_deref(), Some("rapidlash"));
    assert_eq!(rows[2].cluster, "lash growth");
    assert_eq!(rows[3].concern.as_deref(), Some("Beauty"));

    let totals = cluster_totals(&clusters, &rows);
    let summary: Vec<(&str, i64)> = totals
        .iter()
        .map(|t| (t.cluster.as_str(), t.total_search_volume))
        .collect();
    // Unmatched keywords fall back to the first selected cluster.
    assert_eq!(
        summary,
        vec![("lash growth", 300), ("brow gel", 80), ("lash serum", 620)]
    );
}

#[test]
fn test_taxonomy_covers_every_row_keyword() {
    let keywords = [
        "revitalash lash serum",
        "rapidlash vs revitalash",
        "how to boost lash growth",
        "clear brow gel",
    ];
    let build = build_taxonomy(&keywords);
    assert_eq!(build.assignments.len(), keywords.len());

    let flat = build.taxonomy.flatten();
    assert_eq!(
        flat.len(),
        build.taxonomy.l1.len() + build.taxonomy.l2.len() + build.taxonomy.l3.len()
    );
    assert_eq!(flat[0].level, "L1");
    assert_eq!(flat.last().unwrap().level, "L3");
}

#[test]
fn test_totals_from_clusters_without_ids() {
    let clusters: Vec<Cluster> =
        serde_json::from_value(serde_json::json!([{"name": "A", "intentStage": "awareness"}]))
            .unwrap();
    assert_eq!(clusters[0].id, "a");

    let rows: Vec<keyplan_cluster::KeywordRow> = serde_json::from_value(serde_json::json!([
        {"Cluster": "A", "Search Volume": 10},
        {"Cluster": "A", "Search Volume": "20"},
        {"Cluster": "", "Search Volume": 5}
    ]))
    .unwrap();

    let totals = cluster_totals(&clusters, &rows);
    assert_eq!(
        serde_json::to_value(&totals[0]).unwrap(),
        serde_json::json!({"Cluster": "A", "Intent Stage": "awareness", "Total Search Volume": 30})
    );
    assert_eq!(totals[1].cluster, "General");
    assert_eq!(totals[1].total_search_volume, 5);
}
