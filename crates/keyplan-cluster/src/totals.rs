//! Per-cluster search volume totals.

use std::collections::HashMap;

use keyplan_core::{Cluster, ClusterTotal, IntentStage, KeywordRow};

struct Entry {
    stage: IntentStage,
    total: f64,
}

/// Sum row volumes per cluster.
///
/// Every named cluster appears even with no rows. Rows with a blank cluster
/// count toward `General`, and clusters missing from `clusters` take the
/// first known intent stage seen on their rows. Output is ordered by intent
/// stage, then total descending, then name.
pub fn cluster_totals(clusters: &[Cluster], rows: &[KeywordRow]) -> Vec<ClusterTotal> {
    let mut listed: HashMap<&str, IntentStage> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut entries: HashMap<String, Entry> = HashMap::new();

    for cluster in clusters {
        let name = cluster.name.trim();
        if name.is_empty() {
            continue;
        }
        listed.insert(name, cluster.intent_stage);
        if !entries.contains_key(name) {
            order.push(name.to_string());
        }
        entries.insert(
            name.to_string(),
            Entry {
                stage: cluster.intent_stage,
                total: 0.0,
            },
        );
    }

    for row in rows {
        let name = row.cluster_key();
        if !entries.contains_key(name) {
            order.push(name.to_string());
            entries.insert(
                name.to_string(),
                Entry {
                    stage: IntentStage::Unknown,
                    total: 0.0,
                },
            );
        }
        let Some(entry) = entries.get_mut(name) else {
            continue;
        };
        if !entry.stage.is_known() && !listed.contains_key(name) {
            entry.stage = row.intent_stage;
        }
        entry.total += row.volume();
    }

    let mut totals: Vec<ClusterTotal> = order
        .into_iter()
        .filter_map(|name| {
            let entry = entries.remove(&name)?;
            Some(ClusterTotal {
                cluster: name,
                intent_stage: entry.stage,
                total_search_volume: entry.total.round() as i64,
            })
        })
        .collect();

    totals.sort_by(|a, b| {
        a.intent_stage
            .cmp(&b.intent_stage)
            .then_with(|| b.total_search_volume.cmp(&a.total_search_volume))
            .then_with(|| a.cluster.cmp(&b.cluster))
    });
    totals
}
