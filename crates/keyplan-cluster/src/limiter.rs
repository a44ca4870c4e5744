//! Bounded cluster selection.
//!
//! Two policies reduce a candidate list to a cap: `Top` takes the highest
//! scores, `Banded` first gives every intent stage an equal share of the cap
//! and then fills what is left from the best remaining clusters.

use std::cmp::Ordering;

use tracing::debug;

use keyplan_core::{Cluster, ClusterLimitMode, IntentStage};

fn score(cluster: &Cluster) -> f64 {
    if cluster.score.is_finite() {
        cluster.score
    } else {
        0.0
    }
}

fn by_score_desc(a: &&Cluster, b: &&Cluster) -> Ordering {
    score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal)
}

/// Reduce `clusters` to at most `max_count` entries.
///
/// Returns the input unchanged when `mode` is `None`, `max_count` is 0, or
/// the list already fits. Ties keep their original relative order.
pub fn limit_clusters(clusters: &[Cluster], max_count: usize, mode: ClusterLimitMode) -> Vec<Cluster> {
    if mode == ClusterLimitMode::None || max_count == 0 || clusters.len() <= max_count {
        return clusters.to_vec();
    }

    let mut sorted: Vec<&Cluster> = clusters.iter().collect();
    sorted.sort_by(by_score_desc);

    let selected = match mode {
        ClusterLimitMode::Banded => banded(&sorted, max_count),
        _ => sorted.into_iter().take(max_count).collect(),
    };

    debug!(
        input = clusters.len(),
        max_count,
        ?mode,
        selected = selected.len(),
        "Cluster limit applied"
    );

    selected.into_iter().cloned().collect()
}

/// Proportional selection over score-sorted clusters.
fn banded<'a>(sorted: &[&'a Cluster], max_count: usize) -> Vec<&'a Cluster> {
    // Buckets keep the order in which each stage first appears.
    let mut buckets: Vec<(IntentStage, Vec<&'a Cluster>)> = Vec::new();
    for &cluster in sorted {
        match buckets.iter_mut().find(|(stage, _)| *stage == cluster.intent_stage) {
            Some((_, members)) => members.push(cluster),
            None => buckets.push((cluster.intent_stage, vec![cluster])),
        }
    }

    let base_quota = max_count / buckets.len();
    let mut selection: Vec<&Cluster> = buckets
        .iter()
        .flat_map(|(_, members)| members.iter().take(base_quota).copied())
        .collect();

    let remainder = max_count.saturating_sub(selection.len());
    if remainder > 0 {
        let mut overflow: Vec<&Cluster> = buckets
            .iter()
            .flat_map(|(_, members)| members.iter().skip(base_quota).copied())
            .collect();
        overflow.sort_by(by_score_desc);
        selection.extend(overflow.into_iter().take(remainder));
    }

    selection.truncate(max_count);
    selection
}
