//! Seed keyword derivation.

use std::collections::HashSet;

use keyplan_core::text::bigrams;
use keyplan_core::{defaults, extract_brand_terms, extract_keywords_from_url, sanitize_keyword_list};
use keyplan_core::{Cluster, RunInput};

/// Non-brand tokens and adjacent-token bigrams from the target and
/// competitor URLs, in URL order.
///
/// Brand tokens are removed before bigrams are formed, so a bigram never
/// spans a brand name.
pub fn url_seed_terms(input: &RunInput) -> Vec<String> {
    let urls = input.all_urls();
    let brand_terms: HashSet<String> = extract_brand_terms(&urls).into_iter().collect();

    let mut terms = Vec::new();
    for url in urls {
        let tokens: Vec<String> = extract_keywords_from_url(url)
            .into_iter()
            .filter(|token| !brand_terms.contains(token))
            .collect();
        let pairs = bigrams(&tokens);
        terms.extend(tokens);
        terms.extend(pairs);
    }
    terms
}

/// Every seed candidate for a run, sanitized and deduplicated.
///
/// Order: per cluster its name, name + industry and name + audience; then the
/// URL terms; then the industry-qualified phrases.
pub fn collect_seed_keywords(clusters: &[Cluster], input: &RunInput) -> Vec<String> {
    let industry = input.industry.trim();
    let audience = input.audience.trim();

    let mut seeds = Vec::new();
    for cluster in clusters {
        seeds.push(cluster.name.clone());
        if !industry.is_empty() {
            seeds.push(format!("{} {}", cluster.name, industry));
        }
        if !audience.is_empty() {
            seeds.push(format!("{} {}", cluster.name, audience));
        }
    }

    seeds.extend(url_seed_terms(input));

    if !industry.is_empty() {
        seeds.push(format!("{industry} products"));
        seeds.push(format!("{industry} routine"));
    }

    sanitize_keyword_list(seeds)
}

/// The seeds actually sent downstream: the first [`defaults::MAX_SEEDS`].
pub fn limited_seeds(clusters: &[Cluster], input: &RunInput) -> Vec<String> {
    let mut seeds = collect_seed_keywords(clusters, input);
    seeds.truncate(defaults::MAX_SEEDS);
    seeds
}

/// Seed families for a taxonomy run: URL keywords (brands included), then
/// industry and audience.
pub fn seed_families(input: &RunInput) -> Vec<String> {
    let mut families: Vec<String> = input
        .all_urls()
        .into_iter()
        .flat_map(extract_keywords_from_url)
        .collect();
    for extra in [&input.industry, &input.audience] {
        let extra = extra.trim().to_lowercase();
        if !extra.is_empty() {
            families.push(extra);
        }
    }
    sanitize_keyword_list(families)
}
