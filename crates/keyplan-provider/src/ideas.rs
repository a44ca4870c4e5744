//! Helpers for shaping keyword-idea results.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use keyplan_core::tokenize;

use crate::types::ResultItem;

/// Split `items` into consecutive chunks of `size`. A size of 0 is treated as 1.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}

/// Ideas attributed to one seed keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedIdeas {
    pub seed: String,
    pub ideas: Vec<ResultItem>,
}

fn overlap(a: &[String], b: &HashSet<String>) -> usize {
    a.iter().filter(|t| b.contains(*t)).count()
}

fn slot_for(groups: &mut Vec<SeedIdeas>, seed: &str) -> usize {
    match groups.iter().position(|g| g.seed == seed) {
        Some(i) => i,
        None => {
            groups.push(SeedIdeas {
                seed: seed.to_string(),
                ideas: Vec::new(),
            });
            groups.len() - 1
        }
    }
}

/// Group an ideas result by the seed that produced each idea.
///
/// Nested results (`[{keyword: seed, items: [...]}, ...]`) are grouped as
/// given. Flat results (`[{keyword: idea}, ...]`) are attributed to the seed
/// sharing the most tokens with the idea; the first seed wins ties. Every
/// non-blank seed is present in the output, in input order, even when it
/// received no ideas.
pub fn group_ideas_by_seed<S: AsRef<str>>(result: &[Value], seeds: &[S]) -> Vec<SeedIdeas> {
    let seeds: Vec<&str> = seeds
        .iter()
        .map(|s| s.as_ref().trim())
        .filter(|s| !s.is_empty())
        .collect();
    let mut groups: Vec<SeedIdeas> = Vec::new();
    for seed in &seeds {
        slot_for(&mut groups, seed);
    }

    let nested = matches!(result.first().and_then(|e| e.get("items")), Some(Value::Array(_)));
    if nested {
        for entry in result {
            let seed = entry
                .get("keyword")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim();
            if seed.is_empty() {
                continue;
            }
            let items: Vec<ResultItem> = match entry.get("items") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|i| serde_json::from_value(i.clone()).ok())
                    .collect(),
                _ => Vec::new(),
            };
            let slot = slot_for(&mut groups, seed);
            groups[slot].ideas.extend(items);
        }
        return groups;
    }

    let Some(first_seed) = seeds.first() else {
        return groups;
    };
    let seed_tokens: Vec<(&str, HashSet<String>)> = seeds
        .iter()
        .map(|seed| (*seed, tokenize(seed).into_iter().collect()))
        .collect();

    for value in result {
        let Ok(idea) = serde_json::from_value::<ResultItem>(value.clone()) else {
            continue;
        };
        let Some(keyword) = idea.keyword() else {
            continue;
        };
        let idea_tokens = tokenize(keyword);

        let mut best_seed = *first_seed;
        let mut best_score = 0;
        for (i, (seed, tokens)) in seed_tokens.iter().enumerate() {
            let score = overlap(&idea_tokens, tokens);
            if i == 0 || score > best_score {
                best_score = score;
                best_seed = *seed;
            }
        }
        let slot = slot_for(&mut groups, best_seed);
        groups[slot].ideas.push(idea);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keywords(group: &SeedIdeas) -> Vec<&str> {
        group.ideas.iter().filter_map(ResultItem::keyword).collect()
    }

    #[test]
    fn test_chunk() {
        assert_eq!(chunk(&[1, 2, 3, 4, 5], 2), vec![vec![1, 2], vec![3, 4], vec![5]]);
        assert_eq!(chunk(&[1, 2], 0), vec![vec![1], vec![2]]);
        assert!(chunk::<i32>(&[], 3).is_empty());
    }

    #[test]
    fn test_group_nested_results() {
        let result = vec![
            json!({"keyword": "alpha", "items": [{"keyword": "alpha one", "search_volume": 10}]}),
            json!({"keyword": "beta", "items": [{"keyword": "beta one", "search_volume": 20}]}),
        ];
        let groups = group_ideas_by_seed(&result, &["alpha", "beta"]);
        assert_eq!(groups.len(), 2);
        assert_eq!(keywords(&groups[0]), vec!["alpha one"]);
        assert_eq!(keywords(&groups[1]), vec!["beta one"]);
    }

    #[test]
    fn test_group_nested_adds_unknown_seed() {
        let result = vec![json!({"keyword": "gamma", "items": [{"keyword": "gamma one"}]})];
        let groups = group_ideas_by_seed(&result, &["alpha"]);
        assert_eq!(groups.len(), 2);
        assert!(groups[0].ideas.is_empty());
        assert_eq!(groups[1].seed, "gamma");
    }

    #[test]
    fn test_group_flat_results_by_overlap() {
        let result = vec![
            json!({"keyword": "grant management software pricing", "search_volume": 100}),
            json!({"keyword": "social value reporting template", "search_volume": 50}),
        ];
        let groups = group_ideas_by_seed(
            &result,
            &["grant management software", "social value reporting"],
        );
        assert_eq!(
            keywords(&groups[0]),
            vec!["grant management software pricing"]
        );
        assert_eq!(keywords(&groups[1]), vec!["social value reporting template"]);
    }

    #[test]
    fn test_group_flat_ties_go_to_first_seed() {
        let result = vec![json!({"keyword": "unrelated idea"}), json!({"search_volume": 3})];
        let groups = group_ideas_by_seed(&result, &["alpha", "beta"]);
        assert_eq!(keywords(&groups[0]), vec!["unrelated idea"]);
        assert!(groups[1].ideas.is_empty());
    }

    #[test]
    fn test_group_without_seeds_or_results() {
        assert!(group_ideas_by_seed::<&str>(&[json!({"keyword": "x"})], &[]).is_empty());
        let groups = group_ideas_by_seed(&[], &["alpha", " "]);
        assert_eq!(groups.len(), 1);
    }
}
