//! Three-level topic hierarchy derived from keyword tokens.
//!
//! Each keyword is tokenized and stripped of stop words. The first surviving
//! token names the topic (L1), the second the subtopic (L2), and the two
//! together the leaf cluster (L3). Nodes live in per-level arenas keyed by
//! id, so parents and children refer to each other by id only.

use std::collections::HashMap;

use tracing::debug;

use keyplan_core::text::{is_stop_word, slugify, tokenize};
use keyplan_core::{Assignment, Taxonomy, TaxonomyBuild, TaxonomyNode};

/// Placeholder intent on assignments; enrichment sets the real stage per row.
pub const ASSIGNMENT_INTENT: &str = "commercial";

const GENERAL: &str = "general";
const TOPIC: &str = "topic";

/// One level of the hierarchy: nodes in creation order plus an id index.
#[derive(Default)]
struct Level {
    nodes: Vec<TaxonomyNode>,
    index: HashMap<String, usize>,
}

impl Level {
    /// Return the node for `id`, creating it on first sight.
    fn get_or_insert(&mut self, id: &str, parent_id: Option<&str>, name: &str) -> &mut TaxonomyNode {
        let slot = match self.index.get(id) {
            Some(&slot) => slot,
            None => {
                self.nodes.push(TaxonomyNode {
                    id: id.to_string(),
                    parent_id: parent_id.map(str::to_string),
                    name: name.to_string(),
                    children: Vec::new(),
                });
                let slot = self.nodes.len() - 1;
                self.index.insert(id.to_string(), slot);
                slot
            }
        };
        &mut self.nodes[slot]
    }
}

fn add_child(node: &mut TaxonomyNode, child_id: &str) {
    if !node.children.iter().any(|c| c == child_id) {
        node.children.push(child_id.to_string());
    }
}

fn slug_or(value: &str, fallback: &str) -> String {
    let slug = slugify(value);
    if slug.is_empty() {
        fallback.to_string()
    } else {
        slug
    }
}

/// Incremental taxonomy builder.
///
/// Feeding the same keywords in the same order always yields the same ids
/// and groupings.
#[derive(Default)]
pub struct TaxonomyBuilder {
    l1: Level,
    l2: Level,
    l3: Level,
    assignments: Vec<Assignment>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one keyword, creating any missing nodes on its path.
    pub fn add(&mut self, keyword: &str) {
        let tokens: Vec<String> = tokenize(keyword)
            .into_iter()
            .filter(|t| !is_stop_word(t))
            .collect();

        let l1_key = tokens.first().map(String::as_str).unwrap_or(GENERAL);
        let l2_key = tokens.get(1).map(String::as_str).unwrap_or(GENERAL);
        let l3_key = if tokens.is_empty() {
            l2_key.to_string()
        } else {
            tokens.iter().take(2).cloned().collect::<Vec<_>>().join(" ")
        };

        let l1_slug = slug_or(l1_key, GENERAL);
        let l2_slug = slug_or(l2_key, GENERAL);
        let l1_id = format!("l1-{l1_slug}");
        let l2_id = format!("l2-{l1_slug}-{l2_slug}");
        let l3_id = format!("l3-{l1_slug}-{l2_slug}-{}", slug_or(&l3_key, TOPIC));

        let l1 = self.l1.get_or_insert(&l1_id, None, l1_key);
        add_child(l1, &l2_id);
        let l2 = self.l2.get_or_insert(&l2_id, Some(&l1_id), l2_key);
        add_child(l2, &l3_id);
        self.l3.get_or_insert(&l3_id, Some(&l2_id), &l3_key);

        self.assignments.push(Assignment {
            keyword: keyword.to_string(),
            cluster_id: l3_id,
            intent: ASSIGNMENT_INTENT.to_string(),
        });
    }

    pub fn finish(self) -> TaxonomyBuild {
        debug!(
            l1 = self.l1.nodes.len(),
            l2 = self.l2.nodes.len(),
            l3 = self.l3.nodes.len(),
            assignments = self.assignments.len(),
            "Taxonomy built"
        );
        TaxonomyBuild {
            taxonomy: Taxonomy {
                l1: self.l1.nodes,
                l2: self.l2.nodes,
                l3: self.l3.nodes,
            },
            assignments: self.assignments,
        }
    }
}

/// Build the hierarchy and leaf assignments for a keyword list.
///
/// Every input keyword appears in exactly one assignment, including keywords
/// that are empty or made only of stop words.
pub fn build_taxonomy<S: AsRef<str>>(keywords: &[S]) -> TaxonomyBuild {
    let mut builder = TaxonomyBuilder::new();
    for keyword in keywords {
        builder.add(keyword.as_ref());
    }
    builder.finish()
}
