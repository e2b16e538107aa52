//! Confidence estimation for partially-built markup
//!
//! Disconnected fragments and unresolved ARIA cross-references are the
//! normal state of code under active development, not errors. This module
//! turns fragment count and reference resolution rate into a completeness
//! score in [0,1] that every issue must carry and no consumer may hide or
//! upgrade.
//!
//! Known quirk, kept on purpose: unresolved references alone never push the
//! score below the fragment-count base (a single fragment with only
//! unresolved references still scores 0.7). Whether that matches product
//! intent is an open question; the arithmetic is reproduced as observed.

use serde::Serialize;

use crate::markup::MarkupTree;

/// Attributes whose values are id references into the markup.
pub const ARIA_REFERENCE_ATTRIBUTES: &[&str] =
    &["aria-labelledby", "aria-describedby", "aria-controls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn rank(&self) -> u8 {
        match self {
            ConfidenceLevel::High => 3,
            ConfidenceLevel::Medium => 2,
            ConfidenceLevel::Low => 1,
        }
    }

    pub fn for_completeness(raw: f64) -> ConfidenceLevel {
        if raw >= 0.9 {
            ConfidenceLevel::High
        } else if raw >= 0.5 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceReport {
    pub level: ConfidenceLevel,
    pub reason: String,
    pub raw_completeness: f64,
}

impl ConfidenceReport {
    pub fn from_completeness(raw: f64, reason: impl Into<String>) -> Self {
        let raw = raw.clamp(0.0, 1.0);
        Self {
            level: ConfidenceLevel::for_completeness(raw),
            reason: reason.into(),
            raw_completeness: raw,
        }
    }

    /// Floor confidence for single-file behavior-only analysis, where no
    /// markup is available to cross-reference.
    pub fn behavior_only() -> Self {
        Self {
            level: ConfidenceLevel::Low,
            reason: "single-file analysis without a merged page model".to_string(),
            raw_completeness: 0.0,
        }
    }
}

/// Resolved / unresolved ARIA reference counts. A reference resolves when
/// its target id exists in *any* fragment of the tree.
pub fn aria_reference_counts(tree: &MarkupTree) -> (usize, usize) {
    let ids = collect_ids(tree, None);
    count_references(tree, None, &ids)
}

/// The completeness formula. `fragments` is F, `resolved`/`unresolved` are
/// R and U from ARIA cross-reference resolution.
pub fn completeness(fragments: usize, resolved: usize, unresolved: usize) -> f64 {
    let base = if fragments <= 1 {
        0.7
    } else {
        (1.0 - 0.1 * fragments as f64).max(0.3)
    };
    let total = resolved + unresolved;
    let resolution_rate = if total > 0 {
        resolved as f64 / total as f64
    } else {
        0.0
    };
    (base + 0.3 * resolution_rate).min(1.0)
}

/// Scores a whole tree: fragment count plus global reference resolution.
pub fn estimate(tree: &MarkupTree) -> ConfidenceReport {
    let fragments = tree.fragment_count().max(1);
    let (resolved, unresolved) = aria_reference_counts(tree);
    let raw = completeness(fragments, resolved, unresolved);
    let reason = if resolved + unresolved == 0 {
        format!("{fragments} fragment(s), no ARIA cross-references")
    } else {
        format!(
            "{fragments} fragment(s), {resolved}/{} ARIA references resolved",
            resolved + unresolved
        )
    };
    ConfidenceReport::from_completeness(raw, reason)
}

/// Stricter local test: true only if every ARIA reference inside the
/// fragment resolves to an id present in that same fragment. Independent of
/// the global score.
pub fn is_fragment_complete(tree: &MarkupTree, fragment: usize) -> bool {
    let ids = collect_ids(tree, Some(fragment));
    let (_, unresolved) = count_references(tree, Some(fragment), &ids);
    unresolved == 0
}

fn collect_ids(tree: &MarkupTree, fragment: Option<usize>) -> Vec<String> {
    let elements: Vec<_> = match fragment {
        Some(index) => tree.fragment_elements(index),
        None => tree.all_elements().collect(),
    };
    elements
        .into_iter()
        .filter_map(|id| tree.node(id).attr("id").map(str::to_string))
        .collect()
}

fn count_references(
    tree: &MarkupTree,
    fragment: Option<usize>,
    ids: &[String],
) -> (usize, usize) {
    let elements: Vec<_> = match fragment {
        Some(index) => tree.fragment_elements(index),
        None => tree.all_elements().collect(),
    };
    let mut resolved = 0;
    let mut unresolved = 0;
    for id in elements {
        let node = tree.node(id);
        for attr in ARIA_REFERENCE_ATTRIBUTES {
            if let Some(value) = node.attr(attr) {
                // id reference lists are space-separated
                for target in value.split_whitespace() {
                    if ids.iter().any(|known| known == target) {
                        resolved += 1;
                    } else {
                        unresolved += 1;
                    }
                }
            }
        }
    }
    (resolved, unresolved)
}
