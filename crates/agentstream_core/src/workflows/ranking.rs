//! crates/agentstream_core/src/workflows/ranking.rs
//!
//! Preference signals derived from a profile's saved workflows.

use crate::domain::{CategoryRank, Workflow};

/// Counts occurrences, keeping first-seen order, then sorts by descending
/// count. The sort is stable, so ties stay in first-seen order.
fn rank_by_frequency<'a>(names: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for name in names {
        match counts.iter_mut().find(|(seen, _)| seen.as_str() == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn extract_categories(workflows: &[Workflow]) -> Vec<CategoryRank> {
    rank_by_frequency(workflows.iter().map(|w| w.category.as_str()))
        .into_iter()
        .map(|(name, count)| CategoryRank { name, count })
        .collect()
}

pub fn extract_tools(workflows: &[Workflow]) -> Vec<String> {
    rank_by_frequency(
        workflows
            .iter()
            .flat_map(|w| w.tools.iter().map(String::as_str)),
    )
    .into_iter()
    .map(|(name, _)| name)
    .collect()
}
