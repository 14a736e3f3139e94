//! crates/agentstream_core/src/workflows/progress.rs
//!
//! Execution progress estimation.
//!
//! The endpoint streams free text, so the active step is guessed from the
//! number of `Step N:` markers seen so far. Replace this if the endpoint ever
//! reports structured progress.

use regex::Regex;
use std::sync::OnceLock;

fn step_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"Step \d+:").expect("step marker pattern is valid"))
}

/// Number of `Step N:` markers in `text`.
pub fn count_step_markers(text: &str) -> usize {
    step_marker().find_iter(text).count()
}
