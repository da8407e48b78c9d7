//! Reliability weighting for worker outputs.
//!
//! Assigns each output a heuristic quality score in `[0, 1]` from three
//! bounded signals: length relative to peers, presence of structured
//! reasoning, and keyword overlap with the task. The exact point values are
//! a policy choice; the load-bearing properties are determinism (same inputs
//! always produce the same weights) and monotonicity (adding relevant,
//! well-structured content never lowers a score).

use crate::core::task::Task;
use crate::output::WorkerOutput;
use serde::{Deserialize, Serialize};

/// Normalized weight for one worker's output, derived per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedOutput {
    pub worker_id: String,
    pub display_name: String,
    /// Raw quality score in `[0, 1]`
    pub weight: f64,
    /// This worker's fraction of the total weight
    pub normalized_weight: f64,
}

/// Result of dominance detection over a weight set.
#[derive(Debug, Clone, PartialEq)]
pub struct ImbalanceReport {
    pub has_imbalance: bool,
    pub warning: Option<String>,
}

impl ImbalanceReport {
    fn balanced() -> Self {
        Self {
            has_imbalance: false,
            warning: None,
        }
    }
}

/// One worker's normalized weight above this fraction (with at least
/// [`MIN_WORKERS_FOR_IMBALANCE`] workers) flags a skewed panel.
pub const DOMINANCE_THRESHOLD: f64 = 0.5;
pub const MIN_WORKERS_FOR_IMBALANCE: usize = 3;

/// Compute reliability weights for a set of worker outputs.
///
/// Error-stub outputs score zero. If every raw weight is zero the
/// normalized distribution falls back to uniform rather than dividing
/// by zero.
pub fn compute_weights(outputs: &[WorkerOutput], task: &Task) -> Vec<WeightedOutput> {
    if outputs.is_empty() {
        return Vec::new();
    }

    let keywords = task_keywords(task.content());
    let median_len = median_text_length(outputs);

    let raw: Vec<f64> = outputs
        .iter()
        .map(|output| {
            if !output.is_success() {
                return 0.0;
            }
            let length = length_signal(output.text.len(), median_len);
            let structure = structure_signal(&output.text);
            let relevance = relevance_signal(&output.text, &keywords);
            ((length + structure + relevance) / 3.0).clamp(0.0, 1.0)
        })
        .collect();

    let total: f64 = raw.iter().sum();
    let uniform = 1.0 / outputs.len() as f64;

    outputs
        .iter()
        .zip(raw)
        .map(|(output, weight)| WeightedOutput {
            worker_id: output.worker_id.clone(),
            display_name: output.display_name.clone(),
            weight,
            normalized_weight: if total > f64::EPSILON {
                weight / total
            } else {
                uniform
            },
        })
        .collect()
}

/// Flag a panel where one worker dominates the normalized weight mass.
///
/// The warning names the dominant worker so callers can surface it.
pub fn detect_imbalance(weights: &[WeightedOutput]) -> ImbalanceReport {
    if weights.len() < MIN_WORKERS_FOR_IMBALANCE {
        return ImbalanceReport::balanced();
    }

    let dominant = weights
        .iter()
        .max_by(|a, b| a.normalized_weight.total_cmp(&b.normalized_weight));

    match dominant {
        Some(w) if w.normalized_weight > DOMINANCE_THRESHOLD => ImbalanceReport {
            has_imbalance: true,
            warning: Some(format!(
                "Worker '{}' holds {:.0}% of the total weight; the verdict may over-represent one perspective",
                w.display_name,
                w.normalized_weight * 100.0
            )),
        },
        _ => ImbalanceReport::balanced(),
    }
}

/// Output length relative to the peer median, capped at twice the median.
fn length_signal(len: usize, median_len: usize) -> f64 {
    if median_len == 0 {
        return if len > 0 { 1.0 } else { 0.0 };
    }
    (len as f64 / (2.0 * median_len as f64)).min(1.0)
}

/// Structured-reasoning signal: a quarter point per feature present.
fn structure_signal(text: &str) -> f64 {
    let has_bullets = text
        .lines()
        .any(|l| l.trim_start().starts_with("- ") || l.trim_start().starts_with("* "));
    let has_headings = text.lines().any(|l| l.trim_start().starts_with('#')) || text.contains("**");
    let has_numbered = text.lines().any(|l| {
        let trimmed = l.trim_start();
        trimmed
            .split_once('.')
            .is_some_and(|(n, rest)| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) && rest.starts_with(' '))
    });
    let has_paragraphs = text.contains("\n\n");

    [has_bullets, has_headings, has_numbered, has_paragraphs]
        .into_iter()
        .filter(|present| *present)
        .count() as f64
        * 0.25
}

/// Fraction of task keywords that appear in the output.
fn relevance_signal(text: &str, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        // Nothing to match against; stay neutral
        return 0.5;
    }
    let lowered = text.to_lowercase();
    let matched = keywords.iter().filter(|k| lowered.contains(k.as_str())).count();
    matched as f64 / keywords.len() as f64
}

/// Unique lowercase task terms of at least four characters, in first-seen order.
fn task_keywords(task: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for word in task.split(|c: char| !c.is_alphanumeric()) {
        if word.len() < 4 {
            continue;
        }
        let lowered = word.to_lowercase();
        if !seen.contains(&lowered) {
            seen.push(lowered);
        }
    }
    seen
}

fn median_text_length(outputs: &[WorkerOutput]) -> usize {
    let mut lengths: Vec<usize> = outputs
        .iter()
        .filter(|o| o.is_success())
        .map(|o| o.text.len())
        .collect();
    if lengths.is_empty() {
        return 0;
    }
    lengths.sort_unstable();
    lengths[lengths.len() / 2]
}
