//! Structured synthesis schema and two-path output parsing.
//!
//! The synthesizer is asked (optionally) to emit a fenced JSON block; models
//! do not always comply. Extraction therefore runs two paths, never erroring:
//!
//! 1. Fenced JSON block, schema-validated
//! 2. Markdown heading extraction (`Consensus`, `Key Insights`, `Conflicts`,
//!    `Action Items` sections with bullet lines)
//!
//! If neither yields a consensus string, the first paragraph of the raw text
//! becomes the consensus and all derived lists stay empty. Structured output
//! is an enhancement, not a requirement for a valid run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One extracted insight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsight {
    #[serde(default = "default_category")]
    pub category: String,
    pub content: String,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub supporting_workers: Vec<String>,
}

/// One extracted disagreement between workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub topic: String,
    #[serde(default)]
    pub positions: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: String,
}

/// Schema-conformant synthesis object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSynthesis {
    pub consensus: String,
    #[serde(default)]
    pub key_insights: Vec<KeyInsight>,
    #[serde(default)]
    pub conflicts: Vec<Conflict>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde(default)]
    pub worker_weights: Option<HashMap<String, f64>>,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_severity() -> String {
    "moderate".to_string()
}

fn default_confidence() -> f64 {
    0.5
}

impl StructuredSynthesis {
    /// Minimal object carrying only a consensus string.
    fn consensus_only(consensus: impl Into<String>) -> Self {
        Self {
            consensus: consensus.into(),
            key_insights: Vec::new(),
            conflicts: Vec::new(),
            confidence: default_confidence(),
            reasoning: None,
            action_items: Vec::new(),
            worker_weights: None,
        }
    }
}

/// Extract a validated [`StructuredSynthesis`] from freeform synthesizer text.
///
/// Returns `None` only for blank input; every parse failure degrades to a
/// weaker extraction path instead of propagating.
pub fn parse_structured(text: &str) -> Option<StructuredSynthesis> {
    if text.trim().is_empty() {
        return None;
    }

    if let Some(parsed) = parse_fenced_json(text) {
        return Some(parsed);
    }

    if let Some(parsed) = parse_headings(text) {
        return Some(parsed);
    }

    Some(StructuredSynthesis::consensus_only(first_paragraph(text)))
}

/// Path 1: locate a fenced code block containing a JSON object and validate it.
fn parse_fenced_json(text: &str) -> Option<StructuredSynthesis> {
    let mut rest = text;
    while let Some(start) = rest.find("```") {
        let after_fence = &rest[start + 3..];
        // Skip the info string ("json", "JSON", or empty) up to the newline
        let body_start = after_fence.find('\n')? + 1;
        let body = &after_fence[body_start..];
        let end = body.find("```")?;
        let candidate = body[..end].trim();

        if candidate.starts_with('{')
            && let Ok(parsed) = serde_json::from_str::<StructuredSynthesis>(candidate)
            && !parsed.consensus.trim().is_empty()
        {
            return Some(parsed);
        }

        rest = &body[end + 3..];
    }
    None
}

/// Section of the markdown fallback grammar.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Consensus,
    Insights,
    Conflicts,
    ActionItems,
    Other,
}

/// Path 2: heading-pattern extraction over markdown sections.
fn parse_headings(text: &str) -> Option<StructuredSynthesis> {
    let mut current = Section::Other;
    let mut consensus_lines: Vec<&str> = Vec::new();
    let mut insights: Vec<KeyInsight> = Vec::new();
    let mut conflicts: Vec<Conflict> = Vec::new();
    let mut action_items: Vec<String> = Vec::new();

    for line in text.lines() {
        if let Some(section) = classify_heading(line) {
            current = section;
            continue;
        }

        let trimmed = line.trim();
        let bullet = trimmed
            .strip_prefix("- ")
            .or_else(|| trimmed.strip_prefix("* "));

        match (current, bullet) {
            (Section::Consensus, _) if !trimmed.is_empty() => consensus_lines.push(trimmed),
            (Section::Insights, Some(item)) => insights.push(KeyInsight {
                category: default_category(),
                content: item.to_string(),
                confidence: default_confidence(),
                supporting_workers: Vec::new(),
            }),
            (Section::Conflicts, Some(item)) => conflicts.push(Conflict {
                topic: item.to_string(),
                positions: Vec::new(),
                severity: default_severity(),
            }),
            (Section::ActionItems, Some(item)) => action_items.push(item.to_string()),
            _ => {}
        }
    }

    let consensus = consensus_lines.join(" ");
    if consensus.is_empty() && insights.is_empty() && conflicts.is_empty() && action_items.is_empty()
    {
        return None;
    }

    let mut parsed = StructuredSynthesis::consensus_only(consensus);
    parsed.key_insights = insights;
    parsed.conflicts = conflicts;
    parsed.action_items = action_items;
    Some(parsed)
}

/// Classify a markdown heading line into a known section, if any.
fn classify_heading(line: &str) -> Option<Section> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }
    let title = trimmed
        .trim_start_matches('#')
        .trim()
        .trim_matches('*')
        .to_lowercase();

    let section = if title.starts_with("consensus") || title.starts_with("conclusion") {
        Section::Consensus
    } else if title.starts_with("key insight") || title.starts_with("finding") || title.starts_with("key finding") {
        Section::Insights
    } else if title.starts_with("conflict") || title.starts_with("disagreement") {
        Section::Conflicts
    } else if title.starts_with("action item") || title.starts_with("recommendation") {
        Section::ActionItems
    } else {
        Section::Other
    };
    Some(section)
}

/// Path 3 fallback: first non-empty paragraph of the raw text.
fn first_paragraph(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_parsed_and_validated() {
        let text = r#"Here is the verdict.

```json
{
  "consensus": "The market is growing",
  "key_insights": [
    {"content": "enterprise demand is strong", "confidence": 0.8}
  ],
  "confidence": 0.7
}
```"#;

        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.consensus, "The market is growing");
        assert_eq!(parsed.key_insights.len(), 1);
        assert_eq!(parsed.key_insights[0].category, "general");
        assert_eq!(parsed.confidence, 0.7);
    }

    #[test]
    fn invalid_json_falls_through_to_headings() {
        let text = "```json\n{not valid json\n```\n\n## Consensus\nMarket is growing.\n";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.consensus, "Market is growing.");
    }

    #[test]
    fn heading_extraction_counts_bullets() {
        let text = r#"## Consensus
The market is growing but carries risk.

## Key Insights
- enterprise demand is strong
- pricing pressure is rising
- incumbents are slow

## Conflicts
- growth rate estimates differ

## Action Items
* validate pricing with customers
"#;

        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.consensus, "The market is growing but carries risk.");
        assert_eq!(parsed.key_insights.len(), 3);
        assert_eq!(parsed.conflicts.len(), 1);
        assert_eq!(parsed.action_items.len(), 1);
        assert_eq!(parsed.conflicts[0].severity, "moderate");
    }

    #[test]
    fn headings_are_case_insensitive() {
        let text = "# CONCLUSION\nBuy.\n\n## key findings\n- one\n";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(parsed.consensus, "Buy.");
        assert_eq!(parsed.key_insights.len(), 1);
    }

    #[test]
    fn plain_text_uses_first_paragraph() {
        let text = "The experts broadly agree the market is viable.\n\nMore detail follows here.";
        let parsed = parse_structured(text).unwrap();
        assert_eq!(
            parsed.consensus,
            "The experts broadly agree the market is viable."
        );
        assert!(parsed.key_insights.is_empty());
    }

    #[test]
    fn blank_input_yields_none() {
        assert!(parse_structured("").is_none());
        assert!(parse_structured("   \n  ").is_none());
    }

    #[test]
    fn json_without_consensus_is_rejected() {
        let text = "```json\n{\"confidence\": 0.9}\n```";
        // Missing consensus fails schema validation; falls back to paragraph
        let parsed = parse_structured(text).unwrap();
        assert!(parsed.key_insights.is_empty());
    }
}
