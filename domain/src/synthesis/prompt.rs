//! Prompt templates for the synthesis stage.
//!
//! Builds the tier-specific instructions the synthesizer receives, with
//! optional weight context and a structured-output schema directive.

use crate::output::WorkerOutput;
use crate::synthesis::tier::Tier;
use crate::weighting::WeightedOutput;

/// Templates for the synthesizer call.
pub struct SynthesisPrompt;

impl SynthesisPrompt {
    /// System prompt selecting the merge depth for a tier.
    pub fn system(tier: Tier) -> &'static str {
        match tier {
            Tier::Quick => {
                r#"You are a moderator merging multiple expert analyses into one concise verdict.
Combine the main points quickly. Do not cross-examine the experts; note the
single most important disagreement only if it changes the conclusion.
Be brief and decisive."#
            }
            Tier::Balanced => {
                r#"You are a moderator synthesizing multiple expert analyses into a coherent verdict.
Identify where the experts agree, note significant disagreements, and merge
the strongest elements into a single answer. Weigh well-reasoned arguments
over confident assertions."#
            }
            Tier::Deep => {
                r#"You are a moderator performing a deep cross-examination of multiple expert analyses.
For every material claim, check which experts support it, which contradict it,
and which evidence is stronger. Surface hidden assumptions and second-order
risks before committing to a verdict. Be thorough and explicit about your
reasoning."#
            }
        }
    }

    /// Build the full synthesis user prompt.
    ///
    /// Order: weight context (optional) → task → expert outputs → tier
    /// instructions → custom instructions (optional) → schema directive
    /// (optional).
    pub fn build(
        task: &str,
        outputs: &[WorkerOutput],
        weights: Option<&[WeightedOutput]>,
        custom_instructions: Option<&str>,
        structured_output: bool,
    ) -> String {
        let mut prompt = String::new();

        if let Some(weights) = weights {
            prompt.push_str(&Self::weight_context(weights));
            prompt.push('\n');
        }

        prompt.push_str(&format!("Task under analysis:\n{}\n\nExpert analyses:\n", task));

        for output in outputs {
            prompt.push_str(&format!(
                "\n--- {} ({}) ---\n{}\n",
                output.display_name, output.model_id, output.text
            ));
        }

        prompt.push_str(Self::tier_instructions_for_outputs());

        if let Some(custom) = custom_instructions {
            prompt.push_str(&format!("\nAdditional instructions:\n{}\n", custom));
        }

        if structured_output {
            prompt.push_str(Self::schema_directive());
        }

        prompt
    }

    /// Weight-context block listing each worker's contribution share.
    fn weight_context(weights: &[WeightedOutput]) -> String {
        let mut block = String::from(
            "Reliability weighting for this panel (higher weight means the analysis \
             scored better on relevance and structure):\n",
        );
        for w in weights {
            block.push_str(&format!(
                "- {}: {:.0}%\n",
                w.display_name,
                w.normalized_weight * 100.0
            ));
        }
        block.push_str(
            "When experts disagree, prioritize the content of higher-weighted analyses.\n",
        );
        block
    }

    fn tier_instructions_for_outputs() -> &'static str {
        r#"
Based on all analyses above, provide:

1. **Consensus**: the synthesized verdict incorporating the strongest elements

2. **Key Insights**: the most important findings (bullet list)

3. **Conflicts**: significant disagreements and which position is better supported (bullet list)

4. **Action Items**: concrete recommended next steps (bullet list)

Format your response with clear markdown headers."#
    }

    /// Directive instructing the synthesizer to emit a fenced JSON block.
    fn schema_directive() -> &'static str {
        r#"
After your markdown response, emit the same content as a fenced JSON block:

```json
{
  "consensus": "<synthesized verdict>",
  "key_insights": [
    {"category": "<topic>", "content": "<insight>", "confidence": 0.0, "supporting_workers": ["<name>"]}
  ],
  "conflicts": [
    {"topic": "<topic>", "positions": ["<position>"], "severity": "<low|moderate|high>"}
  ],
  "confidence": 0.0,
  "reasoning": "<why you concluded this>",
  "action_items": ["<step>"]
}
```"#
    }
}
