//! Synthesis pipeline
//!
//! Merges usable worker outputs into a single verdict:
//! cache lookup → weighting → tiered prompt build → inference with
//! retry/failover → structured parse → cache write.
//!
//! A cache hit returns the stored verdict with zero incremental cost and
//! never touches the inference client.

use crate::config::SynthesisConfig;
use crate::ports::cache::SynthesisCache;
use crate::ports::inference::{ChatMessage, Completion, InferenceClient};
use crate::ports::progress::ProgressNotifier;
use crate::resilience::{RetryPolicy, SynthesisExhausted, complete_with_failover};
use panel_domain::{
    CacheEntry, SynthesisPrompt, SynthesisResult, Task, WorkerOutput, compute_weights,
    detect_imbalance, parse_structured, synthesis_fingerprint,
};
use tracing::{debug, info, warn};

/// Run the synthesis pipeline over the non-error worker outputs.
///
/// Only exhaustion of both synthesizer models is an error; the coordinator
/// recovers even that with a degraded fixed verdict.
pub async fn synthesize(
    client: &dyn InferenceClient,
    cache: &dyn SynthesisCache,
    task: &Task,
    outputs: &[WorkerOutput],
    config: &SynthesisConfig,
    retry: &RetryPolicy,
    progress: &dyn ProgressNotifier,
) -> Result<SynthesisResult, SynthesisExhausted> {
    let fingerprint = synthesis_fingerprint(outputs, task, config.tier);

    if config.use_cache
        && let Some(entry) = cache.lookup(&fingerprint).await
    {
        info!(fingerprint = %entry.fingerprint, "synthesis served from cache");
        progress.on_cache_hit(&fingerprint);
        return Ok(SynthesisResult::from_cache_entry(&entry, config.tier));
    }

    let weights = if config.use_weighting {
        let weights = compute_weights(outputs, task);
        let report = detect_imbalance(&weights);
        if let Some(warning) = &report.warning {
            warn!(%warning, "weight imbalance detected");
        }
        Some(weights)
    } else {
        None
    };

    let prompt = SynthesisPrompt::build(
        task.content(),
        outputs,
        weights.as_deref(),
        config.custom_instructions.as_deref(),
        config.structured_output,
    );
    let messages = vec![
        ChatMessage::system(SynthesisPrompt::system(config.tier)),
        ChatMessage::user(prompt),
    ];
    let sampling = config.sampling();

    let (completion, model_id) = call_synthesizer(
        client, config, &messages, &sampling, retry, progress,
    )
    .await?;

    let structured = if config.structured_output {
        parse_structured(&completion.text)
    } else {
        None
    };

    if config.use_cache {
        cache
            .store(CacheEntry::new(
                fingerprint,
                completion.text.clone(),
                structured.clone(),
                completion.cost_usd,
                model_id.clone(),
            ))
            .await;
    }

    Ok(SynthesisResult {
        verdict_text: completion.text,
        tier: config.tier,
        model_id,
        cost_usd: completion.cost_usd,
        prompt_tokens: completion.usage.prompt_tokens,
        completion_tokens: completion.usage.completion_tokens,
        structured,
        from_cache: false,
    })
}

/// Issue the synthesizer call, streaming when configured.
///
/// A stream that dies before completing is not resumed; the whole call is
/// re-issued as a fresh non-streaming request through the failover path.
async fn call_synthesizer(
    client: &dyn InferenceClient,
    config: &SynthesisConfig,
    messages: &[ChatMessage],
    sampling: &panel_domain::SamplingConfig,
    retry: &RetryPolicy,
    progress: &dyn ProgressNotifier,
) -> Result<(Completion, String), SynthesisExhausted> {
    if config.use_streaming {
        match stream_once(client, &config.synthesizer_model_id, messages, sampling, progress).await
        {
            Ok(completion) => {
                return Ok((completion, config.synthesizer_model_id.clone()));
            }
            Err(error) => {
                warn!(%error, "synthesis stream failed, re-issuing as batch call");
            }
        }
    }

    let outcome = complete_with_failover(
        client,
        &config.synthesizer_model_id,
        config.fallback_model_id.as_deref(),
        messages,
        sampling,
        retry,
    )
    .await?;

    Ok((outcome.completion, outcome.model_id))
}

async fn stream_once(
    client: &dyn InferenceClient,
    model_id: &str,
    messages: &[ChatMessage],
    sampling: &panel_domain::SamplingConfig,
    progress: &dyn ProgressNotifier,
) -> Result<Completion, crate::ports::inference::InferenceError> {
    debug!(model = model_id, "streaming synthesis call");
    let handle = client
        .complete_streaming(model_id, messages, sampling)
        .await?;
    handle
        .collect_with(|delta, _| progress.on_synthesis_delta(delta))
        .await
}
