//! Execution coordinator
//!
//! Top-level state machine for one panel run:
//!
//! `idle → running-workers → workers-complete → running-synthesis → complete`
//!
//! with `cancelled` and `error` as terminal exits. Worker failures are
//! recovered locally into error-stub outputs; synthesis exhaustion is
//! recovered with a fixed degraded verdict. Only validation failures and a
//! fully failed roster are fatal to the run.

use crate::config::SynthesisConfig;
use crate::ports::cache::{NullCache, SynthesisCache};
use crate::ports::inference::{ChatMessage, Completion, InferenceClient, InferenceError};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use crate::resilience::{RetryPolicy, complete_with_retry};
use crate::use_cases::synthesize::synthesize;
use panel_domain::{
    CostBreakdown, DebateConfig, RunPhase, StructuredSynthesis, SynthesisResult, Task, Topology,
    Worker, WorkerOutput,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Verdict returned when both synthesizer models exhaust their retries.
pub const FALLBACK_VERDICT: &str =
    "Synthesis is unavailable; please review the expert outputs manually.";

/// Capacity of the internal delta channel; a slow observer drops deltas
/// rather than stalling worker calls.
const DELTA_CHANNEL_CAPACITY: usize = 256;

/// Everything needed to start one panel run.
///
/// Passed in verbatim from the configuration layer and never mutated.
#[derive(Debug, Clone)]
pub struct RunPanelInput {
    pub task: String,
    pub topology: Topology,
    pub workers: Vec<Worker>,
    pub synthesis: SynthesisConfig,
    pub debate: DebateConfig,
}

impl RunPanelInput {
    pub fn new(task: impl Into<String>, workers: Vec<Worker>) -> Self {
        Self {
            task: task.into(),
            topology: Topology::default(),
            workers,
            synthesis: SynthesisConfig::default(),
            debate: DebateConfig::default(),
        }
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.topology = topology;
        self
    }

    pub fn with_synthesis(mut self, synthesis: SynthesisConfig) -> Self {
        self.synthesis = synthesis;
        self
    }

    pub fn with_debate(mut self, debate: DebateConfig) -> Self {
        self.debate = debate;
        self
    }
}

/// Fatal run errors.
///
/// Everything else is degraded into the result: failed workers become
/// error stubs, exhausted synthesis becomes [`FALLBACK_VERDICT`].
#[derive(Error, Debug)]
pub enum RunPanelError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Every worker failed; the stub outputs are carried for diagnostics.
    #[error("All workers failed; nothing to synthesize")]
    NoUsableOutputs { outputs: Vec<WorkerOutput> },
}

/// The settled result of one panel run.
#[derive(Debug, Clone, Serialize)]
pub struct PanelRunResult {
    /// One entry per roster member, in roster order
    pub outputs: Vec<WorkerOutput>,
    /// Synthesized verdict, or [`FALLBACK_VERDICT`], or empty when cancelled
    pub verdict: String,
    pub synthesis: Option<SynthesisResult>,
    pub cost: CostBreakdown,
    /// Terminal phase the run ended in (`Complete` or `Cancelled`)
    pub phase: RunPhase,
}

impl PanelRunResult {
    pub fn structured(&self) -> Option<&StructuredSynthesis> {
        self.synthesis.as_ref().and_then(|s| s.structured.as_ref())
    }

    pub fn output_for(&self, worker_id: &str) -> Option<&WorkerOutput> {
        self.outputs.iter().find(|o| o.worker_id == worker_id)
    }

    pub fn successful_outputs(&self) -> impl Iterator<Item = &WorkerOutput> {
        self.outputs.iter().filter(|o| o.is_success())
    }
}

/// Delta forwarded from a spawned worker task to the coordinator loop.
struct WorkerUpdate {
    worker_id: String,
    delta: String,
}

/// Use case: run a panel of workers over a task and synthesize a verdict.
pub struct RunPanelUseCase<C: InferenceClient + 'static> {
    client: Arc<C>,
    cache: Arc<dyn SynthesisCache>,
    retry: RetryPolicy,
}

impl<C: InferenceClient + 'static> RunPanelUseCase<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            cache: Arc::new(NullCache),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn SynthesisCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Run without progress reporting or cancellation.
    pub async fn execute(&self, input: RunPanelInput) -> Result<PanelRunResult, RunPanelError> {
        self.execute_with_progress(input, &NoProgress, None).await
    }

    /// Run with progress callbacks and optional cooperative cancellation.
    ///
    /// Cancellation is not an error: the run settles in the `Cancelled`
    /// phase with whatever outputs were already collected, unstarted and
    /// in-flight workers marked as cancelled stubs, and no synthesis cost.
    pub async fn execute_with_progress(
        &self,
        input: RunPanelInput,
        progress: &dyn ProgressNotifier,
        cancel: Option<CancellationToken>,
    ) -> Result<PanelRunResult, RunPanelError> {
        let task = validate(&input)?;
        let cancel = cancel.unwrap_or_default();

        info!(
            topology = %input.topology,
            workers = input.workers.len(),
            tier = %input.synthesis.tier,
            "starting panel run"
        );
        progress.on_phase_change(RunPhase::RunningWorkers);

        let outputs = match input.topology {
            Topology::Parallel | Topology::Synthesis => {
                self.run_concurrent(&task, &input.workers, progress, &cancel)
                    .await
            }
            Topology::Pipeline => {
                self.run_pipeline(&task, &input.workers, progress, &cancel)
                    .await
            }
            Topology::Debate => {
                self.run_debate(&task, &input.workers, &input.debate, progress, &cancel)
                    .await
            }
        };

        let workers_usd: f64 = outputs.iter().map(|o| o.cost_usd).sum();

        if cancel.is_cancelled() {
            info!("panel run cancelled");
            progress.on_phase_change(RunPhase::Cancelled);
            return Ok(PanelRunResult {
                outputs,
                verdict: String::new(),
                synthesis: None,
                cost: CostBreakdown {
                    workers_usd,
                    synthesis_usd: 0.0,
                },
                phase: RunPhase::Cancelled,
            });
        }

        progress.on_phase_change(RunPhase::WorkersComplete);

        let usable: Vec<WorkerOutput> = outputs.iter().filter(|o| o.is_success()).cloned().collect();
        if usable.is_empty() {
            warn!("every worker failed, nothing to synthesize");
            progress.on_phase_change(RunPhase::Error);
            return Err(RunPanelError::NoUsableOutputs { outputs });
        }

        progress.on_phase_change(RunPhase::RunningSynthesis);

        let synthesis_outcome = tokio::select! {
            _ = cancel.cancelled() => {
                info!("panel run cancelled during synthesis");
                progress.on_phase_change(RunPhase::Cancelled);
                return Ok(PanelRunResult {
                    outputs,
                    verdict: String::new(),
                    synthesis: None,
                    cost: CostBreakdown { workers_usd, synthesis_usd: 0.0 },
                    phase: RunPhase::Cancelled,
                });
            }
            outcome = synthesize(
                self.client.as_ref(),
                self.cache.as_ref(),
                &task,
                &usable,
                &input.synthesis,
                &self.retry,
                progress,
            ) => outcome,
        };

        let result = match synthesis_outcome {
            Ok(synthesis) => {
                let cost = CostBreakdown {
                    workers_usd,
                    synthesis_usd: synthesis.cost_usd,
                };
                PanelRunResult {
                    outputs,
                    verdict: synthesis.verdict_text.clone(),
                    synthesis: Some(synthesis),
                    cost,
                    phase: RunPhase::Complete,
                }
            }
            Err(error) => {
                warn!(%error, "synthesis exhausted, returning fallback verdict");
                PanelRunResult {
                    outputs,
                    verdict: FALLBACK_VERDICT.to_string(),
                    synthesis: None,
                    cost: CostBreakdown {
                        workers_usd,
                        synthesis_usd: 0.0,
                    },
                    phase: RunPhase::Complete,
                }
            }
        };

        info!(
            total_cost = result.cost.total_usd(),
            phase = %result.phase,
            "panel run finished"
        );
        progress.on_phase_change(RunPhase::Complete);
        Ok(result)
    }

    /// Dispatch all workers concurrently and join every call before
    /// returning. One worker's failure never cancels or delays the others.
    async fn run_concurrent(
        &self,
        task: &Task,
        workers: &[Worker],
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Vec<WorkerOutput> {
        let mut join_set = JoinSet::new();
        let (update_tx, mut update_rx) = mpsc::channel::<WorkerUpdate>(DELTA_CHANNEL_CAPACITY);

        for (index, worker) in workers.iter().enumerate() {
            progress.on_worker_started(&worker.id);

            let client = Arc::clone(&self.client);
            let worker = worker.clone();
            let task_text = task.content().to_string();
            let retry = self.retry.clone();
            let updates = update_tx.clone();
            let cancel = cancel.clone();

            join_set.spawn(async move {
                let messages = worker_messages(&worker, &task_text);
                let output = tokio::select! {
                    _ = cancel.cancelled() => WorkerOutput::failure(&worker, "cancelled"),
                    result = call_worker(client.as_ref(), &worker, &messages, &retry, &updates) => {
                        settle(&worker, result)
                    }
                };
                (index, output)
            });
        }
        drop(update_tx);

        let mut slots: Vec<Option<WorkerOutput>> = vec![None; workers.len()];
        let mut workers_usd = 0.0;

        loop {
            tokio::select! {
                Some(update) = update_rx.recv() => {
                    progress.on_worker_delta(&update.worker_id, &update.delta);
                }
                joined = join_set.join_next() => {
                    match joined {
                        Some(Ok((index, output))) => {
                            progress.on_worker_settled(&output.worker_id, output.is_success());
                            workers_usd += output.cost_usd;
                            progress.on_cost_update(workers_usd);
                            slots[index] = Some(output);
                        }
                        Some(Err(join_error)) => {
                            warn!(%join_error, "worker task failed to join");
                        }
                        None => break,
                    }
                }
            }
        }

        // Deltas that arrived after the last join
        while let Ok(update) = update_rx.try_recv() {
            progress.on_worker_delta(&update.worker_id, &update.delta);
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| WorkerOutput::failure(&workers[index], "cancelled"))
            })
            .collect()
    }

    /// Invoke workers strictly in roster order, each seeing the successful
    /// outputs of everyone before it.
    async fn run_pipeline(
        &self,
        task: &Task,
        workers: &[Worker],
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Vec<WorkerOutput> {
        let mut outputs: Vec<WorkerOutput> = Vec::with_capacity(workers.len());
        let mut workers_usd = 0.0;

        for worker in workers {
            if cancel.is_cancelled() {
                outputs.push(WorkerOutput::failure(worker, "cancelled"));
                continue;
            }

            progress.on_worker_started(&worker.id);
            let prompt = pipeline_prompt(task.content(), &outputs);
            let messages = worker_messages(worker, &prompt);

            let output = tokio::select! {
                _ = cancel.cancelled() => WorkerOutput::failure(worker, "cancelled"),
                result = complete_with_retry(
                    self.client.as_ref(),
                    &worker.model_id,
                    &messages,
                    &worker.sampling,
                    &self.retry,
                ) => settle(worker, result),
            };

            progress.on_worker_settled(&output.worker_id, output.is_success());
            workers_usd += output.cost_usd;
            progress.on_cost_update(workers_usd);
            outputs.push(output);
        }

        outputs
    }

    /// Round-based debate: round one is independent positions, later rounds
    /// show each worker its peers' latest text and ask for a response.
    /// Text is replaced by the latest round; cost accumulates across rounds.
    async fn run_debate(
        &self,
        task: &Task,
        workers: &[Worker],
        debate: &DebateConfig,
        progress: &dyn ProgressNotifier,
        cancel: &CancellationToken,
    ) -> Vec<WorkerOutput> {
        let mut outputs: Vec<WorkerOutput> = Vec::with_capacity(workers.len());
        let mut workers_usd = 0.0;

        'rounds: for round in 0..debate.rounds() {
            debug!(round, "debate round");
            // Peers see positions as of the end of the previous round
            let snapshot = outputs.clone();

            for (index, worker) in workers.iter().enumerate() {
                if cancel.is_cancelled() {
                    break 'rounds;
                }
                if round == 0 {
                    progress.on_worker_started(&worker.id);
                }

                let messages = if round == 0 {
                    worker_messages(worker, task.content())
                } else {
                    debate_messages(worker, task.content(), snapshot.get(index), &snapshot)
                };

                let result = tokio::select! {
                    _ = cancel.cancelled() => break 'rounds,
                    result = complete_with_retry(
                        self.client.as_ref(),
                        &worker.model_id,
                        &messages,
                        &worker.sampling,
                        &self.retry,
                    ) => result,
                };

                match result {
                    Ok(completion) => {
                        workers_usd += completion.cost_usd;
                        if round == 0 {
                            outputs.push(WorkerOutput::success(
                                worker,
                                completion.text,
                                completion.usage,
                                completion.cost_usd,
                            ));
                        } else {
                            outputs[index].absorb_round(
                                completion.text,
                                completion.usage,
                                completion.cost_usd,
                            );
                        }
                        progress.on_worker_settled(&worker.id, true);
                        progress.on_cost_update(workers_usd);
                    }
                    Err(error) => {
                        warn!(worker = %worker.id, round, %error, "debate call failed");
                        if round == 0 {
                            outputs.push(WorkerOutput::failure(worker, error.to_string()));
                            progress.on_worker_settled(&worker.id, false);
                        }
                        // A later-round failure keeps the previous position
                    }
                }
            }
        }

        // Workers the first round never reached (cancellation mid-round)
        while outputs.len() < workers.len() {
            outputs.push(WorkerOutput::failure(&workers[outputs.len()], "cancelled"));
        }

        outputs
    }
}

fn validate(input: &RunPanelInput) -> Result<Task, RunPanelError> {
    let task = Task::try_new(input.task.as_str())
        .ok_or_else(|| RunPanelError::Validation("task must not be empty".to_string()))?;

    if input.workers.is_empty() {
        return Err(RunPanelError::Validation(
            "worker roster must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for worker in &input.workers {
        if !seen.insert(worker.id.as_str()) {
            return Err(RunPanelError::Validation(format!(
                "duplicate worker id: {}",
                worker.id
            )));
        }
    }

    Ok(task)
}

fn worker_messages(worker: &Worker, prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if !worker.system_persona.is_empty() {
        messages.push(ChatMessage::system(worker.system_persona.clone()));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

fn settle(worker: &Worker, result: Result<Completion, InferenceError>) -> WorkerOutput {
    match result {
        Ok(completion) => {
            WorkerOutput::success(worker, completion.text, completion.usage, completion.cost_usd)
        }
        Err(error) => {
            warn!(worker = %worker.id, %error, "worker call failed");
            WorkerOutput::failure(worker, error.to_string())
        }
    }
}

/// One worker's streaming call with retry; deltas are forwarded into the
/// coordinator's channel, dropped rather than blocking when it is full.
async fn call_worker(
    client: &dyn InferenceClient,
    worker: &Worker,
    messages: &[ChatMessage],
    retry: &RetryPolicy,
    updates: &mpsc::Sender<WorkerUpdate>,
) -> Result<Completion, InferenceError> {
    let mut last_error = InferenceError::Transport("no attempts were made".to_string());

    for attempt in 0..retry.max_attempts {
        if attempt > 0 {
            let delay = retry.delay_for(attempt - 1);
            debug!(worker = %worker.id, attempt, ?delay, "retrying worker after backoff");
            tokio::time::sleep(delay).await;
        }

        let result = match client
            .complete_streaming(&worker.model_id, messages, &worker.sampling)
            .await
        {
            Ok(handle) => {
                handle
                    .collect_with(|chunk, _| {
                        let _ = updates.try_send(WorkerUpdate {
                            worker_id: worker.id.clone(),
                            delta: chunk.to_string(),
                        });
                    })
                    .await
            }
            Err(error) => Err(error),
        };

        match result {
            Ok(completion) => return Ok(completion),
            Err(error) if !error.is_retryable() => return Err(error),
            Err(error) => {
                warn!(worker = %worker.id, attempt, %error, "worker attempt failed");
                last_error = error;
            }
        }
    }

    Err(last_error)
}

fn pipeline_prompt(task: &str, prior: &[WorkerOutput]) -> String {
    let mut prompt = task.to_string();
    let settled: Vec<&WorkerOutput> = prior.iter().filter(|o| o.is_success()).collect();
    if !settled.is_empty() {
        prompt.push_str("\n\nFindings from earlier panel members:\n");
        for output in settled {
            prompt.push_str(&format!("\n{}: {}\n", output.display_name, output.text));
        }
        prompt.push_str("\nBuild on these findings in your own analysis.");
    }
    prompt
}

/// Later debate rounds are multi-turn: the original task, the worker's own
/// previous position as its prior assistant turn, then the peers' positions
/// as a fresh user turn.
fn debate_messages(
    worker: &Worker,
    task: &str,
    own: Option<&WorkerOutput>,
    peers: &[WorkerOutput],
) -> Vec<ChatMessage> {
    let mut messages = worker_messages(worker, task);
    if let Some(own) = own.filter(|o| o.is_success()) {
        messages.push(ChatMessage::assistant(own.text.clone()));
    }
    messages.push(ChatMessage::user(debate_prompt(worker, peers)));
    messages
}

fn debate_prompt(worker: &Worker, peers: &[WorkerOutput]) -> String {
    let mut prompt = String::from("Positions from the other panel members:\n");
    for peer in peers
        .iter()
        .filter(|p| p.worker_id != worker.id && p.is_success())
    {
        prompt.push_str(&format!("\n{}: {}\n", peer.display_name, peer.text));
    }
    prompt.push_str(
        "\nRespond to these positions: defend, refine, or revise your own analysis.",
    );
    prompt
}
