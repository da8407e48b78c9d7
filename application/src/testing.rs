//! Scriptable inference client and cache used by the use-case tests.

use crate::ports::cache::SynthesisCache;
use crate::ports::inference::{
    ChatMessage, ChatRole, Completion, InferenceClient, InferenceError, StreamHandle,
};
use async_trait::async_trait;
use panel_domain::{CacheEntry, SamplingConfig, StreamEvent, TokenUsage};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// How a scripted model misbehaves.
#[derive(Debug, Clone, Copy)]
pub(crate) enum FailKind {
    Transient,
    ClientRejected,
}

impl FailKind {
    fn to_error(self) -> InferenceError {
        match self {
            FailKind::Transient => InferenceError::Transient {
                status: Some(503),
                message: "scripted transient failure".to_string(),
            },
            FailKind::ClientRejected => InferenceError::ClientRejected {
                status: 401,
                message: "scripted rejection".to_string(),
            },
        }
    }
}

/// Scripted behavior for one model id.
#[derive(Debug, Clone)]
pub(crate) enum Script {
    Ok { text: String, cost_usd: f64 },
    FailAlways(FailKind),
    FailThenOk { failures: u32, text: String },
    /// Streaming calls die mid-stream; batch calls succeed with `text`
    StreamBreaks { text: String },
    /// Never settles within any realistic test window
    Hang,
}

/// In-memory scripted [`InferenceClient`].
///
/// Unscripted model ids succeed with a canned response so roster-heavy
/// tests only script the interesting workers.
pub(crate) struct MockClient {
    scripts: HashMap<String, Script>,
    attempts: Mutex<HashMap<String, u32>>,
    prompts: Mutex<Vec<(String, String)>>,
    requests: Mutex<Vec<(String, Vec<ChatMessage>)>>,
}

impl MockClient {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            attempts: Mutex::new(HashMap::new()),
            prompts: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn script(mut self, model_id: &str, script: Script) -> Self {
        self.scripts.insert(model_id.to_string(), script);
        self
    }

    /// Number of `complete` calls made against a model id.
    pub(crate) fn attempts_for(&self, model_id: &str) -> u32 {
        self.attempts
            .lock()
            .expect("attempts lock")
            .get(model_id)
            .copied()
            .unwrap_or(0)
    }

    /// All `(model_id, user_prompt)` pairs seen, in call order.
    pub(crate) fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    /// Full message lists sent to one model id, in call order.
    pub(crate) fn requests_for(&self, model_id: &str) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .expect("requests lock")
            .iter()
            .filter(|(model, _)| model == model_id)
            .map(|(_, messages)| messages.clone())
            .collect()
    }

    fn record(&self, model_id: &str, messages: &[ChatMessage]) -> u32 {
        let mut attempts = self.attempts.lock().expect("attempts lock");
        let count = attempts.entry(model_id.to_string()).or_insert(0);
        *count += 1;

        let user_prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts
            .lock()
            .expect("prompts lock")
            .push((model_id.to_string(), user_prompt));
        self.requests
            .lock()
            .expect("requests lock")
            .push((model_id.to_string(), messages.to_vec()));

        *count
    }
}

#[async_trait]
impl InferenceClient for MockClient {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        _sampling: &SamplingConfig,
    ) -> Result<Completion, InferenceError> {
        let attempt = self.record(model_id, messages);

        match self.scripts.get(model_id) {
            None => Ok(Completion {
                text: format!("analysis from {model_id}"),
                usage: TokenUsage::new(10, 20),
                cost_usd: 0.01,
            }),
            Some(Script::Ok { text, cost_usd }) => Ok(Completion {
                text: text.clone(),
                usage: TokenUsage::new(10, 20),
                cost_usd: *cost_usd,
            }),
            Some(Script::FailAlways(kind)) => Err(kind.to_error()),
            Some(Script::FailThenOk { failures, text }) => {
                if attempt <= *failures {
                    Err(FailKind::Transient.to_error())
                } else {
                    Ok(Completion {
                        text: text.clone(),
                        usage: TokenUsage::new(10, 20),
                        cost_usd: 0.01,
                    })
                }
            }
            Some(Script::StreamBreaks { text }) => Ok(Completion {
                text: text.clone(),
                usage: TokenUsage::new(10, 20),
                cost_usd: 0.01,
            }),
            Some(Script::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InferenceError::Timeout)
            }
        }
    }

    async fn complete_streaming(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<StreamHandle, InferenceError> {
        if let Some(Script::StreamBreaks { .. }) = self.scripts.get(model_id) {
            self.record(model_id, messages);
            let (sender, receiver) = mpsc::channel(4);
            let _ = sender.send(StreamEvent::Delta("partial ".to_string())).await;
            let _ = sender
                .send(StreamEvent::Error("scripted stream break".to_string()))
                .await;
            return Ok(StreamHandle::new(receiver));
        }

        let completion = self.complete(model_id, messages, sampling).await?;
        let (sender, receiver) = mpsc::channel(1);
        let _ = sender
            .send(StreamEvent::Completed {
                text: completion.text,
                usage: completion.usage,
                cost_usd: completion.cost_usd,
            })
            .await;
        Ok(StreamHandle::new(receiver))
    }
}

/// Plain in-memory cache for coordinator tests.
#[derive(Default)]
pub(crate) struct TestCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

#[async_trait]
impl SynthesisCache for TestCache {
    async fn lookup(&self, fingerprint: &str) -> Option<CacheEntry> {
        self.entries
            .lock()
            .expect("cache lock")
            .get(fingerprint)
            .cloned()
    }

    async fn store(&self, entry: CacheEntry) {
        self.entries
            .lock()
            .expect("cache lock")
            .entry(entry.fingerprint.clone())
            .or_insert(entry);
    }
}
