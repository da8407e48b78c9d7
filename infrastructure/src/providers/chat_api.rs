//! Chat-completions HTTP adapter
//!
//! Implements the application layer's [`InferenceClient`] port against an
//! OpenAI-compatible `/chat/completions` endpoint, batch and SSE streaming.
//! HTTP status classification feeds the retry layer: 4xx rejections are
//! terminal, 408/429/5xx are retryable.

use crate::config::ProviderSettings;
use crate::pricing;
use async_trait::async_trait;
use futures::StreamExt;
use panel_application::ports::inference::{
    ChatMessage, Completion, InferenceClient, InferenceError, StreamHandle,
};
use panel_domain::{SamplingConfig, StreamEvent, TokenUsage};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

const STREAM_CHANNEL_CAPACITY: usize = 64;

/// HTTP client for one OpenAI-compatible provider endpoint.
pub struct ChatApiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    request_timeout: Duration,
}

impl ChatApiClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, InferenceError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: format!(
                "{}/chat/completions",
                settings.base_url.trim_end_matches('/')
            ),
            api_key: settings.api_key.clone().unwrap_or_default(),
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        })
    }

    fn build_request_body(
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
        stream: bool,
    ) -> serde_json::Value {
        let body_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": model_id,
            "messages": body_messages,
            "temperature": sampling.temperature,
            "max_tokens": sampling.max_tokens,
            "stream": stream,
        });

        if let Some(top_p) = sampling.top_p {
            body["top_p"] = serde_json::json!(top_p);
        }
        if let Some(penalty) = sampling.presence_penalty {
            body["presence_penalty"] = serde_json::json!(penalty);
        }
        if let Some(penalty) = sampling.frequency_penalty {
            body["frequency_penalty"] = serde_json::json!(penalty);
        }
        if stream {
            // Without this the final SSE chunk carries no token counts
            body["stream_options"] = serde_json::json!({ "include_usage": true });
        }

        body
    }
}

#[async_trait]
impl InferenceClient for ChatApiClient {
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<Completion, InferenceError> {
        debug!(model = model_id, "chat completion request");
        let body = Self::build_request_body(model_id, messages, sampling, false);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body_text = response.text().await.map_err(map_reqwest_error)?;

        if let Some(error) = error_for_status(status, &body_text) {
            return Err(error);
        }

        let parsed: ChatResponse = serde_json::from_str(&body_text)
            .map_err(|e| InferenceError::Parse(e.to_string()))?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.clone())
            .unwrap_or_default();
        let usage = parsed
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        Ok(Completion {
            text,
            usage,
            cost_usd: pricing::cost_for(model_id, usage),
        })
    }

    async fn complete_streaming(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<StreamHandle, InferenceError> {
        debug!(model = model_id, "streaming chat completion request");
        let body = Self::build_request_body(model_id, messages, sampling, true);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            match error_for_status(status, &body_text) {
                Some(error) => return Err(error),
                None => unreachable!("error_for_status returns Some for non-2xx statuses"),
            }
        }

        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let model_id = model_id.to_string();

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut full_text = String::new();
            let mut usage = TokenUsage::default();

            while let Some(chunk) = stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer.drain(..=line_end);

                    match parse_sse_line(&line) {
                        SseLine::Skip => {}
                        SseLine::Done => {
                            let cost_usd = pricing::cost_for(&model_id, usage);
                            let _ = tx
                                .send(StreamEvent::Completed {
                                    text: std::mem::take(&mut full_text),
                                    usage,
                                    cost_usd,
                                })
                                .await;
                            return;
                        }
                        SseLine::Chunk(parsed) => {
                            if let Some(u) = parsed.usage {
                                usage = TokenUsage::new(u.prompt_tokens, u.completion_tokens);
                            }
                            if let Some(delta) = parsed
                                .choices
                                .first()
                                .and_then(|c| c.delta.as_ref())
                                .and_then(|d| d.content.as_ref())
                                && !delta.is_empty()
                            {
                                full_text.push_str(delta);
                                if tx.send(StreamEvent::Delta(delta.clone())).await.is_err() {
                                    // Receiver gone, stop reading
                                    return;
                                }
                            }
                        }
                        SseLine::Malformed(message) => {
                            let _ = tx.send(StreamEvent::Error(message)).await;
                            return;
                        }
                    }
                }
            }

            let _ = tx
                .send(StreamEvent::Error(
                    "stream ended before completion".to_string(),
                ))
                .await;
        });

        Ok(StreamHandle::new(rx))
    }
}

fn map_reqwest_error(error: reqwest::Error) -> InferenceError {
    if error.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(error.to_string())
    }
}

/// Map an HTTP status to the retry taxonomy. Any 2xx is a success.
fn error_for_status(status: u16, body: &str) -> Option<InferenceError> {
    if (200..300).contains(&status) {
        return None;
    }

    let message = parse_error_message(body).unwrap_or_else(|| {
        let trimmed: String = body.chars().take(200).collect();
        trimmed
    });

    Some(match status {
        408 => InferenceError::Timeout,
        429 => InferenceError::Transient {
            status: Some(429),
            message,
        },
        s if (500..600).contains(&s) => InferenceError::Transient {
            status: Some(s),
            message,
        },
        s => InferenceError::ClientRejected { status: s, message },
    })
}

fn parse_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}

enum SseLine {
    Skip,
    Done,
    Chunk(StreamChunk),
    Malformed(String),
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data: ") else {
        return SseLine::Skip;
    };
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => SseLine::Chunk(chunk),
        Err(e) => SseLine::Malformed(format!("malformed stream chunk: {e}")),
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    usage: Option<UsagePayload>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
struct UsagePayload {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
