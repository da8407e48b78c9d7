//! Inference client port
//!
//! Defines the interface for one chat-completion provider call, streaming or
//! batch. Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use panel_domain::{SamplingConfig, StreamEvent, TokenUsage};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur during an inference call.
///
/// The classification drives retry policy: client rejections are never
/// retried (retrying cannot change the outcome), everything else is fair
/// game for backoff.
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    #[error("Provider rejected the request (HTTP {status}): {message}")]
    ClientRejected { status: u16, message: String },

    #[error("Transient provider error: {message}")]
    Transient { status: Option<u16>, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Stream closed before completion")]
    StreamClosed,

    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

impl InferenceError {
    /// Whether a fresh attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            InferenceError::Transient { .. }
                | InferenceError::Transport(_)
                | InferenceError::Timeout
                | InferenceError::StreamClosed
        )
    }
}

/// Role of one chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A settled completion with usage and the cost the adapter attributes to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
}

/// Handle for receiving streaming events from one model call.
///
/// Wraps an `mpsc::Receiver<StreamEvent>`. Exactly one terminal event
/// (`Completed` or `Error`) ends the stream; the consuming methods stop at
/// the first terminal event they see.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Consume the stream, invoking `on_delta(chunk, full_text_so_far)`
    /// synchronously for every delta before reading further.
    pub async fn collect_with(
        mut self,
        mut on_delta: impl FnMut(&str, &str),
    ) -> Result<Completion, InferenceError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => {
                    full_text.push_str(&chunk);
                    on_delta(&chunk, &full_text);
                }
                StreamEvent::Completed {
                    text,
                    usage,
                    cost_usd,
                } => {
                    // Prefer the accumulated deltas; a batch-backed stream
                    // carries the full text only on the terminal event
                    let text = if full_text.is_empty() { text } else { full_text };
                    return Ok(Completion {
                        text,
                        usage,
                        cost_usd,
                    });
                }
                StreamEvent::Error(message) => {
                    return Err(InferenceError::Transport(message));
                }
            }
        }
        Err(InferenceError::StreamClosed)
    }

    /// Consume the stream and collect all text, discarding deltas.
    pub async fn collect_text(self) -> Result<Completion, InferenceError> {
        self.collect_with(|_, _| {}).await
    }
}

/// Client for one chat-completion provider
///
/// This port defines how the application layer issues model calls.
/// Retry and failover are layered on top (see [`crate::resilience`]);
/// a single call here is exactly one provider request.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Issue a non-streaming completion.
    async fn complete(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<Completion, InferenceError>;

    /// Issue a streaming completion.
    ///
    /// Default implementation calls `complete()` and wraps the result in a
    /// single terminal event, so batch-only implementations work unchanged.
    async fn complete_streaming(
        &self,
        model_id: &str,
        messages: &[ChatMessage],
        sampling: &SamplingConfig,
    ) -> Result<StreamHandle, InferenceError> {
        let completion = self.complete(model_id, messages, sampling).await?;
        let (tx, rx) = mpsc::channel(1);
        // If the receiver is dropped before reading, that's the caller's choice
        let _ = tx
            .send(StreamEvent::Completed {
                text: completion.text,
                usage: completion.usage,
                cost_usd: completion.cost_usd,
            })
            .await;
        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn collect_with_sees_deltas_in_order() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("Mar".into())).await.unwrap();
        tx.send(StreamEvent::Delta("ket".into())).await.unwrap();
        tx.send(StreamEvent::Completed {
            text: String::new(),
            usage: TokenUsage::new(3, 2),
            cost_usd: 0.001,
        })
        .await
        .unwrap();
        drop(tx);

        let mut seen = Vec::new();
        let completion = StreamHandle::new(rx)
            .collect_with(|chunk, so_far| seen.push((chunk.to_string(), so_far.to_string())))
            .await
            .unwrap();

        assert_eq!(completion.text, "Market");
        assert_eq!(seen, vec![
            ("Mar".to_string(), "Mar".to_string()),
            ("ket".to_string(), "Market".to_string()),
        ]);
    }

    #[tokio::test]
    async fn stream_error_surfaces_as_transport() {
        let (tx, rx) = mpsc::channel(2);
        tx.send(StreamEvent::Delta("partial".into())).await.unwrap();
        tx.send(StreamEvent::Error("connection reset".into()))
            .await
            .unwrap();
        drop(tx);

        let err = StreamHandle::new(rx).collect_text().await.unwrap_err();
        assert!(matches!(err, InferenceError::Transport(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn closed_channel_without_terminal_is_an_error() {
        let (tx, rx) = mpsc::channel::<StreamEvent>(1);
        drop(tx);
        let err = StreamHandle::new(rx).collect_text().await.unwrap_err();
        assert!(matches!(err, InferenceError::StreamClosed));
    }

    #[test]
    fn client_rejections_are_not_retryable() {
        let err = InferenceError::ClientRejected {
            status: 401,
            message: "bad key".into(),
        };
        assert!(!err.is_retryable());

        let err = InferenceError::Transient {
            status: Some(503),
            message: "overloaded".into(),
        };
        assert!(err.is_retryable());
    }
}
