//! Streaming events for one model call.
//!
//! [`StreamEvent`] bridges provider-level streaming (SSE chunks) to the
//! application layer. Exactly one terminal event (`Completed` or `Error`)
//! ends every stream; deltas arrive strictly in generation order.

use crate::output::TokenUsage;

/// An event in a streaming model response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A text chunk from the model, in arrival order.
    Delta(String),
    /// The complete response (signals stream end).
    Completed {
        text: String,
        usage: TokenUsage,
        cost_usd: f64,
    },
    /// A transport or provider error that aborted the stream.
    Error(String),
}

impl StreamEvent {
    /// Returns the text content if this is a Delta or Completed event.
    pub fn text(&self) -> Option<&str> {
        match self {
            StreamEvent::Delta(s) => Some(s),
            StreamEvent::Completed { text, .. } => Some(text),
            StreamEvent::Error(_) => None,
        }
    }

    /// Returns true if this event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Completed { .. } | StreamEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_text_returns_content() {
        let event = StreamEvent::Delta("hello".to_string());
        assert_eq!(event.text(), Some("hello"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn completed_is_terminal() {
        let event = StreamEvent::Completed {
            text: "full response".to_string(),
            usage: TokenUsage::new(5, 10),
            cost_usd: 0.001,
        };
        assert_eq!(event.text(), Some("full response"));
        assert!(event.is_terminal());
    }

    #[test]
    fn error_is_terminal_without_text() {
        let event = StreamEvent::Error("connection reset".to_string());
        assert_eq!(event.text(), None);
        assert!(event.is_terminal());
    }
}
