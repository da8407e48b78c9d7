//! Ports: interfaces the application layer depends on.
//!
//! Adapters live in the infrastructure layer; tests substitute mocks.

pub mod cache;
pub mod inference;
pub mod progress;

pub use cache::{NullCache, SynthesisCache};
pub use inference::{
    ChatMessage, ChatRole, Completion, InferenceClient, InferenceError, StreamHandle,
};
pub use progress::{ChannelNotifier, NoProgress, ProgressNotifier};
