//! Infrastructure layer for the panel orchestrator
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the chat-completions HTTP client, the in-memory
//! synthesis cache, and configuration file loading.

pub mod cache;
pub mod config;
pub mod pricing;
pub mod providers;

// Re-export commonly used types
pub use cache::{CacheStats, MemoryCache};
pub use config::{ConfigLoader, FileConfig, ProviderSettings};
pub use providers::ChatApiClient;
