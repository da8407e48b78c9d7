//! Provider adapters implementing the application layer's inference port.

pub mod chat_api;

pub use chat_api::ChatApiClient;
