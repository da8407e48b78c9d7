//! Configuration loading and raw TOML structures.

pub mod file_config;
pub mod loader;

pub use file_config::{
    FileConfig, FileRetryConfig, FileRunConfig, FileSynthesisConfig, FileWorkerConfig,
    ProviderSettings,
};
pub use loader::ConfigLoader;
