//! Use cases: the operations the application layer exposes.

pub mod run_panel;
pub mod synthesize;

pub use run_panel::{
    FALLBACK_VERDICT, PanelRunResult, RunPanelError, RunPanelInput, RunPanelUseCase,
};
pub use synthesize::synthesize;
