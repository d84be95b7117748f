//! Application layer
//!
//! Orchestrates fetching, derivation and rendering.

pub mod charts;
pub mod commands;
pub mod dto;
pub mod refresh;

pub use commands::CaseActionService;
pub use dto::*;
pub use refresh::{RefreshCoordinator, RefreshOutcome, RefreshReport, RefreshState, RefreshTrigger, SectionReport};
