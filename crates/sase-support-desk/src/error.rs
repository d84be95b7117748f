//! Error types for the support desk

use thiserror::Error;

use crate::ports::outbound::DataSourceError;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("data source error: {0}")]
    DataSource(#[from] DataSourceError),

    #[error("case not found: {0}")]
    CaseNotFound(String),

    #[error("invalid status transition to {0}")]
    InvalidTransition(String),

    /// The view has nowhere to draw the named section
    #[error("render target missing: {0}")]
    RenderTargetMissing(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
