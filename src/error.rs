use chromiumoxide::error::CdpError;
use thiserror::Error;

use crate::steps::Step;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Browser launch failed: {0}")]
    LaunchError(String),

    #[error("Navigation failed: {0}")]
    NavigationError(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("JavaScript error: {0}")]
    JsError(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotError(String),

    #[error("File upload failed: {0}")]
    UploadError(String),

    #[error("CDP error: {0}")]
    CdpError(#[from] CdpError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid profile: {0}")]
    Config(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Login rejected: {0}")]
    LoginRejected(String),

    #[error("Step '{step}' cannot continue: {reason}")]
    StepBlocked { step: Step, reason: String },

    #[error("Run cancelled before step '{0}'")]
    Cancelled(Step),
}

impl Error {
    /// Errors that end the run immediately instead of being recorded against a
    /// single field: the page session timed out or went away.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_)
                | Error::LaunchError(_)
                | Error::NavigationError(_)
                | Error::CdpError(_)
                | Error::Cancelled(_)
        )
    }

    /// Map a CDP failure raised while working on a live page. Request
    /// timeouts keep their fatal meaning; anything else is charged to the
    /// interaction that caused it.
    pub(crate) fn from_cdp(err: CdpError) -> Self {
        match err {
            CdpError::Timeout => Error::Timeout("CDP response".into()),
            other => Error::JsError(other.to_string()),
        }
    }

    /// Map a failed element lookup. A request timeout is still a timeout.
    pub(crate) fn lookup(err: CdpError, selector: &str) -> Self {
        match err {
            CdpError::Timeout => Error::from_cdp(err),
            other => Error::ElementNotFound(format!("{selector}: {other}")),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
