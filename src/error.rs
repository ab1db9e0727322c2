//! Error types for the UI test helpers

use thiserror::Error;

/// Result type alias for driver, interaction and screenshot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a browser under test
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to launch or attach to the browser
    #[error("Driver initialization failed: {0}")]
    InitializationError(String),

    /// Failed to navigate to a URL
    #[error("Navigation failed: {0}")]
    NavigationError(String),

    /// Failed to execute JavaScript in the page
    #[error("Script execution failed: {0}")]
    ScriptError(String),

    /// No element matched the locator
    #[error("No element found for {0}")]
    ElementNotFound(String),

    /// Another element would receive the click (overlay, animation, sticky header)
    #[error("Click intercepted: {0}")]
    ClickIntercepted(String),

    /// Any other element-level failure (stale handle, not interactable)
    #[error("Element operation failed: {0}")]
    ElementError(String),

    /// An alert was expected but none is open
    #[error("No alert present")]
    NoAlertPresent,

    /// Operation timed out
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The surface reported a viewport that cannot partition a page
    #[error("Invalid capture surface: viewport height {0} must be positive")]
    InvalidSurface(i64),

    /// A single viewport capture failed during a full-page stitch
    #[error("Viewport capture failed at scroll offset {offset}: {source}")]
    CaptureError {
        offset: i64,
        #[source]
        source: Box<Error>,
    },

    /// Stitching produced no segments
    #[error("Full-page capture produced no segments")]
    EmptyPage,

    /// Restoring the scroll position failed; `cause` carries the error that
    /// was already propagating, if any
    #[error("Failed to restore scroll position: {restore}{}", cause_suffix(.cause))]
    ScrollRestoreFailed {
        restore: Box<Error>,
        cause: Option<Box<Error>>,
    },

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error while persisting artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

fn cause_suffix(cause: &Option<Box<Error>>) -> String {
    match cause {
        Some(c) => format!(" (while handling: {})", c),
        None => String::new(),
    }
}

impl Error {
    /// Whether a failed click is worth retrying
    pub fn is_click_retryable(&self) -> bool {
        matches!(self, Error::ClickIntercepted(_))
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
