use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("browser unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("timed out after {secs}s loading {url}")]
    Timeout { url: String, secs: u64 },

    #[error("failed to read rendered content from {url}: {reason}")]
    Content { url: String, reason: String },

    #[error("no listings found at {url}")]
    NoResults { url: String },
}
