use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch failed for {url} after {attempts} attempts (last status: {last_status:?}): {reason}")]
    Fetch {
        url: String,
        attempts: u32,
        last_status: Option<u16>,
        reason: String,
    },

    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("server error {status} from {url}")]
    ServerStatus { status: u16, url: String },

    #[error("extraction failed for {context}: {reason}")]
    Extraction { context: String, reason: String },

    #[error("event {event_id} does not exist")]
    EventNotFound { event_id: String },

    #[error("search unavailable: all {targets_failed} fetch targets failed")]
    SearchUnavailable { targets_failed: usize },

    #[error("browser session error: {reason}")]
    Browser { reason: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
