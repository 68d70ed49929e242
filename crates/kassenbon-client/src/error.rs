use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unauthorized at {url} (portal session cookies expired or missing)")]
    Unauthorized { url: String },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot read cookie file {path}: {source}")]
    CookieFileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cookie file {path} is not a recognized browser export: {source}")]
    CookieFileFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cookie file {path} has no cookies for domain \"{domain}\"")]
    NoCookiesForDomain { path: PathBuf, domain: String },

    #[error("ticket {ticket_id} has no printed-receipt HTML")]
    MissingReceiptHtml { ticket_id: String },

    #[error("pagination limit reached: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: usize },
}
