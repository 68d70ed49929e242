use std::path::PathBuf;

/// Runtime configuration, loaded from env vars by [`crate::config`].
///
/// Every field has a default; the tool is usable with an empty environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the persisted receipt dataset (JSON array).
    pub receipts_path: PathBuf,
    /// Path of the browser-exported cookie file used for authentication.
    pub cookies_path: PathBuf,
    /// Portal origin, e.g. `https://www.lidl.de`.
    pub base_url: String,
    /// Country code passed to the ticket endpoints.
    pub country: String,
    /// Language code passed to the receipt-detail endpoint.
    pub language: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    /// Pause between receipt fetches; the portal is someone else's server.
    pub request_delay_ms: u64,
    /// How many listing pages an `update` run inspects for new receipts.
    pub pages_to_check: u32,
    pub max_retries: u32,
    /// Base delay for exponential retry backoff: `base * 2^attempt` seconds.
    pub retry_backoff_base_secs: u64,
    pub user_agent: String,
}
