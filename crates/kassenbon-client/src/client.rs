//! HTTP client for the portal's ticket API.
//!
//! Wraps `reqwest` with cookie-based authentication, typed status mapping,
//! pagination over the listing endpoint, and automatic retry on transient
//! errors. The endpoints are the ones the portal's own web app calls; there
//! is no public API contract, so every response goes through the tolerant
//! shapes in [`crate::types`].

use std::time::Duration;

use reqwest::Client;

use kassenbon_core::AppConfig;

use crate::error::ClientError;
use crate::retry::retry_with_backoff;
use crate::types::{TicketDetail, TicketSummary, TicketsResponse};

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

/// Hard ceiling on listing pages per run, independent of configuration.
/// Prevents infinite loops on a broken paging envelope.
const MAX_PAGES: usize = 200;

/// Client for the portal's ticket API.
///
/// Authentication is a pre-built `Cookie` header from
/// [`crate::session::load_cookie_header`]; the client itself never logs in.
pub struct PortalClient {
    client: Client,
    base_url: String,
    country: String,
    language: String,
    cookie_header: String,
    request_delay_ms: u64,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl PortalClient {
    /// Creates a client from the application configuration and a session
    /// cookie header.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(config: &AppConfig, cookie_header: String) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country: config.country.clone(),
            language: config.language.clone(),
            cookie_header,
            request_delay_ms: config.request_delay_ms,
            max_retries: config.max_retries,
            backoff_base_secs: config.retry_backoff_base_secs,
        })
    }

    /// Fetches ticket summaries from the listing endpoint, newest first as
    /// the portal serves them.
    ///
    /// Pages are fetched until `page_budget` pages have been seen, the
    /// envelope's declared page count is reached, or a page comes back
    /// empty. A `page_budget` of `0` means every declared page — a full
    /// backfill, still bounded by [`MAX_PAGES`].
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] when the session cookies are expired.
    /// - [`ClientError::RateLimited`] — HTTP 429 after all retries.
    /// - [`ClientError::PaginationLimit`] past [`MAX_PAGES`] pages.
    /// - [`ClientError::Http`] / [`ClientError::UnexpectedStatus`] /
    ///   [`ClientError::Deserialize`] on transport or shape failures.
    pub async fn list_ticket_summaries(
        &self,
        page_budget: u32,
    ) -> Result<Vec<TicketSummary>, ClientError> {
        let mut summaries: Vec<TicketSummary> = Vec::new();
        let mut declared_pages: Option<u64> = None;
        let mut page = 1u32;

        loop {
            if page as usize > MAX_PAGES {
                return Err(ClientError::PaginationLimit {
                    max_pages: MAX_PAGES,
                });
            }
            if page > 1 && self.request_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.request_delay_ms)).await;
            }

            let response = self.fetch_tickets_page(page).await?;
            if declared_pages.is_none() {
                declared_pages = response.total_pages();
            }
            let entries = response.entries();
            if entries.is_empty() {
                break;
            }
            summaries.extend(entries.into_iter().map(crate::types::TicketEntry::into_summary));

            let page_budget_spent = page_budget > 0 && page >= page_budget;
            let declared_spent = declared_pages.is_some_and(|total| u64::from(page) >= total);
            if page_budget_spent || declared_spent {
                break;
            }
            page += 1;
        }

        tracing::info!(count = summaries.len(), pages = page, "fetched ticket listing");
        Ok(summaries)
    }

    /// Fetches one ticket's full detail, including the printed-receipt HTML
    /// when the portal has it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Unauthorized`] when the session cookies are expired.
    /// - [`ClientError::NotFound`] for an unknown ticket id.
    /// - [`ClientError::RateLimited`] — HTTP 429 after all retries.
    /// - [`ClientError::Http`] / [`ClientError::UnexpectedStatus`] /
    ///   [`ClientError::Deserialize`] on transport or shape failures.
    pub async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketDetail, ClientError> {
        let url = self.ticket_url(ticket_id);
        let body = self.request_json(&url).await?;
        serde_json::from_value(body).map_err(|source| ClientError::Deserialize {
            context: format!("ticket detail for {ticket_id}"),
            source,
        })
    }

    /// [`Self::fetch_ticket`] plus extraction of the printed-receipt HTML.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingReceiptHtml`] when the detail carries no HTML
    /// body (legacy records), plus everything [`Self::fetch_ticket`] returns.
    pub async fn fetch_receipt_html(
        &self,
        ticket_id: &str,
    ) -> Result<(TicketDetail, String), ClientError> {
        let mut detail = self.fetch_ticket(ticket_id).await?;
        let html = detail
            .html_printed_receipt
            .take()
            .filter(|html| !html.trim().is_empty())
            .ok_or_else(|| ClientError::MissingReceiptHtml {
                ticket_id: ticket_id.to_string(),
            })?;
        Ok((detail, html))
    }

    async fn fetch_tickets_page(&self, page: u32) -> Result<TicketsResponse, ClientError> {
        let url = self.tickets_url(page);
        let body = self.request_json(&url).await?;
        serde_json::from_value(body).map_err(|source| ClientError::Deserialize {
            context: format!("ticket listing page {page}"),
            source,
        })
    }

    /// Sends an authenticated GET with retry, maps non-2xx statuses to typed
    /// errors, and parses the body as JSON.
    async fn request_json(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.to_owned();
            async move {
                let response = self
                    .client
                    .get(&url)
                    .header(reqwest::header::COOKIE, &self.cookie_header)
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN
                {
                    return Err(ClientError::Unauthorized { url });
                }
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ClientError::RateLimited {
                        domain: extract_domain(&self.base_url),
                        retry_after_secs,
                    });
                }
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Err(ClientError::NotFound { url });
                }
                if !status.is_success() {
                    return Err(ClientError::UnexpectedStatus {
                        status: status.as_u16(),
                        url,
                    });
                }

                let body = response.text().await?;
                serde_json::from_str(&body).map_err(|source| ClientError::Deserialize {
                    context: url,
                    source,
                })
            }
        })
        .await
    }

    fn tickets_url(&self, page: u32) -> String {
        format!(
            "{}/mre/api/v1/tickets?country={}&page={page}",
            self.base_url, self.country
        )
    }

    fn ticket_url(&self, ticket_id: &str) -> String {
        format!(
            "{}/mre/api/v1/tickets/{ticket_id}?country={}&languageCode={}",
            self.base_url, self.country, self.language
        )
    }
}

/// Normalizes a portal-supplied timestamp to the stored date format:
/// `DD.MM.YYYY HH:MM`, or `DD.MM.YYYY` when no time is present.
///
/// The API serves ISO 8601 (with or without offset); already-normalized
/// values pass through, and anything unrecognized is returned trimmed so a
/// human can still read it in the dataset.
#[must_use]
pub fn normalize_purchase_date(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(stamp) = chrono::DateTime::parse_from_rfc3339(raw) {
        return stamp.format("%d.%m.%Y %H:%M").to_string();
    }
    if let Ok(stamp) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return stamp.format("%d.%m.%Y %H:%M").to_string();
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%d.%m.%Y").to_string();
    }
    raw.to_string()
}

/// Hostname of the portal, for error messages.
fn extract_domain(base_url: &str) -> String {
    let without_scheme = base_url
        .strip_prefix("https://")
        .or_else(|| base_url.strip_prefix("http://"))
        .unwrap_or(base_url);
    without_scheme
        .split('/')
        .next()
        .unwrap_or(without_scheme)
        .to_string()
}
