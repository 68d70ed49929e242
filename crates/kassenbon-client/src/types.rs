//! Response types for the portal's ticket API.
//!
//! The portal has shipped several shapes for the same endpoints over time:
//! the listing is sometimes a paging envelope and sometimes a bare array,
//! entries are sometimes wrapped in a `{"ticket": ...}` object, the store is
//! sometimes a string and sometimes an object, and the vendor-reported
//! amount switches between number and string. Untagged enums absorb all
//! observed variants; unknown fields are ignored.

use serde::Deserialize;

/// One page of the ticket listing, either as a paging envelope or as a bare
/// array of entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TicketsResponse {
    Page(TicketsPage),
    List(Vec<TicketEntry>),
}

impl TicketsResponse {
    /// Entries of this page, whichever shape was served.
    #[must_use]
    pub fn entries(self) -> Vec<TicketEntry> {
        match self {
            Self::Page(page) => {
                if page.tickets.is_empty() {
                    page.records
                } else {
                    page.tickets
                }
            }
            Self::List(entries) => entries,
        }
    }

    /// Total number of pages, when the envelope declares its size.
    #[must_use]
    pub fn total_pages(&self) -> Option<u64> {
        let Self::Page(page) = self else {
            return None;
        };
        let (total, size) = (page.total_count?, page.size?);
        if size == 0 {
            return None;
        }
        Some(total.div_ceil(size))
    }
}

/// Paging envelope; `tickets` and `records` are alternate names the portal
/// has used for the same array.
#[derive(Debug, Deserialize)]
pub struct TicketsPage {
    #[serde(default)]
    pub tickets: Vec<TicketEntry>,
    #[serde(default)]
    pub records: Vec<TicketEntry>,
    #[serde(default, rename = "totalCount")]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub size: Option<u64>,
}

/// One listing entry, flat or wrapped.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TicketEntry {
    Wrapped { ticket: TicketSummary },
    Flat(TicketSummary),
}

impl TicketEntry {
    #[must_use]
    pub fn into_summary(self) -> TicketSummary {
        match self {
            Self::Wrapped { ticket } => ticket,
            Self::Flat(summary) => summary,
        }
    }
}

/// Listing-level ticket metadata.
#[derive(Debug, Deserialize)]
pub struct TicketSummary {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    /// `false` on legacy records whose detail endpoint serves no HTML.
    #[serde(default, rename = "isHtml")]
    pub is_html: Option<bool>,
    #[serde(default)]
    pub store: Option<StoreField>,
}

/// Full ticket detail, including the printed-receipt HTML body.
#[derive(Debug, Deserialize)]
pub struct TicketDetail {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Vendor-reported total. Unreliable in practice (zero or stale); kept
    /// for diagnostics, never persisted as-is.
    #[serde(default, rename = "totalAmount")]
    pub total_amount: Option<AmountField>,
    #[serde(default, rename = "htmlPrintedReceipt")]
    pub html_printed_receipt: Option<String>,
    #[serde(default)]
    pub store: Option<StoreField>,
}

/// Store reference, served as a bare name or as a structured object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum StoreField {
    Name(String),
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        address: Option<String>,
        #[serde(default)]
        locality: Option<String>,
    },
}

impl StoreField {
    /// Human-readable store label; empty string when the object carries
    /// nothing usable.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Name(name) => name.clone(),
            Self::Object {
                name,
                address,
                locality,
            } => [name.as_deref(), address.as_deref(), locality.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Numeric field that the portal serves as number or string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountField {
    Number(f64),
    Text(String),
}

impl AmountField {
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().replace(',', ".").parse().ok(),
        }
    }
}
