//! Client for the retail portal's ticket API.
//!
//! Fetches the paginated ticket listing and individual ticket details
//! (including the printed-receipt HTML) using session cookies exported from
//! a logged-in browser. Transient failures are retried with exponential
//! backoff; everything else surfaces as a typed [`ClientError`].

pub mod client;
pub mod error;
mod retry;
pub mod session;
pub mod types;

pub use client::{normalize_purchase_date, PortalClient};
pub use error::ClientError;
pub use session::load_cookie_header;
pub use types::{StoreField, TicketDetail, TicketSummary};
