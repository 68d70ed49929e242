//! Receipt HTML parsing and normalization.
//!
//! The portal's printed-receipt HTML has no stable schema: every value is a
//! loosely tagged `<span>` fragment, prices and discounts are rendered text,
//! and one logical product is often split across several fragments. This
//! crate turns one such document into a canonical
//! [`kassenbon_core::Receipt`] — a pure, synchronous transformation with no
//! I/O, safe to run concurrently across receipts.
//!
//! Extraction is best-effort throughout: a missing fragment or malformed
//! number degrades the affected field, never the whole record.

pub mod assemble;
pub mod items;
mod markup;
pub mod reconcile;
pub mod savings;

pub use assemble::parse_receipt;
pub use items::{extract_line_items, extract_line_items_with_tolerance, LINE_TOTAL_TOLERANCE};
pub use reconcile::{extract_declared_total, reconcile, Totals};
pub use savings::{extract_savings, Savings};
