//! Receipt assembly.

use kassenbon_core::Receipt;

use crate::items::extract_line_items;
use crate::reconcile::{extract_declared_total, reconcile};
use crate::savings::extract_savings;

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;

/// Parses one printed-receipt HTML document into a canonical [`Receipt`].
///
/// Identifier, purchase date, and store come from the caller (the listing
/// API knows them; the HTML body does not). The transformation is pure and
/// best-effort: a document in which nothing is recognizable still yields a
/// record, with an empty item list and unset totals.
#[must_use]
pub fn parse_receipt(html: &str, receipt_id: &str, purchase_date: &str, store: &str) -> Receipt {
    let items = extract_line_items(html);
    if items.is_empty() {
        tracing::debug!(receipt_id, "no line items extracted from receipt");
    }
    let savings = extract_savings(html);
    let declared_total = extract_declared_total(html);
    let totals = reconcile(&items, &savings, declared_total);

    Receipt {
        id: receipt_id.to_string(),
        purchase_date: purchase_date.to_string(),
        total_price: totals.total_price,
        total_price_no_saving: totals.total_price_no_saving,
        saved_amount: positive(savings.regular),
        saved_pfand: positive(savings.deposit),
        lidlplus_saved_amount: positive(savings.loyalty),
        store: store.to_string(),
        items,
    }
}

/// Discount fields are set only when a discount was actually found.
fn positive(value: f64) -> Option<f64> {
    (value > 0.0).then_some(value)
}
