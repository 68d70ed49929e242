//! Bottom-up total reconciliation.
//!
//! The portal's own total has been observed unreliable (zero or stale on
//! some receipts), so the paid amount is recomputed from the parsed items
//! and savings whenever item extraction produced anything. The declared
//! total from the summary block is kept only as the degraded answer for
//! receipts whose items could not be parsed.

use regex::Regex;

use kassenbon_core::amount::parse_amount;
use kassenbon_core::LineItem;

use crate::items::is_plain_amount;
use crate::markup;
use crate::savings::Savings;

/// Text of the final-amount summary line.
const AMOUNT_DUE_MARKER: &str = "zu zahlen";
/// `id` prefix of the summary spans that carry the amount-due line.
const SUMMARY_ID_PREFIX: &str = "purchase_summary";
/// `id` of the tender-information span whose second-to-last token is the
/// paid amount on older receipt layouts.
const TENDER_INFO_ID: &str = "purchase_tender_information_5";

/// Reconciled receipt totals.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Totals {
    /// Sum of `unit_price × quantity` over all items, before discounts.
    /// `None` when item extraction yielded nothing usable.
    pub total_price_no_saving: Option<f64>,
    /// Amount actually paid. Recomputed from items and savings when
    /// possible, the vendor-declared total otherwise.
    pub total_price: Option<f64>,
}

/// Derives both totals from parsed items and savings.
///
/// When the item sum is positive, the paid amount is the item sum minus all
/// savings categories, and a positive result overrides `declared_total`.
/// When item extraction yielded nothing, `declared_total` stands in.
#[must_use]
pub fn reconcile(items: &[LineItem], savings: &Savings, declared_total: Option<f64>) -> Totals {
    let gross: f64 = items.iter().map(LineItem::line_total).sum();
    if gross <= 0.0 {
        return Totals {
            total_price_no_saving: None,
            total_price: declared_total,
        };
    }
    let paid = gross - savings.total();
    Totals {
        total_price_no_saving: Some(gross),
        total_price: if paid > 0.0 { Some(paid) } else { declared_total },
    }
}

/// Extracts the vendor-declared paid amount from the receipt summary.
///
/// Looks for the amount-due line inside the summary spans first, then falls
/// back to a whole-page text scan, then to the tender-information span of
/// older layouts. Returns `None` when no layout matches.
#[must_use]
pub fn extract_declared_total(html: &str) -> Option<f64> {
    let spans = markup::spans(html);

    for span in &spans {
        let id = markup::attr(span.attrs, "id").unwrap_or_default();
        if !id.starts_with(SUMMARY_ID_PREFIX) {
            continue;
        }
        let text = markup::text_content(span.inner);
        if !text.contains(AMOUNT_DUE_MARKER) {
            continue;
        }
        // The amount itself is printed bold within the summary block.
        for inner in markup::spans(span.inner) {
            if !markup::has_class(inner.attrs, "css_bold") {
                continue;
            }
            let candidate = markup::text_content(inner.inner);
            let candidate = candidate.trim();
            if is_plain_amount(candidate) {
                if let Some(amount) = parse_amount(candidate) {
                    return Some(amount);
                }
            }
        }
        if let Some(amount) = last_amount_on_marker_line(&text) {
            return Some(amount);
        }
    }

    let page_text = markup::text_content(html);
    if let Some(amount) = last_amount_on_marker_line(&page_text) {
        return Some(amount);
    }

    for span in &spans {
        if markup::attr(span.attrs, "id").as_deref() != Some(TENDER_INFO_ID) {
            continue;
        }
        let text = markup::text_content(span.inner);
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        if let Some(amount) = parse_amount(tokens[tokens.len() - 2]) {
            return Some(amount);
        }
    }
    None
}

/// Last decimal amount on the line carrying the amount-due marker.
fn last_amount_on_marker_line(text: &str) -> Option<f64> {
    let amount = Regex::new(r"\d+,\d+").expect("valid regex");
    text.lines()
        .find(|line| line.contains(AMOUNT_DUE_MARKER))
        .and_then(|line| amount.find_iter(line).last())
        .and_then(|m| parse_amount(m.as_str()))
}
