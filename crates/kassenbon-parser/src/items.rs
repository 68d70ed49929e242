//! Line-item extraction from article fragments.
//!
//! Every product on a receipt is rendered as one or more
//! `<span class="article">` fragments. One fragment usually carries the
//! `data-art-*` attributes, another (bold-styled) carries the printed line
//! total, and the same article number can legitimately reappear with a
//! different description on one receipt (re-purchased under a promo), so
//! fragments are grouped by the (article id, description) composite key
//! rather than by id alone.

use std::collections::HashMap;

use kassenbon_core::amount::parse_amount;
use kassenbon_core::{ItemUnit, LineItem};

use crate::markup::{self, SpanFragment};

/// Maximum difference between a bold-printed amount and `unit_price ×
/// quantity` for the amount to be accepted as the line total.
///
/// This is a heuristic tied to the portal's rendering: bold text also carries
/// repeated unit prices, and the tolerance is what tells the true total
/// apart. Use [`extract_line_items_with_tolerance`] if the site's format
/// drifts.
pub const LINE_TOTAL_TOLERANCE: f64 = 0.01;

/// Text markers that identify a weighed (per-kilogram) item.
const WEIGHT_MARKERS: [&str; 2] = ["EUR/kg", "kg"];

/// Extracts all line items from a receipt document, in document order.
#[must_use]
pub fn extract_line_items(html: &str) -> Vec<LineItem> {
    extract_line_items_with_tolerance(html, LINE_TOTAL_TOLERANCE)
}

/// [`extract_line_items`] with a caller-chosen bold-total tolerance.
#[must_use]
pub fn extract_line_items_with_tolerance(html: &str, tolerance: f64) -> Vec<LineItem> {
    let fragments: Vec<SpanFragment<'_>> = markup::spans(html)
        .into_iter()
        .filter(|s| markup::has_class(s.attrs, "article"))
        .collect();
    if fragments.is_empty() {
        tracing::debug!("no article fragments in receipt document");
        return Vec::new();
    }

    // Group fragments by (article id, description), first-seen order.
    let mut order: Vec<(String, String)> = Vec::new();
    let mut groups: HashMap<(String, String), Vec<&SpanFragment<'_>>> = HashMap::new();
    for fragment in &fragments {
        let Some(art_id) = markup::attr(fragment.attrs, "data-art-id") else {
            continue;
        };
        if art_id.is_empty() {
            continue;
        }
        let description = markup::attr(fragment.attrs, "data-art-description").unwrap_or_default();
        let key = (art_id, description);
        if let Some(group) = groups.get_mut(&key) {
            group.push(fragment);
        } else {
            order.push(key.clone());
            groups.insert(key, vec![fragment]);
        }
    }

    order
        .iter()
        .filter_map(|key| resolve_group(&groups[key], tolerance))
        .collect()
}

/// Resolves one fragment group to a line item, or `None` when the group is
/// markup debris (no description and no resolvable price). Partial fragments
/// are expected, not an error.
fn resolve_group(fragments: &[&SpanFragment<'_>], tolerance: f64) -> Option<LineItem> {
    let description = first_attr(fragments, "data-art-description").unwrap_or_default();
    let quantity_raw = first_attr(fragments, "data-art-quantity");
    let price_raw = first_attr(fragments, "data-unit-price");

    let quantity = match quantity_raw.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_amount(raw).unwrap_or_else(|| {
            tracing::debug!(raw, "unparsable article quantity, defaulting to 1");
            1.0
        }),
        _ => 1.0,
    };
    let price = match price_raw.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => parse_amount(raw).unwrap_or_else(|| {
            tracing::debug!(raw, "unparsable unit price, defaulting to 0");
            0.0
        }),
        _ => 0.0,
    };

    let bold_total = resolve_line_total(fragments, price, quantity, tolerance);
    if description.is_empty() && price <= 0.0 && bold_total.is_none() {
        tracing::debug!("dropping article fragment group with neither description nor price");
        return None;
    }

    let unit = if fragments.iter().any(|f| {
        let text = markup::text_content(f.inner);
        WEIGHT_MARKERS.iter().any(|marker| text.contains(marker))
    }) {
        ItemUnit::Weight
    } else {
        ItemUnit::Piece
    };

    Some(LineItem {
        name: description,
        price,
        quantity,
        unit,
    })
}

/// Locates the printed line total among a group's bold fragments.
///
/// A bold amount is accepted only when it equals `unit_price × quantity`
/// within `tolerance`; that check distinguishes the true total from other
/// bold decimal text such as a repeated unit price. Returns `None` when no
/// candidate passes, in which case the declared unit price stands in as the
/// line total.
fn resolve_line_total(
    fragments: &[&SpanFragment<'_>],
    unit_price: f64,
    quantity: f64,
    tolerance: f64,
) -> Option<f64> {
    let expected = unit_price * quantity;
    for fragment in fragments {
        if !markup::has_class(fragment.attrs, "css_bold") {
            continue;
        }
        let text = markup::text_content(fragment.inner);
        let text = text.trim();
        if !is_plain_amount(text) {
            continue;
        }
        if let Some(candidate) = parse_amount(text) {
            if (candidate - expected).abs() < tolerance {
                return Some(candidate);
            }
        }
    }
    None
}

/// First non-empty value of `name` across the group's fragments.
fn first_attr(fragments: &[&SpanFragment<'_>], name: &str) -> Option<String> {
    fragments
        .iter()
        .filter_map(|f| markup::attr(f.attrs, name))
        .find(|v| !v.trim().is_empty())
}

/// `^\d+,\d+$` without a regex: the exact shape of a printed amount.
pub(crate) fn is_plain_amount(text: &str) -> bool {
    let Some((int_part, frac_part)) = text.split_once(',') else {
        return false;
    };
    !int_part.is_empty()
        && !frac_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}
