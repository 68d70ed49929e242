//! Discount-line classification.
//!
//! The receipt carries no structured discount-type field — only rendered
//! text. Classification is therefore lexical and locale-specific (de-DE
//! keyword set below); the keyword table is the single point to extend for a
//! second locale.
//!
//! Three categories are extracted: regular discounts (price-advantage and
//! generic rebate lines), returned container deposits, and the
//! loyalty-program discount reported in its own summary box.

use regex::Regex;

use kassenbon_core::amount::parse_amount;

use crate::markup;

/// Price-advantage discount line.
const PRICE_ADVANTAGE_MARKER: &str = "Preisvorteil";
/// Prefix of the "grand total of price advantages" subtotal line, which must
/// not be summed a second time.
const GRAND_TOTAL_MARKER: &str = "Gesamter";
/// Generic rebate line.
const REBATE_MARKER: &str = "Rabatt";
/// Loyalty-program rebate line; tracked separately, never a regular saving.
const LOYALTY_REBATE_MARKER: &str = "Lidl Plus Rabatt";
/// Deposit-return line.
const DEPOSIT_RETURN_MARKER: &str = "Pfandrückgabe";
/// Suffix of the loyalty summary box text, e.g. `"1,50 EUR gespart"`.
const LOYALTY_SAVED_MARKER: &str = "EUR gespart";

/// Non-negative savings sums for one receipt, by category.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Savings {
    /// Price-advantage and generic rebate lines.
    pub regular: f64,
    /// Returned container deposits.
    pub deposit: f64,
    /// Loyalty-program discount.
    pub loyalty: f64,
}

impl Savings {
    /// Sum across all categories.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.regular + self.deposit + self.loyalty
    }
}

/// Extracts all savings categories from a receipt document. Lines whose
/// amounts do not parse are skipped; a document without any discount lines
/// yields all-zero sums.
#[must_use]
pub fn extract_savings(html: &str) -> Savings {
    let purchase_text = purchase_list_text(html);
    Savings {
        regular: regular_savings(&purchase_text),
        deposit: deposit_savings(&purchase_text),
        loyalty: loyalty_savings(html).unwrap_or(0.0),
    }
}

/// Rendered text of the purchase-line container, empty when absent.
fn purchase_list_text(html: &str) -> String {
    markup::spans(html)
        .into_iter()
        .find(|s| markup::has_class(s.attrs, "purchase_list"))
        .map(|s| markup::text_content(s.inner))
        .unwrap_or_default()
}

/// Sums the trailing negative amounts of regular discount lines.
fn regular_savings(purchase_text: &str) -> f64 {
    let negative_amount = Regex::new(r"-(\d+,\d+)").expect("valid regex");
    let mut total = 0.0;
    for line in purchase_text.lines() {
        let is_price_advantage =
            line.contains(PRICE_ADVANTAGE_MARKER) && !line.contains(GRAND_TOTAL_MARKER);
        let is_plain_rebate =
            line.contains(REBATE_MARKER) && !line.contains(LOYALTY_REBATE_MARKER);
        if !(is_price_advantage || is_plain_rebate) {
            continue;
        }
        if let Some(cap) = negative_amount.captures(line) {
            if let Some(amount) = parse_amount(&cap[1]) {
                total += amount;
            }
        }
    }
    total
}

/// Sums deposit-return amounts (as positive magnitudes).
///
/// Direct `Pfandrückgabe` lines win. When none carry an amount, deposit
/// returns are estimated from `N x -M,MM` calculation lines; only negative
/// unit prices count, because ordinary multi-quantity purchases render the
/// same shape with a positive price.
fn deposit_savings(purchase_text: &str) -> f64 {
    let direct = Regex::new(&format!(r"{DEPOSIT_RETURN_MARKER}\s*(-?\d+,\d+)"))
        .expect("valid regex");
    let mut total = 0.0;
    for cap in direct.captures_iter(purchase_text) {
        if let Some(amount) = parse_amount(&cap[1]) {
            total += amount.abs();
        }
    }
    if total > 0.0 {
        return total;
    }

    let calculation = Regex::new(r"(-?\d+)\s*x\s*(-?\d+,\d+)").expect("valid regex");
    for cap in calculation.captures_iter(purchase_text) {
        let (Some(quantity), Some(unit_price)) = (parse_amount(&cap[1]), parse_amount(&cap[2]))
        else {
            continue;
        };
        if unit_price < 0.0 {
            total += (quantity * unit_price).abs();
        }
    }
    total
}

/// Loyalty-program savings from the dedicated summary box, with a whole-page
/// text search as fallback.
fn loyalty_savings(html: &str) -> Option<f64> {
    let pattern =
        Regex::new(&format!(r"(\d+,\d+)\s+{LOYALTY_SAVED_MARKER}")).expect("valid regex");
    for span in markup::spans(html) {
        if !markup::has_class(span.attrs, "vat_info") {
            continue;
        }
        let text = markup::text_content(span.inner);
        if !text.contains(LOYALTY_SAVED_MARKER) {
            continue;
        }
        if let Some(amount) = pattern.captures(&text).and_then(|cap| parse_amount(&cap[1])) {
            return Some(amount);
        }
    }
    let page_text = markup::text_content(html);
    pattern
        .captures(&page_text)
        .and_then(|cap| parse_amount(&cap[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn purchase_list(lines: &str) -> String {
        format!(r#"<span class="purchase_list">{lines}</span>"#)
    }

    #[test]
    fn rebate_line_counts_as_regular_saving() {
        let html = purchase_list("Milch 3,98<br/>Rabatt -1,00");
        let savings = extract_savings(&html);
        assert!((savings.regular - 1.0).abs() < 1e-9);
        assert!(savings.deposit.abs() < 1e-9);
        assert!(savings.loyalty.abs() < 1e-9);
    }

    #[test]
    fn price_advantage_line_counts_as_regular_saving() {
        let html = purchase_list("Joghurt 0,89<br/>Preisvorteil -0,20");
        let savings = extract_savings(&html);
        assert!((savings.regular - 0.2).abs() < 1e-9);
    }

    #[test]
    fn grand_total_price_advantage_line_is_excluded() {
        // The pre-summed subtotal would double-count every advantage line.
        let html = purchase_list("Preisvorteil -0,20<br/>Gesamter Preisvorteil -0,20");
        let savings = extract_savings(&html);
        assert!((savings.regular - 0.2).abs() < 1e-9);
    }

    #[test]
    fn loyalty_rebate_line_is_not_a_regular_saving() {
        let html = purchase_list("Lidl Plus Rabatt -0,50");
        let savings = extract_savings(&html);
        assert!(savings.regular.abs() < 1e-9);
        assert!(savings.loyalty.abs() < 1e-9);
    }

    #[test]
    fn multiple_regular_lines_are_summed() {
        let html = purchase_list("Rabatt -1,00<br/>Preisvorteil -0,30<br/>Rabatt -0,25");
        let savings = extract_savings(&html);
        assert!((savings.regular - 1.55).abs() < 1e-9);
    }

    #[test]
    fn rebate_line_without_amount_is_skipped() {
        let html = purchase_list("Rabatt siehe unten<br/>Rabatt -0,50");
        let savings = extract_savings(&html);
        assert!((savings.regular - 0.5).abs() < 1e-9);
    }

    #[test]
    fn direct_deposit_return_line_is_summed_absolute() {
        let html = purchase_list("Pfandrückgabe -0,25<br/>Pfandrückgabe -0,50");
        let savings = extract_savings(&html);
        assert!((savings.deposit - 0.75).abs() < 1e-9);
    }

    #[test]
    fn deposit_fallback_uses_negative_calculation_lines() {
        let html = purchase_list("Leergut<br/>2 x -0,25");
        let savings = extract_savings(&html);
        assert!((savings.deposit - 0.5).abs() < 1e-9);
    }

    #[test]
    fn deposit_fallback_ignores_positive_calculation_lines() {
        // "2 x 1,99" is an ordinary multi-quantity purchase, not a deposit.
        let html = purchase_list("Milch<br/>2 x 1,99<br/>Leergut<br/>1 x -0,15");
        let savings = extract_savings(&html);
        assert!((savings.deposit - 0.15).abs() < 1e-9);
    }

    #[test]
    fn direct_deposit_line_wins_over_fallback() {
        let html = purchase_list("Pfandrückgabe -0,25<br/>3 x -0,25");
        let savings = extract_savings(&html);
        assert!((savings.deposit - 0.25).abs() < 1e-9);
    }

    #[test]
    fn loyalty_savings_come_from_the_vat_info_box() {
        let html = format!(
            "{}{}",
            purchase_list("Milch 1,99"),
            r#"<span class="vat_info">Mit Lidl Plus 1,50 EUR gespart</span>"#,
        );
        let savings = extract_savings(&html);
        assert!((savings.loyalty - 1.5).abs() < 1e-9);
    }

    #[test]
    fn loyalty_savings_fall_back_to_whole_page_search() {
        let html = format!(
            "{}{}",
            purchase_list("Milch 1,99"),
            "<span>Du hast heute 0,75 EUR gespart</span>",
        );
        let savings = extract_savings(&html);
        assert!((savings.loyalty - 0.75).abs() < 1e-9);
    }

    #[test]
    fn document_without_purchase_list_yields_zero_savings() {
        let savings = extract_savings("<span class=\"header\">Lidl sagt danke</span>");
        assert_eq!(savings, Savings::default());
    }

    #[test]
    fn total_sums_all_categories() {
        let savings = Savings {
            regular: 1.0,
            deposit: 0.25,
            loyalty: 0.5,
        };
        assert!((savings.total() - 1.75).abs() < 1e-9);
    }
}
