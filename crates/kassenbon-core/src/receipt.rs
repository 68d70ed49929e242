//! Canonical receipt records.
//!
//! ## Persisted JSON shape
//!
//! The on-disk dataset is an array of receipt objects. Amounts are stored as
//! comma-decimal strings exactly as the portal prints them (`"7,47"`), unset
//! totals as `null`, and the item unit as `"stk"` / `"kg"`. The serde
//! adapters in [`crate::amount`] keep the in-memory representation numeric.

use serde::{Deserialize, Serialize};

/// One purchase event, assembled from a single receipt HTML document plus the
/// identifier/date/store context the listing API provides.
///
/// Invariant: whenever `total_price_no_saving` is set,
/// `total_price = total_price_no_saving − saved_amount − saved_pfand −
/// lidlplus_saved_amount` (each unset saving counting as zero). All saving
/// fields are non-negative magnitudes even though the receipt renders them as
/// negative deltas. Records are immutable once assembled; the store replaces
/// whole records by `id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Vendor-assigned receipt identifier, the dedup key in storage.
    pub id: String,
    /// `DD.MM.YYYY HH:MM` or `DD.MM.YYYY`, pre-extracted by the API client.
    pub purchase_date: String,
    /// Amount actually paid. Always recomputed bottom-up from the items when
    /// they were extracted; the vendor-declared total is only a degraded
    /// fallback (it has been observed as zero or stale).
    #[serde(with = "crate::amount::comma_opt")]
    pub total_price: Option<f64>,
    /// Sum of all line items before any discount.
    #[serde(with = "crate::amount::comma_opt")]
    pub total_price_no_saving: Option<f64>,
    /// Regular discounts (price-advantage and generic rebate lines).
    #[serde(with = "crate::amount::comma_opt")]
    pub saved_amount: Option<f64>,
    /// Returned container deposits.
    #[serde(with = "crate::amount::comma_opt")]
    pub saved_pfand: Option<f64>,
    /// Loyalty-program discount, tracked separately from regular rebates.
    #[serde(with = "crate::amount::comma_opt")]
    pub lidlplus_saved_amount: Option<f64>,
    pub store: String,
    pub items: Vec<LineItem>,
}

impl Receipt {
    /// Sum of all savings categories, unset categories counting as zero.
    #[must_use]
    pub fn total_savings(&self) -> f64 {
        self.saved_amount.unwrap_or(0.0)
            + self.saved_pfand.unwrap_or(0.0)
            + self.lidlplus_saved_amount.unwrap_or(0.0)
    }

    /// Returns `true` if item extraction produced nothing usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One product entry on a receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    /// Product description as declared in the markup.
    pub name: String,
    /// Declared unit price, not the line total.
    #[serde(with = "crate::amount::comma")]
    pub price: f64,
    /// Piece count, or a fractional mass for weight-based items.
    #[serde(with = "crate::amount::comma")]
    pub quantity: f64,
    pub unit: ItemUnit,
}

impl LineItem {
    /// `price × quantity`, the line's contribution to the gross total.
    #[must_use]
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity
    }
}

/// How an item's quantity is measured, inferred from weight markers
/// (`"kg"`, `"EUR/kg"`) in the article markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemUnit {
    /// Counted pieces; quantity is conventionally integral.
    #[serde(rename = "stk")]
    Piece,
    /// Weighed goods; quantity is a mass in kilograms.
    #[serde(rename = "kg")]
    Weight,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(name: &str, price: f64, quantity: f64) -> LineItem {
        LineItem {
            name: name.to_string(),
            price,
            quantity,
            unit: ItemUnit::Piece,
        }
    }

    fn make_receipt(items: Vec<LineItem>) -> Receipt {
        Receipt {
            id: "250101-0001".to_string(),
            purchase_date: "01.01.2025 12:30".to_string(),
            total_price: Some(6.47),
            total_price_no_saving: Some(7.47),
            saved_amount: Some(1.0),
            saved_pfand: None,
            lidlplus_saved_amount: None,
            store: "Hauptstr. 1".to_string(),
            items,
        }
    }

    #[test]
    fn line_total_multiplies_price_and_quantity() {
        let item = make_item("Milch", 1.99, 2.0);
        assert!((item.line_total() - 3.98).abs() < 1e-9);
    }

    #[test]
    fn total_savings_treats_unset_as_zero() {
        let receipt = make_receipt(vec![]);
        assert!((receipt.total_savings() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn total_savings_sums_all_categories() {
        let mut receipt = make_receipt(vec![]);
        receipt.saved_pfand = Some(0.25);
        receipt.lidlplus_saved_amount = Some(0.5);
        assert!((receipt.total_savings() - 1.75).abs() < 1e-9);
    }

    #[test]
    fn is_empty_reflects_item_list() {
        assert!(make_receipt(vec![]).is_empty());
        assert!(!make_receipt(vec![make_item("Brot", 3.49, 1.0)]).is_empty());
    }

    #[test]
    fn amounts_serialize_as_comma_strings() {
        let receipt = make_receipt(vec![make_item("Milch", 1.99, 2.0)]);
        let json = serde_json::to_value(&receipt).expect("serialization failed");
        assert_eq!(json["total_price"], "6,47");
        assert_eq!(json["total_price_no_saving"], "7,47");
        assert_eq!(json["saved_amount"], "1,00");
        assert_eq!(json["saved_pfand"], serde_json::Value::Null);
        assert_eq!(json["items"][0]["price"], "1,99");
        assert_eq!(json["items"][0]["quantity"], "2,00");
        assert_eq!(json["items"][0]["unit"], "stk");
    }

    #[test]
    fn serde_round_trips_receipt() {
        let receipt = make_receipt(vec![make_item("Milch", 1.99, 2.0)]);
        let json = serde_json::to_string(&receipt).expect("serialization failed");
        let decoded: Receipt = serde_json::from_str(&json).expect("deserialization failed");
        assert_eq!(decoded.id, receipt.id);
        assert_eq!(decoded.total_price, Some(6.47));
        assert_eq!(decoded.items.len(), 1);
        assert_eq!(decoded.items[0].unit, ItemUnit::Piece);
        assert!((decoded.items[0].quantity - 2.0).abs() < 1e-9);
    }

    #[test]
    fn weight_unit_round_trips_as_kg() {
        let mut item = make_item("Bananen", 1.29, 0.742);
        item.unit = ItemUnit::Weight;
        let json = serde_json::to_value(&item).expect("serialization failed");
        assert_eq!(json["unit"], "kg");
        let decoded: LineItem = serde_json::from_value(json).expect("deserialization failed");
        assert_eq!(decoded.unit, ItemUnit::Weight);
    }
}
