//! Spending summary over the local dataset.

use std::collections::BTreeMap;

use kassenbon_core::amount::format_amount;
use kassenbon_core::{AppConfig, Receipt};
use kassenbon_store::{parse_purchase_date, ReceiptStore};

/// Bucket key for receipts whose stored date does not parse.
const UNKNOWN_MONTH: &str = "unknown";

/// Aggregated view of the dataset. Pure data, printed by [`run_stats`].
#[derive(Debug, Default, PartialEq)]
pub(crate) struct StatsReport {
    pub receipt_count: usize,
    pub total_spent: f64,
    pub saved_regular: f64,
    pub saved_pfand: f64,
    pub saved_loyalty: f64,
    /// `YYYY-MM` → (spent, receipt count), chronological.
    pub by_month: Vec<(String, f64, usize)>,
    /// Store label → (spent, receipt count), highest spend first.
    pub by_store: Vec<(String, f64, usize)>,
}

/// Loads the dataset and prints the spending summary.
///
/// # Errors
///
/// Returns an error when the dataset file cannot be read.
pub(crate) fn run_stats(config: &AppConfig) -> anyhow::Result<()> {
    let store = ReceiptStore::load(&config.receipts_path)?;
    let report = compute(store.receipts());

    println!("receipts:       {}", report.receipt_count);
    println!("total spent:    {} EUR", format_amount(report.total_spent));
    println!("saved regular:  {} EUR", format_amount(report.saved_regular));
    println!("saved deposit:  {} EUR", format_amount(report.saved_pfand));
    println!("saved loyalty:  {} EUR", format_amount(report.saved_loyalty));

    if !report.by_month.is_empty() {
        println!("\nby month:");
        for (month, spent, count) in &report.by_month {
            println!("  {month}  {:>10} EUR  ({count} receipts)", format_amount(*spent));
        }
    }
    if !report.by_store.is_empty() {
        println!("\nby store:");
        for (store_name, spent, count) in &report.by_store {
            println!("  {:>10} EUR  ({count} receipts)  {store_name}", format_amount(*spent));
        }
    }
    Ok(())
}

/// Aggregates totals, savings, and per-month / per-store spend.
pub(crate) fn compute(receipts: &[Receipt]) -> StatsReport {
    let mut report = StatsReport {
        receipt_count: receipts.len(),
        ..StatsReport::default()
    };
    let mut months: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    let mut stores: BTreeMap<String, (f64, usize)> = BTreeMap::new();

    for receipt in receipts {
        let spent = receipt.total_price.unwrap_or(0.0);
        report.total_spent += spent;
        report.saved_regular += receipt.saved_amount.unwrap_or(0.0);
        report.saved_pfand += receipt.saved_pfand.unwrap_or(0.0);
        report.saved_loyalty += receipt.lidlplus_saved_amount.unwrap_or(0.0);

        let month = parse_purchase_date(&receipt.purchase_date)
            .map_or_else(|| UNKNOWN_MONTH.to_string(), |d| d.format("%Y-%m").to_string());
        let entry = months.entry(month).or_insert((0.0, 0));
        entry.0 += spent;
        entry.1 += 1;

        if !receipt.store.is_empty() {
            let entry = stores.entry(receipt.store.clone()).or_insert((0.0, 0));
            entry.0 += spent;
            entry.1 += 1;
        }
    }

    report.by_month = months
        .into_iter()
        .map(|(month, (spent, count))| (month, spent, count))
        .collect();
    report.by_store = stores
        .into_iter()
        .map(|(store_name, (spent, count))| (store_name, spent, count))
        .collect();
    report
        .by_store
        .sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    report
}
